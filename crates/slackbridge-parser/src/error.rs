use thiserror::Error;

/// Hard failures that abort `parse`.
///
/// Everything else the pipeline runs into (failed lookups, missing URLs,
/// snippet downloads) is recovered locally and never surfaces here.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The platform handed us a public permalink we cannot take apart.
    #[error("malformed public permalink for file {file_id}: {permalink}")]
    MalformedPermalink { file_id: String, permalink: String },
}

/// Failure of a single collaborator call.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("API error: {0}")]
    Api(String),

    #[error("lookup timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}
