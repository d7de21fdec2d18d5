//! Attached-file resolution: inline small snippets, link everything else.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use slackbridge_core::types::AttachedFile;
use tracing::{debug, warn};

use crate::content::RenderedMessage;
use crate::directory::{bounded, FileFetcher};
use crate::error::ParseError;
use crate::markup::html_escape;

/// `https://slack-files.com/{team}-{file}-{secret}`
static PERMALINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://slack-files\.com/[^-/]+-[^-/]+-([^/?#]+)$").unwrap());

/// Resolve one attached file into a fragment of the rendered message.
///
/// `client` must already be one that can read the file; `None` means no
/// such client exists and the file degrades to a link. `Ok(None)` drops the
/// file without affecting the rest of the message.
pub async fn resolve_file(
    file: &AttachedFile,
    client: Option<&dyn FileFetcher>,
    max_inline_bytes: Option<u64>,
    deadline: Option<Duration>,
) -> Result<Option<RenderedMessage>, ParseError> {
    let Some(url_private) = file.url_private.as_deref() else {
        warn!(file_id = %file.id, "file has no private url, skipping");
        return Ok(None);
    };

    let oversized = max_inline_bytes.is_some_and(|limit| file.size > limit);
    let Some(client) = client.filter(|_| !oversized) else {
        debug!(
            file_id = %file.id,
            size = file.size,
            oversized,
            "linking file instead of inlining"
        );
        let url = if file.public_url_shared {
            direct_file_url(file)?.unwrap_or_else(|| url_private.to_string())
        } else {
            url_private.to_string()
        };
        return Ok(Some(link_fragment(&url, file.display_name())));
    };

    if !file.is_snippet() {
        debug!(file_id = %file.id, mode = ?file.mode, "file mode not inlined");
        return Ok(None);
    }

    let content = match bounded(deadline, client.fetch_text(url_private)).await {
        Ok(content) => content,
        Err(e) => {
            warn!(file_id = %file.id, error = %e, "snippet download failed");
            return Ok(None);
        }
    };
    if content.trim().is_empty() {
        debug!(file_id = %file.id, "snippet is empty");
        return Ok(None);
    }

    Ok(Some(snippet_fragment(&content, file.filetype.as_deref())))
}

/// Direct download link for a publicly shared file.
///
/// `Ok(None)` when the file has no public permalink or private url. A
/// permalink that does not carry the public secret is an error: the
/// platform sent something we do not understand.
pub fn direct_file_url(file: &AttachedFile) -> Result<Option<String>, ParseError> {
    let (Some(permalink), Some(url_private)) =
        (file.permalink_public.as_deref(), file.url_private.as_deref())
    else {
        return Ok(None);
    };

    let secret = PERMALINK_RE
        .captures(permalink)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ParseError::MalformedPermalink {
            file_id: file.id.clone(),
            permalink: permalink.to_string(),
        })?;

    Ok(Some(format!("{url_private}?pub_secret={}", secret.as_str())))
}

fn link_fragment(url: &str, name: &str) -> RenderedMessage {
    RenderedMessage::new(
        format!("{url} ({name})"),
        Some(format!(
            r#"<a href="{}">{}</a>"#,
            html_escape(url),
            html_escape(name)
        )),
    )
}

fn snippet_fragment(content: &str, filetype: Option<&str>) -> RenderedMessage {
    let open = match filetype.filter(|ft| !ft.is_empty()) {
        Some(ft) => format!(r#"<pre><code class="language-{}">"#, html_escape(ft)),
        None => "<pre><code>".to_string(),
    };
    RenderedMessage::new(
        format!("```\n{content}\n```"),
        Some(format!("{open}{}</code></pre>", html_escape(content))),
    )
}
