//! Collaborator interfaces consumed by the pipeline.
//!
//! Every lookup is asynchronous and may fail or stall. The pipeline never
//! treats a failure here as fatal; each call site has a documented fallback.
//! Implementations own whatever caching they do.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::LookupError;

pub type LookupResult<T> = Result<T, LookupError>;

/// Locally known profile of a ghost user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub display_name: Option<String>,
}

/// Which source channels are bridged, and to which rooms.
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// Room id bridged to `channel_id`, if any.
    async fn bridged_room(&self, channel_id: &str) -> LookupResult<Option<String>>;

    /// Canonical alias state of `room_id`, if the room has one.
    async fn canonical_alias(&self, room_id: &str) -> LookupResult<Option<String>>;
}

/// Maps source-platform users onto federated identities.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Identity key for a short user id. Short ids are only unique within a
    /// team, hence the team-scoped key.
    async fn identity_key(&self, user_id: &str, team_domain: &str) -> LookupResult<String>;

    /// Locally known profile for an identity key.
    async fn profile(&self, identity_key: &str) -> LookupResult<Option<Profile>>;

    /// Display name of a user with no local profile.
    async fn display_name_for_unknown(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> LookupResult<Option<String>>;
}

/// Channel-name lookup against the source platform.
#[async_trait]
pub trait ChannelNames: Send + Sync {
    async fn channel_name(&self, channel_id: &str) -> LookupResult<Option<String>>;
}

/// Read-only view of previously bridged events and team metadata.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Federated event id of the message `(channel_id, ts)`, if it was bridged.
    async fn event_by_origin(&self, channel_id: &str, ts: &str) -> LookupResult<Option<String>>;

    async fn team_domain(&self, team_id: &str) -> LookupResult<Option<String>>;
}

/// A client that can read private files on the source platform.
///
/// Choosing *which* client can see a given file (bot vs. a member's own
/// token in private channels) happens outside the pipeline.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Download `url` as text. Non-200 responses are errors.
    async fn fetch_text(&self, url: &str) -> LookupResult<String>;
}

/// Run `fut` under an optional deadline. An elapsed deadline is reported
/// as [`LookupError::Timeout`] so callers take their usual fallback path.
pub(crate) async fn bounded<T, F>(deadline: Option<Duration>, fut: F) -> LookupResult<T>
where
    F: Future<Output = LookupResult<T>>,
{
    match deadline {
        None => fut.await,
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout {
                ms: limit.as_millis() as u64,
            }),
        },
    }
}
