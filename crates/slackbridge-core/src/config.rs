use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api";
pub const DEFAULT_GHOST_PREFIX: &str = "slack_";
pub const DEFAULT_SERVER_NAME: &str = "localhost";

/// Top-level config (slackbridge.toml + SLACKBRIDGE_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

/// Knobs for the message transformation pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Files larger than this are linked instead of inlined.
    /// `None` means no size limit.
    pub max_inline_file_bytes: Option<u64>,
    /// Deadline applied to every directory/profile/file lookup.
    /// `None` disables the deadline.
    pub lookup_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot token used for `conversations.info` and private file downloads.
    pub bot_token: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base_url: default_api_base_url(),
        }
    }
}

/// Static directory tables used for offline replay.
///
/// A live deployment backs these lookups with its datastore; the replay
/// tool and the test-suite read them straight from config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Server name of the federated side, e.g. "example.org".
    #[serde(default = "default_server_name")]
    pub server_name: String,
    /// Localpart prefix for ghost users.
    #[serde(default = "default_ghost_prefix")]
    pub ghost_prefix: String,
    #[serde(default)]
    pub rooms: Vec<BridgedRoomEntry>,
    #[serde(default)]
    pub channels: Vec<ChannelNameEntry>,
    #[serde(default)]
    pub ghosts: Vec<GhostEntry>,
    #[serde(default)]
    pub slack_users: Vec<SlackUserEntry>,
    #[serde(default)]
    pub teams: Vec<TeamEntry>,
    #[serde(default)]
    pub events: Vec<EventEntry>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            ghost_prefix: default_ghost_prefix(),
            rooms: Vec::new(),
            channels: Vec::new(),
            ghosts: Vec::new(),
            slack_users: Vec::new(),
            teams: Vec::new(),
            events: Vec::new(),
        }
    }
}

/// A channel that is bridged to a room on the federated side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgedRoomEntry {
    pub channel_id: String,
    pub room_id: String,
    pub canonical_alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelNameEntry {
    pub id: String,
    pub name: String,
}

/// A ghost user whose profile is known locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostEntry {
    pub slack_id: String,
    pub team_domain: String,
    pub display_name: Option<String>,
}

/// Display name of a source-platform user with no local profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackUserEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamEntry {
    pub id: String,
    pub domain: Option<String>,
}

/// A previously bridged message: (channel, ts) → federated event id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEntry {
    pub channel: String,
    pub ts: String,
    pub event_id: String,
}

fn default_api_base_url() -> String {
    DEFAULT_SLACK_API_BASE_URL.to_string()
}
fn default_ghost_prefix() -> String {
    DEFAULT_GHOST_PREFIX.to_string()
}
fn default_server_name() -> String {
    DEFAULT_SERVER_NAME.to_string()
}

impl BridgeConfig {
    /// Load config from a TOML file with SLACKBRIDGE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. SLACKBRIDGE_CONFIG
    ///   3. ~/.slackbridge/slackbridge.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var("SLACKBRIDGE_CONFIG").ok())
            .unwrap_or_else(default_config_path);

        Self::from_figment(
            Figment::new()
                .merge(Toml::file(&path))
                .merge(Env::prefixed("SLACKBRIDGE_").split("__")),
        )
    }

    /// Parse config from an in-memory TOML document (no env overrides).
    pub fn from_toml_str(toml: &str) -> crate::error::Result<Self> {
        Self::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    fn from_figment(figment: Figment) -> crate::error::Result<Self> {
        figment
            .extract()
            .map_err(|e| crate::error::BridgeError::Config(e.to_string()))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.slackbridge/slackbridge.toml", home)
}
