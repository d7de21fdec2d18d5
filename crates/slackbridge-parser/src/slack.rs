//! HTTP-backed collaborators talking to the Slack Web API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use slackbridge_core::config::SlackConfig;
use tracing::{debug, warn};

use crate::directory::{ChannelNames, FileFetcher, LookupResult};
use crate::error::LookupError;

/// Bot-token client for private file downloads and `conversations.info`.
pub struct SlackApiClient {
    client: reqwest::Client,
    api_base_url: String,
    token: String,
}

impl SlackApiClient {
    pub fn new(api_base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Build a client from config. `None` without a bot token.
    pub fn from_config(config: &SlackConfig) -> Option<Self> {
        let token = config.bot_token.as_deref().filter(|t| !t.is_empty())?;
        Some(Self::new(config.api_base_url.as_str(), token))
    }
}

#[derive(Debug, Deserialize)]
struct ConversationsInfo {
    ok: bool,
    #[serde(default)]
    channel: Option<ChannelInfo>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelInfo {
    #[serde(default)]
    name: Option<String>,
}

impl ConversationsInfo {
    fn into_name(self) -> LookupResult<Option<String>> {
        if !self.ok {
            return Err(LookupError::Api(
                self.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }
        Ok(self.channel.and_then(|c| c.name))
    }
}

#[async_trait]
impl FileFetcher for SlackApiClient {
    async fn fetch_text(&self, url: &str) -> LookupResult<String> {
        let resp = self.client.get(url).bearer_auth(&self.token).send().await?;

        if resp.status() != StatusCode::OK {
            let status = resp.status().as_u16();
            warn!(status, url, "file download rejected");
            return Err(LookupError::Status { status });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl ChannelNames for SlackApiClient {
    async fn channel_name(&self, channel_id: &str) -> LookupResult<Option<String>> {
        let url = format!("{}/conversations.info", self.api_base_url);
        debug!(channel = %channel_id, "looking up channel name");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("channel", channel_id)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(LookupError::Status {
                status: resp.status().as_u16(),
            });
        }

        let info: ConversationsInfo = resp.json().await?;
        info.into_name()
    }
}
