//! The top-level `parse` entry point tying every stage together.

use std::sync::Arc;
use std::time::Duration;

use slackbridge_core::config::ParserConfig;
use slackbridge_core::types::{Attachment, ContentBlock, PreviousMessage, SourceMessage, Subtype};
use tracing::{debug, warn};

use crate::blocks;
use crate::content::{assemble, assemble_edit, MessageContent, MsgType, RenderedMessage};
use crate::diff::diff;
use crate::directory::{
    bounded, ChannelNames, EventStore, FileFetcher, IdentityDirectory, RoomDirectory,
};
use crate::error::ParseError;
use crate::files::resolve_file;
use crate::markup::transpile;
use crate::refs::ReferenceResolver;

/// Turns inbound messages into event content.
///
/// Holds no per-message state; one parser serves any number of concurrent
/// `parse` calls.
pub struct MessageParser {
    rooms: Arc<dyn RoomDirectory>,
    identities: Arc<dyn IdentityDirectory>,
    channels: Arc<dyn ChannelNames>,
    events: Arc<dyn EventStore>,
    max_inline_file_bytes: Option<u64>,
    lookup_deadline: Option<Duration>,
}

impl MessageParser {
    pub fn new(
        rooms: Arc<dyn RoomDirectory>,
        identities: Arc<dyn IdentityDirectory>,
        channels: Arc<dyn ChannelNames>,
        events: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            rooms,
            identities,
            channels,
            events,
            max_inline_file_bytes: None,
            lookup_deadline: None,
        }
    }

    /// Apply the inline size limit and lookup deadline from config.
    pub fn with_config(mut self, config: &ParserConfig) -> Self {
        self.max_inline_file_bytes = config.max_inline_file_bytes;
        self.lookup_deadline = config.lookup_timeout_ms.map(Duration::from_millis);
        self
    }

    /// Transform one message.
    ///
    /// `Ok(None)` means there is nothing to send: the subtype is not one we
    /// bridge, or the message renders to nothing. `file_client` must be able
    /// to read this message's files, or be `None` if no such client exists.
    pub async fn parse(
        &self,
        msg: &SourceMessage,
        file_client: Option<&dyn FileFetcher>,
    ) -> Result<Option<MessageContent>, ParseError> {
        let msgtype = match &msg.subtype {
            Subtype::Unrecognized(name) => {
                debug!(subtype = %name, ts = %msg.ts, "dropping unrecognized subtype");
                return Ok(None);
            }
            Subtype::Emote => MsgType::Emote,
            _ => MsgType::Text,
        };

        let mut fragments = Vec::new();
        for file in &msg.files {
            if let Some(fragment) = resolve_file(
                file,
                file_client,
                self.max_inline_file_bytes,
                self.lookup_deadline,
            )
            .await?
            {
                fragments.push(fragment);
            }
        }

        let team_domain = self.team_domain(msg).await;
        let source = source_text(&msg.blocks, &msg.attachments, msg.text.as_deref());
        let text_only = self
            .render_text(&source, team_domain.as_deref(), &msg.channel)
            .await;

        let mut rendered = text_only.clone();
        for fragment in fragments {
            rendered.append(fragment);
        }
        if rendered.body.trim().is_empty() {
            debug!(channel = %msg.channel, ts = %msg.ts, "message rendered empty, suppressing");
            return Ok(None);
        }
        rendered.external_url = team_domain
            .as_deref()
            .map(|domain| external_url(domain, &msg.channel, &msg.ts, msg.thread_ts.as_deref()));

        if msg.subtype == Subtype::Edit {
            if let Some(previous) = &msg.previous {
                let edit = self
                    .edit_content(
                        msg,
                        previous,
                        &text_only,
                        &rendered,
                        team_domain.as_deref(),
                        msgtype,
                    )
                    .await;
                if let Some(edit) = edit {
                    return Ok(Some(edit));
                }
            }
        }

        Ok(Some(assemble(rendered, msgtype)))
    }

    /// Reference resolution followed by transpilation.
    async fn render_text(
        &self,
        source: &str,
        team_domain: Option<&str>,
        channel_id: &str,
    ) -> RenderedMessage {
        let source = source.trim_end();
        if source.trim().is_empty() {
            return RenderedMessage::default();
        }

        let resolver = ReferenceResolver {
            rooms: self.rooms.as_ref(),
            channels: self.channels.as_ref(),
            identities: self.identities.as_ref(),
            deadline: self.lookup_deadline,
        };
        let text = resolver.resolve_channel_refs(source).await;
        let text = resolver.resolve_user_refs(&text, team_domain, channel_id).await;

        let out = transpile(&text);
        RenderedMessage::new(out.plain, out.formatted)
    }

    /// Build the edit notice, or `None` to fall back to a normal message.
    async fn edit_content(
        &self,
        msg: &SourceMessage,
        previous: &PreviousMessage,
        current_text: &RenderedMessage,
        current: &RenderedMessage,
        team_domain: Option<&str>,
        msgtype: MsgType,
    ) -> Option<MessageContent> {
        let source = source_text(
            &previous.blocks,
            &previous.attachments,
            previous.text.as_deref(),
        );
        if source.trim().is_empty() {
            return None;
        }

        let ts = previous.ts.as_deref().unwrap_or(&msg.ts);
        let lookup = self.events.event_by_origin(&msg.channel, ts);
        let event_id = match bounded(self.lookup_deadline, lookup).await {
            Ok(Some(event_id)) => event_id,
            Ok(None) => {
                warn!(channel = %msg.channel, ts = %ts, "previous event not found for edit, sending as new message");
                return None;
            }
            Err(e) => {
                warn!(channel = %msg.channel, ts = %ts, error = %e, "previous event lookup failed, sending as new message");
                return None;
            }
        };

        let previous_text = self.render_text(&source, team_domain, &msg.channel).await;
        let edit = diff(&previous_text.body, &current_text.body);
        debug!(event_id = %event_id, "rendering edit");
        Some(assemble_edit(&edit, current.clone(), &event_id, msgtype))
    }

    async fn team_domain(&self, msg: &SourceMessage) -> Option<String> {
        let team_id = msg.team_id.as_deref()?;
        match bounded(self.lookup_deadline, self.events.team_domain(team_id)).await {
            Ok(domain) => domain,
            Err(e) => {
                warn!(team = %team_id, error = %e, "team domain lookup failed");
                None
            }
        }
    }
}

/// Blocks and attachments rendered to intermediate markup, or the legacy
/// text field when they render to whitespace only.
fn source_text(blocks: &[ContentBlock], attachments: &[Attachment], text: Option<&str>) -> String {
    let rendered = blocks::render(blocks, attachments);
    if rendered.trim().is_empty() {
        text.unwrap_or_default().to_string()
    } else {
        rendered
    }
}

/// Deep link back to the original message.
pub fn external_url(team_domain: &str, channel: &str, ts: &str, thread_ts: Option<&str>) -> String {
    let mut url = format!(
        "https://{team_domain}.slack.com/archives/{channel}/p{}",
        ts.replace('.', "")
    );
    if let Some(thread_ts) = thread_ts {
        url.push_str("?thread_ts=");
        url.push_str(&thread_ts.replace('.', ""));
    }
    url
}
