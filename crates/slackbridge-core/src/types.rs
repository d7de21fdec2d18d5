//! Inbound message model.
//!
//! `SlackEvent` mirrors the wire shape of a `message` event; `SourceMessage`
//! is the normalised form the pipeline consumes. Edits arrive with the
//! current version nested under `message` and the old one under
//! `previous_message`; the conversion flattens both so downstream code never
//! has to care which shape it was handed.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Message subtype, as far as the bridge cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subtype {
    /// No subtype: an ordinary user message.
    Plain,
    /// `me_message`, rendered as an emote.
    Emote,
    /// `bot_message`
    Bot,
    /// `file_comment`
    FileComment,
    /// `message_changed`: an edit of an earlier message.
    Edit,
    /// Anything else. Dropped by the parser.
    Unrecognized(String),
}

impl From<Option<&str>> for Subtype {
    fn from(raw: Option<&str>) -> Self {
        match raw {
            None => Subtype::Plain,
            Some("me_message") => Subtype::Emote,
            Some("bot_message") => Subtype::Bot,
            Some("file_comment") => Subtype::FileComment,
            Some("message_changed") => Subtype::Edit,
            Some(other) => Subtype::Unrecognized(other.to_string()),
        }
    }
}

/// A `{ "type": "mrkdwn", "text": "..." }` composition object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub text: String,
}

/// Element of a context block. Images carry no text and render to nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextElement {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Typed unit of rich message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Header {
        #[serde(default)]
        text: Option<TextObject>,
    },
    Section {
        #[serde(default)]
        text: Option<TextObject>,
        #[serde(default)]
        fields: Vec<TextObject>,
    },
    Context {
        #[serde(default)]
        elements: Vec<ContextElement>,
    },
    Divider,
    #[serde(other)]
    Unknown,
}

/// Legacy secondary attachment. Always rendered block-quoted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Nested blocks take precedence over every other field.
    #[serde(default)]
    pub blocks: Option<Vec<ContentBlock>>,
    #[serde(default)]
    pub pretext: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub fallback: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_link: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
}

/// File metadata attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachedFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url_private: Option<String>,
    #[serde(default)]
    pub permalink_public: Option<String>,
    #[serde(default)]
    pub public_url_shared: bool,
    #[serde(default)]
    pub size: u64,
    /// Only `"snippet"` is eligible for inlining.
    #[serde(default)]
    pub mode: Option<String>,
    /// Syntax-highlight hint, e.g. `"python"`.
    #[serde(default)]
    pub filetype: Option<String>,
}

impl AttachedFile {
    /// Name shown to users; the file id when the name is unknown.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn is_snippet(&self) -> bool {
        self.mode.as_deref() == Some("snippet")
    }
}

/// Wire shape of a `message` event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackEvent {
    pub channel: String,
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default, alias = "team_id")]
    pub team: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub files: Vec<AttachedFile>,
    /// Current version of an edited message.
    #[serde(default)]
    pub message: Option<Box<SlackEventMessage>>,
    /// Version before the edit.
    #[serde(default)]
    pub previous_message: Option<Box<SlackEventMessage>>,
}

/// Nested message body carried by `message_changed` events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackEventMessage {
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default, alias = "team_id")]
    pub team: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub files: Vec<AttachedFile>,
}

/// Snapshot of the message as it was before an edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviousMessage {
    pub ts: Option<String>,
    pub text: Option<String>,
    pub blocks: Vec<ContentBlock>,
    pub attachments: Vec<Attachment>,
}

/// Normalised inbound message. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMessage {
    pub channel: String,
    /// Stable per-channel message identifier.
    pub ts: String,
    pub thread_ts: Option<String>,
    pub team_id: Option<String>,
    pub subtype: Subtype,
    /// Legacy plain-text field; used when blocks and attachments render empty.
    pub text: Option<String>,
    pub blocks: Vec<ContentBlock>,
    pub attachments: Vec<Attachment>,
    pub files: Vec<AttachedFile>,
    pub previous: Option<PreviousMessage>,
}

impl SourceMessage {
    /// Build a plain message with nothing but text. Handy for tests and replay.
    pub fn text(channel: &str, ts: &str, text: &str) -> Self {
        Self {
            channel: channel.to_string(),
            ts: ts.to_string(),
            thread_ts: None,
            team_id: None,
            subtype: Subtype::Plain,
            text: Some(text.to_string()),
            blocks: Vec::new(),
            attachments: Vec::new(),
            files: Vec::new(),
            previous: None,
        }
    }

    /// Parse raw event JSON straight into the normalised form.
    pub fn from_json(raw: &str) -> Result<Self> {
        let event: SlackEvent = serde_json::from_str(raw)?;
        Self::try_from(event)
    }
}

impl TryFrom<SlackEvent> for SourceMessage {
    type Error = BridgeError;

    fn try_from(event: SlackEvent) -> Result<Self> {
        let subtype = Subtype::from(event.subtype.as_deref());

        if subtype != Subtype::Edit {
            return Ok(Self {
                channel: event.channel,
                ts: event.ts,
                thread_ts: event.thread_ts,
                team_id: event.team,
                subtype,
                text: event.text,
                blocks: event.blocks,
                attachments: event.attachments,
                files: event.files,
                previous: None,
            });
        }

        let current = event.message.ok_or_else(|| {
            BridgeError::InvalidEvent(format!(
                "message_changed event {} lacks a `message` body",
                event.ts
            ))
        })?;
        let previous = event.previous_message.map(|prev| PreviousMessage {
            ts: prev.ts,
            text: prev.text,
            blocks: prev.blocks,
            attachments: prev.attachments,
        });

        Ok(Self {
            channel: event.channel,
            ts: current.ts.unwrap_or(event.ts),
            thread_ts: current.thread_ts.or(event.thread_ts),
            team_id: current.team.or(event.team),
            subtype,
            text: current.text,
            blocks: current.blocks,
            attachments: current.attachments,
            files: current.files,
            previous,
        })
    }
}
