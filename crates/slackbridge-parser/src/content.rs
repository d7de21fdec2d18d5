//! Event-content envelope assembly.

use serde::{Deserialize, Serialize};

use crate::diff::EditDiff;
use crate::markup::html_escape;

/// Format tag attached whenever a formatted body is present.
pub const HTML_FORMAT: &str = "org.matrix.custom.html";
/// Relation kind of an edit.
pub const REPLACE_RELATION: &str = "m.replace";

/// Output of the pipeline before it is wrapped into an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedMessage {
    pub body: String,
    pub formatted_body: Option<String>,
    pub external_url: Option<String>,
}

impl RenderedMessage {
    pub fn new(body: impl Into<String>, formatted_body: Option<String>) -> Self {
        Self {
            body: body.into(),
            formatted_body,
            external_url: None,
        }
    }

    pub fn with_external_url(mut self, url: Option<String>) -> Self {
        self.external_url = url;
        self
    }

    /// Append another fragment as a separate paragraph.
    ///
    /// If either side carries HTML, the result does too; a side without HTML
    /// contributes its escaped plain body as a paragraph.
    pub fn append(&mut self, other: RenderedMessage) {
        let formatted = match (&self.formatted_body, &other.formatted_body) {
            (None, None) => None,
            (mine, theirs) => {
                let mut html = String::new();
                if !self.body.is_empty() {
                    html.push_str(&mine.clone().unwrap_or_else(|| paragraph(&self.body)));
                }
                html.push_str(&theirs.clone().unwrap_or_else(|| paragraph(&other.body)));
                Some(html)
            }
        };

        if self.body.is_empty() {
            self.body = other.body;
        } else {
            self.body.push_str("\n\n");
            self.body.push_str(&other.body);
        }
        self.formatted_body = formatted;
    }
}

fn paragraph(plain: &str) -> String {
    format!("<p>{}</p>", html_escape(plain).replace('\n', "<br />"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgType {
    #[serde(rename = "m.text")]
    Text,
    #[serde(rename = "m.emote")]
    Emote,
    #[serde(rename = "m.notice")]
    Notice,
}

/// `m.relates_to` of an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub rel_type: String,
    pub event_id: String,
}

/// Final message event content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    pub msgtype: MsgType,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(rename = "m.new_content", default, skip_serializing_if = "Option::is_none")]
    pub new_content: Option<Box<MessageContent>>,
    #[serde(rename = "m.relates_to", default, skip_serializing_if = "Option::is_none")]
    pub relates_to: Option<Relation>,
}

impl MessageContent {
    pub fn is_edit(&self) -> bool {
        self.relates_to.is_some()
    }
}

/// Wrap a rendering into event content of the given type.
pub fn assemble(rendered: RenderedMessage, msgtype: MsgType) -> MessageContent {
    let formatted_body = rendered.formatted_body.filter(|f| !f.is_empty());
    MessageContent {
        msgtype,
        body: rendered.body,
        format: formatted_body.as_ref().map(|_| HTML_FORMAT.to_string()),
        formatted_body,
        external_url: rendered.external_url,
        new_content: None,
        relates_to: None,
    }
}

/// Build an edit notice: the diff narration on top, the full replacement in
/// `m.new_content`, and a replace relation to `replaces_event_id`.
pub fn assemble_edit(
    edit: &EditDiff,
    replacement: RenderedMessage,
    replaces_event_id: &str,
    msgtype: MsgType,
) -> MessageContent {
    let external_url = replacement.external_url.clone();
    let narration = RenderedMessage::new(edit.plain_body(), Some(edit.formatted_body()))
        .with_external_url(external_url);

    MessageContent {
        new_content: Some(Box::new(assemble(replacement, msgtype))),
        relates_to: Some(Relation {
            rel_type: REPLACE_RELATION.to_string(),
            event_id: replaces_event_id.to_string(),
        }),
        ..assemble(narration, msgtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use serde_json::json;

    #[test]
    fn plain_content_omits_optional_fields() {
        let content = assemble(RenderedMessage::new("hello", None), MsgType::Text);
        assert_eq!(
            serde_json::to_value(&content).unwrap(),
            json!({"msgtype": "m.text", "body": "hello"})
        );
    }

    #[test]
    fn formatted_content_carries_format_tag() {
        let rendered = RenderedMessage::new("*hi*", Some("<p><strong>hi</strong></p>".to_string()))
            .with_external_url(Some("https://acme.slack.com/archives/C1/p1".to_string()));
        let value = serde_json::to_value(assemble(rendered, MsgType::Emote)).unwrap();
        assert_eq!(value["msgtype"], "m.emote");
        assert_eq!(value["format"], HTML_FORMAT);
        assert_eq!(value["formatted_body"], "<p><strong>hi</strong></p>");
        assert_eq!(value["external_url"], "https://acme.slack.com/archives/C1/p1");
    }

    #[test]
    fn empty_formatted_body_is_dropped() {
        let content = assemble(RenderedMessage::new("x", Some(String::new())), MsgType::Notice);
        assert!(content.format.is_none());
        assert!(content.formatted_body.is_none());
    }

    #[test]
    fn edit_carries_new_content_and_relation() {
        let d = diff("the quick fox", "the quick brown fox");
        let content = assemble_edit(
            &d,
            RenderedMessage::new("the quick brown fox", None),
            "$original",
            MsgType::Text,
        );
        assert!(content.is_edit());
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["body"], "(edited) the quick  fox => the quick brown fox");
        assert_eq!(value["format"], HTML_FORMAT);
        assert_eq!(value["m.new_content"], json!({"msgtype": "m.text", "body": "the quick brown fox"}));
        assert_eq!(value["m.relates_to"], json!({"rel_type": "m.replace", "event_id": "$original"}));
    }

    #[test]
    fn append_mixes_plain_and_html_fragments() {
        let mut rendered = RenderedMessage::new("see file", None);
        rendered.append(RenderedMessage::new(
            "```\nx\n```",
            Some("<pre><code>x</code></pre>".to_string()),
        ));
        assert_eq!(rendered.body, "see file\n\n```\nx\n```");
        assert_eq!(
            rendered.formatted_body.as_deref(),
            Some("<p>see file</p><pre><code>x</code></pre>")
        );
    }

    #[test]
    fn append_to_empty_takes_fragment_verbatim() {
        let mut rendered = RenderedMessage::default();
        rendered.append(RenderedMessage::new("a.txt", Some("<a href=\"u\">a.txt</a>".to_string())));
        assert_eq!(rendered.body, "a.txt");
        assert_eq!(rendered.formatted_body.as_deref(), Some("<a href=\"u\">a.txt</a>"));
    }
}
