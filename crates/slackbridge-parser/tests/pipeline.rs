// End-to-end runs of `MessageParser::parse` against a config-backed directory.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use slackbridge_core::{BridgeConfig, SourceMessage};
use slackbridge_parser::{
    FileFetcher, LookupResult, MessageParser, MsgType, ParseError, StaticDirectory,
};

const CONFIG: &str = r##"
[parser]
max_inline_file_bytes = 1024

[directory]
server_name = "example.org"

[[directory.rooms]]
channel_id = "C0GENERAL"
room_id = "!general:example.org"
canonical_alias = "#general:example.org"

[[directory.channels]]
id = "C0RANDOM"
name = "random"

[[directory.ghosts]]
slack_id = "U0ALICE"
team_domain = "acme"
display_name = "Alice"

[[directory.slack_users]]
id = "U0BOB"
name = "Bob"

[[directory.teams]]
id = "T0001"
domain = "acme"

[[directory.events]]
channel = "C0GENERAL"
ts = "1700000000.000100"
event_id = "$orig"
"##;

fn parser() -> MessageParser {
    let config = BridgeConfig::from_toml_str(CONFIG).unwrap();
    let dir = Arc::new(StaticDirectory::from_config(&config.directory));
    MessageParser::new(dir.clone(), dir.clone(), dir.clone(), dir).with_config(&config.parser)
}

fn message(event: serde_json::Value) -> SourceMessage {
    SourceMessage::from_json(&event.to_string()).unwrap()
}

struct Snippets;

#[async_trait]
impl FileFetcher for Snippets {
    async fn fetch_text(&self, _url: &str) -> LookupResult<String> {
        Ok("print('hi')".to_string())
    }
}

#[tokio::test]
async fn references_resolve_through_directory() {
    let msg = message(json!({
        "channel": "C0GENERAL",
        "ts": "1700000000.000100",
        "team": "T0001",
        "text": "<@U0ALICE> see <#C0GENERAL> and <#C0RANDOM>, cc <@U0BOB>"
    }));
    let content = parser().parse(&msg, None).await.unwrap().unwrap();

    assert_eq!(content.body, "Alice see #general:example.org and #random, cc Bob");
    let html = content.formatted_body.unwrap();
    assert!(
        html.contains(r#"<a href="https://matrix.to/#/@slack_acme_U0ALICE:example.org">Alice</a>"#),
        "{html}"
    );
    assert_eq!(
        content.external_url.as_deref(),
        Some("https://acme.slack.com/archives/C0GENERAL/p1700000000000100")
    );
}

#[tokio::test]
async fn broadcast_and_emoji_stay_plain() {
    let msg = message(json!({
        "channel": "C0GENERAL",
        "ts": "1.1",
        "text": "<!here> ship it :rocket:"
    }));
    let content = parser().parse(&msg, None).await.unwrap().unwrap();
    assert_eq!(content.body, "@room ship it 🚀");
    assert!(content.formatted_body.is_none());
    assert!(content.format.is_none());
}

#[tokio::test]
async fn blocks_and_attachments_render_structure() {
    let msg = message(json!({
        "channel": "C0GENERAL",
        "ts": "1.1",
        "text": "fallback text",
        "blocks": [{"type": "header", "text": {"type": "plain_text", "text": "Deploy"}}],
        "attachments": [{"text": "all green"}]
    }));
    let content = parser().parse(&msg, None).await.unwrap().unwrap();
    assert_eq!(content.body, "# Deploy\n\n> all green");
    let html = content.formatted_body.unwrap();
    assert!(html.contains("<h1>Deploy</h1>"), "{html}");
    assert!(html.contains("<blockquote>"), "{html}");
}

#[tokio::test]
async fn consecutive_attachments_stay_separate_quotes() {
    let msg = message(json!({
        "channel": "C0GENERAL",
        "ts": "1.1",
        "attachments": [
            {"text": "first"},
            {"pretext": "Second pretext", "text": "second"}
        ]
    }));
    let content = parser().parse(&msg, None).await.unwrap().unwrap();
    assert_eq!(content.body, "> first\n\nSecond pretext\n> second");
    let html = content.formatted_body.unwrap();
    assert_eq!(html.matches("<blockquote>").count(), 2, "{html}");
    assert!(
        html.contains("</blockquote><p>Second pretext</p><blockquote>"),
        "{html}"
    );
}

#[tokio::test]
async fn angle_text_across_lines_is_not_markup() {
    let msg = message(json!({
        "channel": "C0GENERAL",
        "ts": "1.1",
        "text": "&lt;img src=x\nonerror=alert(1)&gt; and <javascript:alert(1)|click>"
    }));
    let content = parser().parse(&msg, None).await.unwrap().unwrap();
    let html = content.formatted_body.unwrap_or_default();
    assert!(!html.contains("<img"), "{html}");
    assert!(!html.contains("javascript:"), "{html}");
}

#[tokio::test]
async fn unrecognized_and_empty_messages_are_suppressed() {
    let join = message(json!({
        "channel": "C0GENERAL",
        "ts": "1.1",
        "subtype": "channel_join",
        "text": "<@U0BOB> has joined the channel"
    }));
    assert!(parser().parse(&join, None).await.unwrap().is_none());

    let empty = message(json!({
        "channel": "C0GENERAL",
        "ts": "1.2",
        "blocks": [{"type": "rich_text", "elements": []}]
    }));
    assert!(parser().parse(&empty, None).await.unwrap().is_none());
}

#[tokio::test]
async fn emote_subtype_is_emote() {
    let msg = message(json!({
        "channel": "C0GENERAL",
        "ts": "1.1",
        "subtype": "me_message",
        "text": "waves"
    }));
    let content = parser().parse(&msg, None).await.unwrap().unwrap();
    assert_eq!(content.msgtype, MsgType::Emote);
    assert_eq!(content.body, "waves");
}

#[tokio::test]
async fn thread_reply_links_thread() {
    let msg = message(json!({
        "channel": "C0GENERAL",
        "ts": "1700000000.000300",
        "thread_ts": "1700000000.000100",
        "team": "T0001",
        "text": "reply"
    }));
    let content = parser().parse(&msg, None).await.unwrap().unwrap();
    assert_eq!(
        content.external_url.as_deref(),
        Some("https://acme.slack.com/archives/C0GENERAL/p1700000000000300?thread_ts=1700000000000100")
    );
}

#[tokio::test]
async fn edit_of_bridged_message_becomes_replacement() {
    let msg = message(json!({
        "channel": "C0GENERAL",
        "ts": "1700000500.000200",
        "subtype": "message_changed",
        "message": {"ts": "1700000000.000100", "team": "T0001", "text": "the quick brown fox"},
        "previous_message": {"ts": "1700000000.000100", "text": "the quick fox"}
    }));
    let content = parser().parse(&msg, None).await.unwrap().unwrap();

    assert_eq!(content.body, "(edited) the quick  fox => the quick brown fox");
    let value = serde_json::to_value(&content).unwrap();
    assert_eq!(value["format"], "org.matrix.custom.html");
    assert_eq!(
        value["m.relates_to"],
        json!({"rel_type": "m.replace", "event_id": "$orig"})
    );
    assert_eq!(
        value["m.new_content"],
        json!({
            "msgtype": "m.text",
            "body": "the quick brown fox",
            "external_url": "https://acme.slack.com/archives/C0GENERAL/p1700000000000100"
        })
    );
    assert_eq!(
        value["external_url"],
        "https://acme.slack.com/archives/C0GENERAL/p1700000000000100"
    );
}

#[tokio::test]
async fn edit_of_unknown_message_is_sent_plain() {
    let msg = message(json!({
        "channel": "C0RANDOM",
        "ts": "1700000500.000200",
        "subtype": "message_changed",
        "message": {"ts": "1700000000.000100", "text": "the quick brown fox"},
        "previous_message": {"ts": "1700000000.000100", "text": "the quick fox"}
    }));
    let content = parser().parse(&msg, None).await.unwrap().unwrap();
    assert!(!content.is_edit());
    assert!(content.new_content.is_none());
    assert_eq!(content.body, "the quick brown fox");
}

#[tokio::test]
async fn small_snippet_is_inlined() {
    let msg = message(json!({
        "channel": "C0GENERAL",
        "ts": "1.1",
        "files": [{
            "id": "F1",
            "name": "hello.py",
            "url_private": "https://files.slack.com/files-pri/T0001-F1/hello.py",
            "size": 20,
            "mode": "snippet",
            "filetype": "python"
        }]
    }));
    let content = parser().parse(&msg, Some(&Snippets)).await.unwrap().unwrap();
    assert_eq!(content.body, "```\nprint('hi')\n```");
    let html = content.formatted_body.unwrap();
    assert!(html.starts_with(r#"<pre><code class="language-python">"#), "{html}");
}

#[tokio::test]
async fn oversized_file_is_linked_after_text() {
    let msg = message(json!({
        "channel": "C0GENERAL",
        "ts": "1.1",
        "text": "log attached",
        "files": [{
            "id": "F2",
            "name": "big.log",
            "url_private": "https://files.slack.com/files-pri/T0001-F2/big.log",
            "size": 4096,
            "mode": "snippet"
        }]
    }));
    let content = parser().parse(&msg, Some(&Snippets)).await.unwrap().unwrap();
    assert_eq!(
        content.body,
        "log attached\n\nhttps://files.slack.com/files-pri/T0001-F2/big.log (big.log)"
    );
    let html = content.formatted_body.unwrap();
    assert!(html.starts_with("<p>log attached</p>"), "{html}");
    assert!(html.contains(">big.log</a>"), "{html}");
}

#[tokio::test]
async fn malformed_public_permalink_fails_parse() {
    let msg = message(json!({
        "channel": "C0GENERAL",
        "ts": "1.1",
        "text": "shared",
        "files": [{
            "id": "F3",
            "name": "notes.txt",
            "url_private": "https://files.slack.com/files-pri/T0001-F3/notes.txt",
            "permalink_public": "https://slack-files.com/garbage",
            "public_url_shared": true,
            "size": 10
        }]
    }));
    let err = parser().parse(&msg, None).await.unwrap_err();
    assert!(matches!(err, ParseError::MalformedPermalink { .. }));
}
