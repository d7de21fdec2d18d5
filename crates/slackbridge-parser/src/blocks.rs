//! Block/attachment rendering.
//!
//! Turns structured content into the line-oriented intermediate markup the
//! transpiler consumes: `# ` headings, `----` rules, `> ` quotes and
//! `**bold**` titles. Every non-empty block is followed by a blank line.

use slackbridge_core::types::{Attachment, ContentBlock};

const DIVIDER: &str = "----";
const QUOTE: &str = "> ";

/// Render blocks, then attachments, into one intermediate string.
pub fn render(blocks: &[ContentBlock], attachments: &[Attachment]) -> String {
    let mut out = render_blocks(blocks);
    for attachment in attachments {
        // A blank line ends the previous quote so each attachment keeps its own.
        if !out.is_empty() {
            out.truncate(out.trim_end_matches('\n').len());
            out.push_str("\n\n");
        }
        out.push_str(&render_attachment(attachment));
    }
    out
}

pub fn render_blocks(blocks: &[ContentBlock]) -> String {
    blocks.iter().map(render_block).collect()
}

fn render_block(block: &ContentBlock) -> String {
    let mut content = String::new();

    match block {
        ContentBlock::Header { text } => {
            if let Some(text) = text {
                content.push_str(&format!("# {}\n", text.text));
            }
        }
        ContentBlock::Section { text, fields } => {
            if let Some(text) = text {
                content.push_str(&text.text);
                content.push('\n');
                if !fields.is_empty() {
                    content.push('\n');
                }
            }
            for field in fields {
                content.push_str(&field.text);
                content.push('\n');
            }
        }
        ContentBlock::Context { elements } => {
            for text in elements.iter().filter_map(|e| e.text.as_deref()) {
                content.push_str(text);
                content.push('\n');
            }
        }
        ContentBlock::Divider => {
            content.push_str(DIVIDER);
            content.push('\n');
        }
        ContentBlock::Unknown => {}
    }

    if content.is_empty() {
        return content;
    }
    content.push('\n');
    content
}

/// Render one attachment as a quoted unit, prefixed by its pretext.
pub fn render_attachment(attachment: &Attachment) -> String {
    let mut content = String::new();

    if let Some(blocks) = &attachment.blocks {
        content.push_str(&render_blocks(blocks));
    } else if let Some(text) = attachment.text.as_deref().filter(|t| !t.is_empty()) {
        if let Some(title) = &attachment.title {
            match &attachment.title_link {
                Some(link) => content.push_str(&format!("**[{title}]({link})**\n")),
                None => content.push_str(&format!("**{title}**\n")),
            }
        }
        if let Some(author) = &attachment.author_name {
            content.push_str(&format!("**{author}**\n"));
        }
        content.push_str(text);
    } else if let Some(fallback) = &attachment.fallback {
        content.push_str(fallback);
    }

    let quoted = quote(&content);
    match &attachment.pretext {
        Some(pretext) => format!("{pretext}\n{quoted}"),
        None => quoted,
    }
}

/// Prefix every line with the quote marker.
fn quote(content: &str) -> String {
    format!("{QUOTE}{}", content.replace('\n', &format!("\n{QUOTE}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use slackbridge_core::types::{ContextElement, TextObject};

    fn txt(s: &str) -> TextObject {
        TextObject {
            kind: Some("mrkdwn".to_string()),
            text: s.to_string(),
        }
    }

    #[test]
    fn header_renders_heading_line() {
        let out = render(&[ContentBlock::Header { text: Some(txt("Release")) }], &[]);
        assert_eq!(out, "# Release\n\n");
    }

    #[test]
    fn section_separates_text_and_fields() {
        let block = ContentBlock::Section {
            text: Some(txt("Summary")),
            fields: vec![txt("*Owner*"), txt("*Status*")],
        };
        assert_eq!(render(&[block], &[]), "Summary\n\n*Owner*\n*Status*\n\n");
    }

    #[test]
    fn section_without_fields_has_no_inner_gap() {
        let block = ContentBlock::Section {
            text: Some(txt("Only text")),
            fields: Vec::new(),
        };
        assert_eq!(render(&[block], &[]), "Only text\n\n");
    }

    #[test]
    fn context_skips_textless_elements() {
        let block = ContentBlock::Context {
            elements: vec![
                ContextElement { kind: Some("image".to_string()), text: None },
                ContextElement { kind: Some("mrkdwn".to_string()), text: Some("by bob".to_string()) },
            ],
        };
        assert_eq!(render(&[block], &[]), "by bob\n\n");
    }

    #[test]
    fn empty_and_unknown_blocks_emit_nothing() {
        let blocks = [
            ContentBlock::Header { text: None },
            ContentBlock::Context { elements: Vec::new() },
            ContentBlock::Unknown,
        ];
        assert_eq!(render(&blocks, &[]), "");
    }

    #[test]
    fn divider_between_sections() {
        let blocks = [
            ContentBlock::Section { text: Some(txt("a")), fields: Vec::new() },
            ContentBlock::Divider,
            ContentBlock::Section { text: Some(txt("b")), fields: Vec::new() },
        ];
        assert_eq!(render(&blocks, &[]), "a\n\n----\n\nb\n\n");
    }

    #[test]
    fn attachment_quotes_every_line() {
        let attachment = Attachment {
            text: Some("line one\nline two\nline three".to_string()),
            ..Default::default()
        };
        let out = render_attachment(&attachment);
        for line in out.lines() {
            assert!(line.starts_with("> "), "unquoted line: {line:?}");
        }
        assert_eq!(out, "> line one\n> line two\n> line three");
    }

    #[test]
    fn attachment_title_link_author_and_pretext() {
        let attachment = Attachment {
            pretext: Some("New ticket".to_string()),
            title: Some("Bug 12".to_string()),
            title_link: Some("https://tracker/12".to_string()),
            author_name: Some("alice".to_string()),
            text: Some("It broke".to_string()),
            ..Default::default()
        };
        assert_eq!(
            render_attachment(&attachment),
            "New ticket\n> **[Bug 12](https://tracker/12)**\n> **alice**\n> It broke"
        );
    }

    #[test]
    fn attachment_without_text_uses_fallback() {
        let attachment = Attachment {
            title: Some("ignored".to_string()),
            fallback: Some("plain fallback".to_string()),
            ..Default::default()
        };
        assert_eq!(render_attachment(&attachment), "> plain fallback");
    }

    #[test]
    fn attachment_blocks_recurse() {
        let attachment = Attachment {
            blocks: Some(vec![ContentBlock::Header { text: Some(txt("Nested")) }]),
            text: Some("not used".to_string()),
            ..Default::default()
        };
        assert_eq!(render_attachment(&attachment), "> # Nested\n> \n> ");
    }

    #[test]
    fn attachments_follow_blocks_in_order() {
        let blocks = [ContentBlock::Section { text: Some(txt("body")), fields: Vec::new() }];
        let attachments = [
            Attachment { text: Some("first".to_string()), ..Default::default() },
            Attachment { text: Some("second".to_string()), ..Default::default() },
        ];
        assert_eq!(render(&blocks, &attachments), "body\n\n> first\n\n> second");
    }
}
