//! Slack `mrkdwn` → HTML, the first of the two formatting stages.
//!
//! Handles the constructs CommonMark does not know: `<url|label>` links
//! (http, https and mailto only),
//! `<#C…>`/`<@U…>`/`<!…>` tags, single-character `*bold*`, `_italic_`
//! and `~strike~`. Code spans and fences are left for the markdown pass,
//! except that inline ```fences``` are moved onto their own lines so the
//! markdown pass sees a proper fenced block.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::markup::html_escape;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([^<>\s][^<>\n]*)>").unwrap());

/// Convert platform light markup into markdown-with-inline-HTML.
pub fn to_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    for segment in split_code(text) {
        match segment {
            Segment::Fence(code) => {
                out.push_str("\n```\n");
                out.push_str(code.trim_matches('\n'));
                out.push_str("\n```\n");
            }
            Segment::Inline(code) => out.push_str(code),
            Segment::Text(plain) => out.push_str(&convert_text(plain)),
        }
    }
    out
}

enum Segment<'a> {
    /// Contents between ``` markers.
    Fence(&'a str),
    /// A complete `code` span, backticks included.
    Inline(&'a str),
    Text(&'a str),
}

/// Split on code fences and inline code spans. Unterminated markers are
/// treated as ordinary text.
fn split_code(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find('`') {
        let after = &rest[start..];
        if let Some(body) = after.strip_prefix("```") {
            if let Some(end) = body.find("```") {
                if start > 0 {
                    segments.push(Segment::Text(&rest[..start]));
                }
                segments.push(Segment::Fence(&body[..end]));
                rest = &body[end + 3..];
                continue;
            }
        } else if let Some(end) = after[1..].find(['`', '\n']) {
            if after[1..].as_bytes()[end] == b'`' && end > 0 {
                if start > 0 {
                    segments.push(Segment::Text(&rest[..start]));
                }
                segments.push(Segment::Inline(&after[..end + 2]));
                rest = &after[end + 2..];
                continue;
            }
        }
        // Lone backtick: keep it with the text before it and move on.
        segments.push(Segment::Text(&rest[..start + 1]));
        rest = &rest[start + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    segments
}

fn convert_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in TAG_RE.captures_iter(text) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        out.push_str(&plain_run(&text[last..whole.start]));
        out.push_str(&convert_tag(&caps[1]));
        last = whole.end;
    }
    out.push_str(&plain_run(&text[last..]));
    out
}

/// Text between recognised tags. Any `<` left here is literal, never markup.
fn plain_run(text: &str) -> String {
    emphasize_all(&text.replace('<', "&lt;"))
}

fn is_linkable(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

fn convert_tag(inner: &str) -> String {
    let (target, label) = match inner.split_once('|') {
        Some((target, label)) => (target, Some(label)),
        None => (inner, None),
    };

    if let Some(id) = target.strip_prefix('#') {
        let shown = label.map_or_else(|| id.to_string(), |l| format!("#{l}"));
        return format!(r#"<span class="slack-channel">{}</span>"#, html_escape(&shown));
    }
    if let Some(id) = target.strip_prefix('@') {
        let shown = label.map_or_else(|| id.to_string(), |l| format!("@{l}"));
        return format!(r#"<span class="slack-user">{}</span>"#, html_escape(&shown));
    }
    if let Some(cmd) = target.strip_prefix('!') {
        let shown = label.unwrap_or(cmd);
        return format!(r#"<span class="slack-cmd">{}</span>"#, html_escape(shown));
    }
    if is_linkable(target) {
        let shown = label.unwrap_or(target);
        return format!(
            r#"<a href="{}">{}</a>"#,
            html_escape(target),
            html_escape(shown)
        );
    }
    if target.contains(':') {
        // Other schemes keep their text but lose the link.
        return html_escape(label.unwrap_or(target));
    }
    html_escape(&format!("<{inner}>"))
}

fn emphasize_all(text: &str) -> String {
    let bold = emphasize(text, '*', "strong");
    let italic = emphasize(&bold, '_', "em");
    emphasize(&italic, '~', "del")
}

/// Wrap `marker`-delimited runs in `tag`.
///
/// An opening marker must start the text or follow whitespace/opening
/// punctuation, and be followed by a non-space. The closing marker must
/// follow a non-space and must not be followed by an alphanumeric. Runs
/// never span lines.
fn emphasize(text: &str, marker: char, tag: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == marker && opens(&chars, i, marker) {
            if let Some(close) = find_close(&chars, i, marker) {
                let inner: String = chars[i + 1..close].iter().collect();
                out.push_str(&format!("<{tag}>{inner}</{tag}>"));
                i = close + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn opens(chars: &[char], i: usize, marker: char) -> bool {
    let before_ok = i == 0 || {
        let prev = chars[i - 1];
        prev.is_whitespace() || matches!(prev, '(' | '[' | '{' | '"' | '\'' | '>')
    };
    let after_ok = chars
        .get(i + 1)
        .is_some_and(|c| !c.is_whitespace() && *c != marker);
    before_ok && after_ok
}

fn find_close(chars: &[char], open: usize, marker: char) -> Option<usize> {
    let mut j = open + 1;
    while j < chars.len() {
        let c = chars[j];
        if c == '\n' {
            return None;
        }
        if c == marker && !chars[j - 1].is_whitespace() {
            let after_ok = chars.get(j + 1).map_or(true, |n| !n.is_alphanumeric());
            if after_ok {
                return Some(j);
            }
        }
        j += 1;
    }
    None
}
