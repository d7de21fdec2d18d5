//! Markup transpiler: resolved source text → plain body + optional HTML body.
//!
//! The plain body is the source with entities unescaped, broadcast tokens
//! collapsed to `@room`, emoji shortcodes expanded and mention wrappers
//! reduced to their display text. The HTML body is built from the same text
//! *before* the wrapper reduction, so mentions stay clickable there.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Event, Options, Parser};
use regex::{Captures, Regex};

use crate::mrkdwn;

/// Room-wide mention marker on the federated side.
pub const ROOM_MENTION: &str = "@room";

static BROADCAST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!(?:channel|here|everyone)(?:\|[^>]*)?>").unwrap());
static SHORTCODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":([a-zA-Z0-9_+\-]+):").unwrap());
static MENTION_WRAPPER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<https://matrix\.to/#/@[^|>\s]+\|([^>]+)>").unwrap());

/// Output of [`transpile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transpiled {
    pub plain: String,
    /// `None` when the HTML would just be `<p>{plain}</p>`.
    pub formatted: Option<String>,
}

pub fn transpile(text: &str) -> Transpiled {
    let source = substitute_emoji(&replace_broadcasts(&unescape_entities(text)));
    let plain = strip_mention_wrappers(&source);

    let formatted = render_html(&source);
    let formatted = if formatted.is_empty() || formatted == format!("<p>{plain}</p>") {
        None
    } else {
        Some(formatted)
    };

    Transpiled { plain, formatted }
}

/// Undo the platform's escaping of `<`, `>` and `&`.
pub fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Every `<!channel>`, `<!here>` and `<!everyone>` becomes [`ROOM_MENTION`].
pub fn replace_broadcasts(text: &str) -> String {
    BROADCAST_RE.replace_all(text, ROOM_MENTION).into_owned()
}

/// Expand `:name:` shortcodes. Unknown names are left exactly as written.
pub fn substitute_emoji(text: &str) -> String {
    SHORTCODE_RE
        .replace_all(text, |caps: &Captures| match emojis::get_by_shortcode(&caps[1]) {
            Some(emoji) => emoji.as_str().to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// `<https://matrix.to/#/@user:server|Name>` → `Name`.
pub fn strip_mention_wrappers(text: &str) -> String {
    MENTION_WRAPPER_RE.replace_all(text, "$1").into_owned()
}

/// Light markup → HTML → markdown pass, with newlines collapsed.
pub fn render_html(source: &str) -> String {
    let intermediate = mrkdwn::to_html(source);
    let parser = Parser::new_ext(&intermediate, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        // Every newline in a message is meant literally.
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(intermediate.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out.trim().replace('\n', "")
}

/// Escape HTML metacharacters in text destined for a formatted body.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
