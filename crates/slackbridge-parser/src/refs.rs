//! Channel and user reference resolution.
//!
//! Tokens are collected against the original text first and resolved one at
//! a time in document order; the output is then rebuilt in a single pass.
//! Substitutions of any length therefore never shift later matches.

use std::ops::Range;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::directory::{bounded, ChannelNames, IdentityDirectory, RoomDirectory};

static CHANNEL_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<#(\w+)(?:\|([^>]*))?>").unwrap());
static USER_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<@(\w+)(?:\|([^>]*))?>").unwrap());

/// Base of clickable user references on the federated side.
pub const MATRIX_TO: &str = "https://matrix.to/#/";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    span: Range<usize>,
    id: String,
    hint: Option<String>,
}

fn scan(re: &Regex, text: &str) -> Vec<Token> {
    re.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Token {
                span: whole.range(),
                id: caps.get(1)?.as_str().to_string(),
                hint: caps
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .filter(|h| !h.is_empty()),
            })
        })
        .collect()
}

/// Stitch unmatched text and replacements back together in original order.
fn rebuild(text: &str, replaced: Vec<(Range<usize>, String)>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (span, replacement) in replaced {
        out.push_str(&text[last..span.start]);
        out.push_str(&replacement);
        last = span.end;
    }
    out.push_str(&text[last..]);
    out
}

/// Resolves `<#C…>` and `<@U…>` tokens through the directories.
pub struct ReferenceResolver<'a> {
    pub rooms: &'a dyn RoomDirectory,
    pub channels: &'a dyn ChannelNames,
    pub identities: &'a dyn IdentityDirectory,
    pub deadline: Option<Duration>,
}

impl ReferenceResolver<'_> {
    /// Replace channel tokens with the bridged room's alias, or `#name`.
    pub async fn resolve_channel_refs(&self, text: &str) -> String {
        let tokens = scan(&CHANNEL_REF_RE, text);
        if tokens.is_empty() {
            return text.to_string();
        }

        let mut replaced = Vec::with_capacity(tokens.len());
        for token in tokens {
            let replacement = self.channel_display(&token).await;
            replaced.push((token.span, replacement));
        }
        rebuild(text, replaced)
    }

    async fn channel_display(&self, token: &Token) -> String {
        if let Some(alias) = self.bridged_alias(&token.id).await {
            return alias;
        }

        let name = match bounded(self.deadline, self.channels.channel_name(&token.id)).await {
            Ok(name) => name,
            Err(e) => {
                warn!(channel = %token.id, error = %e, "channel name lookup failed");
                None
            }
        };
        let shown = name
            .or_else(|| token.hint.clone())
            .unwrap_or_else(|| token.id.clone());
        debug!(channel = %token.id, shown = %shown, "resolved unbridged channel");
        format!("#{shown}")
    }

    async fn bridged_alias(&self, channel_id: &str) -> Option<String> {
        let room = match bounded(self.deadline, self.rooms.bridged_room(channel_id)).await {
            Ok(room) => room?,
            Err(e) => {
                warn!(channel = %channel_id, error = %e, "bridged room lookup failed");
                return None;
            }
        };
        match bounded(self.deadline, self.rooms.canonical_alias(&room)).await {
            Ok(alias) => alias,
            Err(e) => {
                warn!(room = %room, error = %e, "canonical alias lookup failed");
                None
            }
        }
    }

    /// Replace user tokens with a clickable ghost reference when the user
    /// is known locally, or a plain display name otherwise.
    ///
    /// Without a team domain no identity key can be derived and the text
    /// is returned unchanged.
    pub async fn resolve_user_refs(
        &self,
        text: &str,
        team_domain: Option<&str>,
        channel_id: &str,
    ) -> String {
        let tokens = scan(&USER_REF_RE, text);
        if tokens.is_empty() {
            return text.to_string();
        }
        let Some(team_domain) = team_domain else {
            debug!(channel = %channel_id, "no team domain, leaving user references as-is");
            return text.to_string();
        };

        let mut replaced = Vec::with_capacity(tokens.len());
        for token in tokens {
            let replacement = self.user_display(&token, team_domain, channel_id).await;
            replaced.push((token.span, replacement));
        }
        rebuild(text, replaced)
    }

    async fn user_display(&self, token: &Token, team_domain: &str, channel_id: &str) -> String {
        match bounded(self.deadline, self.identities.identity_key(&token.id, team_domain)).await {
            Ok(key) => match bounded(self.deadline, self.identities.profile(&key)).await {
                Ok(Some(profile)) => {
                    // Angle brackets would end the wrapper early.
                    let name = profile
                        .display_name
                        .map(|n| n.replace(['<', '>'], ""))
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| key.clone());
                    return format!("<{MATRIX_TO}{key}|{name}>");
                }
                Ok(None) => {}
                Err(e) => warn!(user = %token.id, error = %e, "profile lookup failed"),
            },
            Err(e) => warn!(user = %token.id, error = %e, "identity key lookup failed"),
        }

        warn!(user = %token.id, channel = %channel_id, "mentioned user has no local profile");
        let name = match bounded(
            self.deadline,
            self.identities.display_name_for_unknown(channel_id, &token.id),
        )
        .await
        {
            Ok(name) => name,
            Err(e) => {
                warn!(user = %token.id, error = %e, "display name lookup failed");
                None
            }
        };
        name.or_else(|| token.hint.clone())
            .unwrap_or_else(|| token.id.clone())
    }
}
