//! Inline `@[Agent Name]` mentions in free text.
//!
//! ```text
//! @[Bid Simulator Agent] please help   -> primary target: BidSimulator
//! @[Nobody] @[Creative Studio] go      -> primary target: CreativeAgent
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::{DEFAULT_EXCLUDED_AGENT, RosterSettings};
use crate::model::{Directory, EnrichedAgent};
use crate::resolve::resolve_strict;

/// `@[` + one or more non-`]` characters + `]`. No escaping.
static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\[([^\]]+)\]").expect("mention regex is valid"));

/// One grammatical token found in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    /// Token including its `@[`/`]` delimiters.
    pub raw_token: String,
    pub identifier: String,
    /// Byte offset of `@`.
    pub start_index: usize,
    /// Byte offset one past the closing `]`.
    pub end_index: usize,
    /// `None` for unresolved identifiers and the sentinel.
    pub resolved_agent: Option<EnrichedAgent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMessage {
    pub cleaned_text: String,
    pub mentions: Vec<Mention>,
    pub primary_target: Option<EnrichedAgent>,
}

/// Mention parser bound to one sentinel identifier that never resolves.
#[derive(Debug, Clone)]
pub struct MentionParser {
    sentinel: String,
}

impl Default for MentionParser {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_AGENT)
    }
}

impl MentionParser {
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }

    pub fn from_settings(settings: &RosterSettings) -> Self {
        Self::new(settings.mention_sentinel.clone())
    }

    fn is_sentinel(&self, directory: &Directory, identifier: &str) -> bool {
        let normalizer = directory.normalizer();
        let form = normalizer.search_form(identifier);
        !form.is_empty() && form == normalizer.search_form(&self.sentinel)
    }

    /// Extract mentions, resolve each strictly and strip them from the text.
    pub fn parse(&self, directory: &Directory, text: &str) -> ParsedMessage {
        let mut mentions = Vec::new();
        let mut primary_target: Option<EnrichedAgent> = None;

        for caps in MENTION_RE.captures_iter(text) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let identifier = inner.as_str();
            let resolved_agent = if self.is_sentinel(directory, identifier) {
                tracing::debug!("mention '{}' is the sentinel; skipped", identifier);
                None
            } else {
                let hit = resolve_strict(directory, identifier);
                if hit.is_none() {
                    tracing::info!("mention '{}' did not resolve to any agent", identifier);
                }
                hit
            };
            if primary_target.is_none() {
                primary_target = resolved_agent.clone();
            }
            mentions.push(Mention {
                raw_token: whole.as_str().to_string(),
                identifier: identifier.to_string(),
                start_index: whole.start(),
                end_index: whole.end(),
                resolved_agent,
            });
        }

        let spans: Vec<(usize, usize)> = mentions.iter().map(|m| (m.start_index, m.end_index)).collect();
        ParsedMessage {
            cleaned_text: remove_spans(text, &spans),
            mentions,
            primary_target,
        }
    }
}

/// Parse with the default sentinel.
pub fn parse_mentions(directory: &Directory, text: &str) -> ParsedMessage {
    MentionParser::default().parse(directory, text)
}

/// Cut ordered, non-overlapping byte spans out of `text`. Whitespace around
/// each cut, including runs of adjacent cuts, collapses to a single space;
/// the result is trimmed.
fn remove_spans(text: &str, spans: &[(usize, usize)]) -> String {
    let mut pieces = Vec::with_capacity(spans.len() + 1);
    let mut cursor = 0;
    for &(start, end) in spans {
        pieces.push(&text[cursor..start]);
        cursor = end;
    }
    pieces.push(&text[cursor..]);

    let mut out = String::with_capacity(text.len());
    // Whitespace seen since the last kept character.
    let mut gap = false;
    for piece in pieces {
        let body = piece.trim();
        if body.is_empty() {
            gap |= !piece.is_empty();
            continue;
        }
        if !out.is_empty() && (gap || piece.starts_with(char::is_whitespace)) {
            out.push(' ');
        }
        out.push_str(body);
        gap = piece.ends_with(char::is_whitespace);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::agent::test_support::{agent, directory};

    fn sample() -> Directory {
        directory(vec![
            agent("BidSimulator", "Bid Simulator Agent"),
            agent("CreativeAgent", "Creative Studio"),
            agent("RoutingAgent", "Routing Agent"),
        ])
    }

    #[test]
    fn single_mention_is_stripped_and_targeted() {
        let parsed = parse_mentions(&sample(), "@[Bid Simulator Agent] please help");
        assert_eq!(parsed.cleaned_text, "please help");
        assert_eq!(
            parsed.primary_target.map(|a| a.key).as_deref(),
            Some("BidSimulator")
        );
        let m = &parsed.mentions[0];
        assert_eq!(m.raw_token, "@[Bid Simulator Agent]");
        assert_eq!(m.identifier, "Bid Simulator Agent");
        assert_eq!((m.start_index, m.end_index), (0, 22));
    }

    #[test]
    fn first_resolved_mention_wins() {
        let parsed = parse_mentions(&sample(), "@[Nobody] @[Creative Studio] draft copy");
        assert_eq!(parsed.mentions.len(), 2);
        assert_eq!(parsed.mentions[0].resolved_agent, None);
        assert_eq!(
            parsed.primary_target.as_ref().map(|a| a.key.as_str()),
            Some("CreativeAgent")
        );
        assert_eq!(parsed.primary_target, parsed.mentions[1].resolved_agent);
        assert_eq!(parsed.cleaned_text, "draft copy");

        let parsed = parse_mentions(&sample(), "@[Creative Studio] and @[BidSimulator]");
        assert_eq!(
            parsed.primary_target.map(|a| a.key).as_deref(),
            Some("CreativeAgent")
        );
        assert_eq!(parsed.cleaned_text, "and");
    }

    #[test]
    fn sentinel_never_resolves() {
        let parsed = parse_mentions(&sample(), "@[RoutingAgent] hi");
        assert_eq!(parsed.mentions.len(), 1);
        assert_eq!(parsed.mentions[0].resolved_agent, None);
        assert_eq!(parsed.primary_target, None);

        let custom = MentionParser::new("Creative Agent");
        let parsed = custom.parse(&sample(), "@[creative-agent] @[RoutingAgent]");
        assert_eq!(parsed.mentions[0].resolved_agent, None);
        assert_eq!(
            parsed.primary_target.map(|a| a.key).as_deref(),
            Some("RoutingAgent")
        );
    }

    #[test]
    fn junction_whitespace_collapses() {
        let parsed = parse_mentions(&sample(), "  ask @[Creative Studio]   and\t@[Nobody] now  ");
        assert_eq!(parsed.cleaned_text, "ask and now");
        let parsed = parse_mentions(&sample(), "x@[Nobody]y  z");
        assert_eq!(parsed.cleaned_text, "xy  z");
    }

    #[test]
    fn adjacent_mentions_keep_words_apart() {
        for text in [
            "hello @[Nobody] @[Ghost]world",
            "hello @[Nobody]@[Ghost]world",
            "hello@[Nobody] @[Ghost] world",
        ] {
            assert_eq!(parse_mentions(&sample(), text).cleaned_text, "hello world", "{text}");
        }
        let parsed = parse_mentions(&sample(), "@[Nobody]@[Ghost]");
        assert_eq!(parsed.cleaned_text, "");
        assert_eq!(parsed.mentions.len(), 2);
    }

    #[test]
    fn offsets_are_bytes_and_grammar_is_strict() {
        let parsed = parse_mentions(&sample(), "héllo @[BidSimulator]!");
        assert_eq!(parsed.mentions[0].start_index, 7);
        assert_eq!(parsed.cleaned_text, "héllo !");

        for text in ["@[] hi", "@[BidSimulator hi", "@ [BidSimulator]", "plain text"] {
            let parsed = parse_mentions(&sample(), text);
            assert!(parsed.mentions.is_empty(), "{text}");
            assert_eq!(parsed.cleaned_text, text.trim());
        }
    }
}
