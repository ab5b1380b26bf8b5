//! Naming helpers: deployment affix stripping, search forms and humanized
//! display names.

use serde::{Deserialize, Serialize};

/// Characters treated as word separators in identifiers.
pub const SEPARATORS: [char; 3] = [' ', '-', '_'];

/// Strip separator characters (`space`, `-`, `_`).
pub fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| !SEPARATORS.contains(c)).collect()
}

/// Upper-case the first character of `word`, leaving the rest untouched.
pub fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn an identifier such as `BidSimulatorAgent`, `bid_simulator` or
/// `HTTPRouter` into a display name (`Bid Simulator Agent`, `Bid Simulator`,
/// `HTTP Router`).
///
/// Never fails: input without any word boundary comes back title-cased.
pub fn humanize(identifier: &str) -> String {
    let chars: Vec<char> = identifier.trim().chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for (i, &ch) in chars.iter().enumerate() {
        if SEPARATORS.contains(&ch) || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            // Start of an upper-case run, or the last capital of a run that
            // begins the next word (`HTTPRouter` -> `HTTP` + `Router`).
            if !prev.is_uppercase() || next_is_lower {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    if words.is_empty() {
        return title_case(identifier.trim());
    }
    words
        .iter()
        .map(|w| title_case(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Deployment naming rules: the prefix/suffix pair that environments attach to
/// raw deployment names (`agentcore-BidSimulator-dev`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalizer {
    pub prefix: String,
    pub suffix: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            prefix: crate::config::DEFAULT_DEPLOYMENT_PREFIX.to_string(),
            suffix: crate::config::DEFAULT_DEPLOYMENT_SUFFIX.to_string(),
        }
    }
}

impl Normalizer {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Repeatedly remove a leading `<prefix>-`/`<prefix>_` and a trailing
    /// `-<suffix>`/`_<suffix>` (ASCII case-insensitive) until neither is
    /// present. The remainder is never emptied by stripping.
    pub fn strip_affixes<'a>(&self, name: &'a str) -> &'a str {
        let mut out = name;
        loop {
            let next = self.strip_affixes_once(out);
            if next.len() == out.len() {
                return out;
            }
            out = next;
        }
    }

    fn strip_affixes_once<'a>(&self, name: &'a str) -> &'a str {
        let mut out = name;
        if !self.prefix.is_empty() {
            let plen = self.prefix.len();
            if out.len() > plen + 1
                && out.is_char_boundary(plen)
                && out[..plen].eq_ignore_ascii_case(&self.prefix)
                && matches!(out.as_bytes()[plen], b'-' | b'_')
            {
                out = &out[plen + 1..];
            }
        }
        if !self.suffix.is_empty() {
            let slen = self.suffix.len();
            if out.len() > slen + 1 {
                let cut = out.len() - slen;
                if out.is_char_boundary(cut)
                    && out[cut..].eq_ignore_ascii_case(&self.suffix)
                    && matches!(out.as_bytes()[cut - 1], b'-' | b'_')
                {
                    out = &out[..cut - 1];
                }
            }
        }
        out
    }

    /// Whitespace removed, affixes stripped, lower-cased. Separators other
    /// than whitespace are kept.
    pub fn fold(&self, identifier: &str) -> String {
        let compact: String = identifier.chars().filter(|c| !c.is_whitespace()).collect();
        self.strip_affixes(&compact).to_lowercase()
    }

    /// The comparison form used by every resolution tier.
    pub fn search_form(&self, identifier: &str) -> String {
        strip_separators(&self.fold(identifier))
    }

    /// Display name derived from a raw deployment name.
    pub fn display_from_name(&self, name: &str) -> String {
        humanize(self.strip_affixes(name.trim()))
    }
}
