//! Typeahead suggestions for the mention picker.

use crate::model::{Directory, EnrichedAgent};

const EXACT_DISPLAY: u32 = 100;
const EXACT_ALTERNATIVE: u32 = 90;
const PREFIX_DISPLAY: u32 = 80;
const PREFIX_ALTERNATIVE: u32 = 70;
const SUBSTRING_DISPLAY: u32 = 60;
const SUBSTRING_ALTERNATIVE: u32 = 50;
const SUBSTRING_AGENT_TYPE: u32 = 40;
const SUBSTRING_DESCRIPTION: u32 = 20;

/// Best score of `agent` for an already lower-cased, trimmed `needle`;
/// zero means no match.
pub fn score(agent: &EnrichedAgent, needle: &str) -> u32 {
    let display = agent.display_name.to_lowercase();
    let alternatives: Vec<String> = agent
        .alternative_names
        .iter()
        .map(|n| n.to_lowercase())
        .collect();
    let any_alt = |f: &dyn Fn(&str) -> bool| alternatives.iter().any(|a| f(a.as_str()));

    if display == needle {
        EXACT_DISPLAY
    } else if any_alt(&|a| a == needle) {
        EXACT_ALTERNATIVE
    } else if display.starts_with(needle) {
        PREFIX_DISPLAY
    } else if any_alt(&|a| a.starts_with(needle)) {
        PREFIX_ALTERNATIVE
    } else if display.contains(needle) {
        SUBSTRING_DISPLAY
    } else if any_alt(&|a| a.contains(needle)) {
        SUBSTRING_ALTERNATIVE
    } else if agent.agent_type.to_lowercase().contains(needle) {
        SUBSTRING_AGENT_TYPE
    } else if agent.description.to_lowercase().contains(needle) {
        SUBSTRING_DESCRIPTION
    } else {
        0
    }
}

/// Rank directory entries against `search`, best first, at most `limit`.
///
/// Ties keep directory order. A blank search returns the first `limit`
/// entries unscored.
pub fn suggest(directory: &Directory, search: &str, limit: usize) -> Vec<EnrichedAgent> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return directory.iter().take(limit).cloned().collect();
    }
    let mut scored: Vec<(u32, &EnrichedAgent)> = directory
        .iter()
        .map(|a| (score(a, &needle), a))
        .filter(|(s, _)| *s > 0)
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, a)| a.clone())
        .collect()
}
