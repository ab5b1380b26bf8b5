//! Built-in fallbacks for agent decoration: color table, palette, icon and
//! description keyword tables.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::model::strip_separators;

pub const DEFAULT_ICON: &str = "bot";

/// Palette used when an agent has no style color and no table entry.
pub const PALETTE: [&str; 8] = [
    "#6366F1", "#0EA5E9", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#14B8A6",
];

/// Known agent types / service names -> color, keyed by separator-free
/// lower-case form.
static COLOR_TABLE: Lazy<HashMap<String, &'static str>> = Lazy::new(default_colors);

fn default_colors() -> HashMap<String, &'static str> {
    let mut m = HashMap::new();
    for (name, color) in [
        ("bid_simulator", "#2563EB"),
        ("bid_optimizer", "#1D4ED8"),
        ("creative", "#DB2777"),
        ("creative_agent", "#DB2777"),
        ("audience", "#059669"),
        ("audience_insights", "#047857"),
        ("campaign_planner", "#7C3AED"),
        ("campaign_optimizer", "#6D28D9"),
        ("budget", "#D97706"),
        ("budget_pacing", "#B45309"),
        ("forecast", "#0891B2"),
        ("measurement", "#4B5563"),
        ("reporting", "#4B5563"),
        ("inventory", "#9333EA"),
        ("brand_safety", "#DC2626"),
        ("orchestrator", "#111827"),
    ] {
        m.insert(strip_separators(name), color);
    }
    m
}

/// Table color for any of `names` (agent type first, then service name).
pub fn table_color<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'static str> {
    names
        .into_iter()
        .map(|n| strip_separators(&n.to_lowercase()))
        .find_map(|k| COLOR_TABLE.get(&k).copied())
}

/// Stable 32-bit string hash (`h * 31 + c`, wrapping). Identical across
/// processes and platforms.
pub fn stable_hash(s: &str) -> u32 {
    s.chars()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32))
        .unsigned_abs()
}

pub fn palette_color(identifier: &str) -> &'static str {
    PALETTE[stable_hash(identifier) as usize % PALETTE.len()]
}

/// Keyword -> icon, first match wins.
const ICON_KEYWORDS: &[(&str, &str)] = &[
    ("bid", "gavel"),
    ("creative", "palette"),
    ("audience", "users"),
    ("campaign", "megaphone"),
    ("budget", "wallet"),
    ("pacing", "gauge"),
    ("forecast", "trending-up"),
    ("report", "bar-chart"),
    ("measure", "bar-chart"),
    ("analytic", "bar-chart"),
    ("inventory", "boxes"),
    ("safety", "shield"),
    ("research", "search"),
    ("orchestrat", "network"),
    ("planner", "map"),
];

pub fn sniff_icon(haystacks: &[&str]) -> &'static str {
    let lowered: Vec<String> = haystacks.iter().map(|h| h.to_lowercase()).collect();
    ICON_KEYWORDS
        .iter()
        .find(|(kw, _)| lowered.iter().any(|h| h.contains(kw)))
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

/// Keyword -> description template; `{name}` is the display name.
const DESCRIPTION_TEMPLATES: &[(&str, &str)] = &[
    (
        "bid",
        "{name} simulates and optimizes bidding strategies across auctions.",
    ),
    (
        "creative",
        "{name} reviews and generates ad creative tailored to campaign goals.",
    ),
    (
        "audience",
        "{name} analyzes audience segments and recommends targeting.",
    ),
    (
        "campaign",
        "{name} plans and tunes campaigns against their objectives.",
    ),
    ("budget", "{name} tracks budget allocation and spend pacing."),
    ("forecast", "{name} forecasts delivery and performance outcomes."),
    ("report", "{name} summarizes performance data into reports."),
    ("inventory", "{name} evaluates available inventory and supply paths."),
    ("safety", "{name} checks placements for brand safety and suitability."),
    (
        "orchestrat",
        "{name} coordinates a team of specialist agents.",
    ),
];

pub fn sniff_description(display_name: &str) -> String {
    let lowered = display_name.to_lowercase();
    let template = DESCRIPTION_TEMPLATES
        .iter()
        .find(|(kw, _)| lowered.contains(kw))
        .map(|(_, t)| *t)
        .unwrap_or("{name} assists with specialized tasks.");
    template.replace("{name}", display_name)
}
