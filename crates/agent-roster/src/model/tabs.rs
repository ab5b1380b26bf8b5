//! UI-surface (tab) configuration referencing agents by key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One tab and the agents it offers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabConfigEntry {
    pub id: String,
    /// Key of the agent selected when the tab opens; empty means unset.
    #[serde(default)]
    pub default_agent: String,
    #[serde(default)]
    pub available_agents: Vec<String>,
    /// Unknown fields preserved across load/repair/save.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TabConfigEntry {
    pub fn new(id: impl Into<String>, default_agent: impl Into<String>, available: &[&str]) -> Self {
        Self {
            id: id.into(),
            default_agent: default_agent.into(),
            available_agents: available.iter().map(|s| s.to_string()).collect(),
            extra: BTreeMap::new(),
        }
    }

    /// True if `key` is the default or one of the available agents.
    pub fn references(&self, key: &str) -> bool {
        self.default_agent == key || self.available_agents.iter().any(|k| k == key)
    }
}

/// Ordered set of tab configurations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabConfigs {
    pub tabs: Vec<TabConfigEntry>,
}

impl TabConfigs {
    pub fn new(tabs: Vec<TabConfigEntry>) -> Self {
        Self { tabs }
    }

    pub fn get(&self, tab_id: &str) -> Option<&TabConfigEntry> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    fn get_mut(&mut self, tab_id: &str) -> Option<&mut TabConfigEntry> {
        self.tabs.iter_mut().find(|t| t.id == tab_id)
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Add `key` to a tab's available agents. Fails without mutating when
    /// the tab is unknown or already lists the key.
    #[must_use]
    pub fn add_agent(&mut self, tab_id: &str, key: &str) -> bool {
        let Some(tab) = self.get_mut(tab_id) else {
            return false;
        };
        if key.is_empty() || tab.available_agents.iter().any(|k| k == key) {
            return false;
        }
        tab.available_agents.push(key.to_string());
        true
    }

    /// Remove `key` from a tab's available agents. Fails without mutating
    /// when the tab is unknown or does not list the key. If the key was the
    /// default, the first remaining agent (or nothing) becomes the default.
    #[must_use]
    pub fn remove_agent(&mut self, tab_id: &str, key: &str) -> bool {
        let Some(tab) = self.get_mut(tab_id) else {
            return false;
        };
        let before = tab.available_agents.len();
        tab.available_agents.retain(|k| k != key);
        if tab.available_agents.len() == before {
            return false;
        }
        if tab.default_agent == key {
            tab.default_agent = tab.available_agents.first().cloned().unwrap_or_default();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TabConfigs {
        TabConfigs::new(vec![TabConfigEntry::new("plan", "Planner", &["Planner", "Bid"])])
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let json = r#"[{"id":"plan","defaultAgent":"Planner","availableAgents":["Planner"],"title":"Planning","order":2}]"#;
        let tabs: TabConfigs = serde_json::from_str(json).expect("parse ok");
        assert_eq!(tabs.tabs[0].extra.get("title"), Some(&serde_json::json!("Planning")));
        let back = serde_json::to_value(&tabs).expect("serialize");
        assert_eq!(back[0]["order"], serde_json::json!(2));
        assert_eq!(back[0]["defaultAgent"], serde_json::json!("Planner"));
    }

    #[test]
    fn add_agent_conflicts_leave_config_unchanged() {
        let mut tabs = sample();
        let before = tabs.clone();
        assert!(!tabs.add_agent("plan", "Bid"));
        assert!(!tabs.add_agent("missing", "Creative"));
        assert_eq!(tabs, before);
        assert!(tabs.add_agent("plan", "Creative"));
        assert_eq!(tabs.get("plan").map(|t| t.available_agents.len()), Some(3));
    }

    #[test]
    fn remove_agent_reassigns_default() {
        let mut tabs = sample();
        let before = tabs.clone();
        assert!(!tabs.remove_agent("plan", "Creative"));
        assert_eq!(tabs, before);
        assert!(tabs.remove_agent("plan", "Planner"));
        let tab = tabs.get("plan").expect("tab");
        assert_eq!(tab.default_agent, "Bid");
        assert_eq!(tab.available_agents, vec!["Bid"]);
    }
}
