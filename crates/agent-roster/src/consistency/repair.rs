use super::RepairOutcome;
use crate::model::{Directory, TabConfigs};

/// Rewrite `tabs` so every reference points into `directory`.
///
/// Per tab, in order:
/// 1. a default missing from the directory becomes the directory's first key
///    (or empty when the directory is empty);
/// 2. unknown keys are dropped from the available agents;
/// 3. a non-empty default not among the available agents is appended.
///
/// Unknown tab fields are carried over untouched. The input is not modified.
pub fn repair(directory: &Directory, tabs: &TabConfigs) -> RepairOutcome {
    let fallback = directory.first().map(|a| a.key.clone()).unwrap_or_default();
    let mut repaired = tabs.clone();
    let mut changes = Vec::new();

    for tab in &mut repaired.tabs {
        if !tab.default_agent.is_empty() && !directory.contains_key(&tab.default_agent) {
            changes.push(if fallback.is_empty() {
                format!(
                    "tab '{}': cleared unknown default agent '{}'",
                    tab.id, tab.default_agent
                )
            } else {
                format!(
                    "tab '{}': default agent '{}' replaced with '{}'",
                    tab.id, tab.default_agent, fallback
                )
            });
            tab.default_agent = fallback.clone();
        }

        let before = tab.available_agents.len();
        let mut dropped = Vec::new();
        tab.available_agents.retain(|k| {
            let keep = directory.contains_key(k);
            if !keep {
                dropped.push(k.clone());
            }
            keep
        });
        if tab.available_agents.len() != before {
            changes.push(format!(
                "tab '{}': removed unknown agent(s) {}",
                tab.id,
                dropped.join(", ")
            ));
        }

        if !tab.default_agent.is_empty() && !tab.available_agents.contains(&tab.default_agent) {
            changes.push(format!(
                "tab '{}': added default agent '{}' to available agents",
                tab.id, tab.default_agent
            ));
            tab.available_agents.push(tab.default_agent.clone());
        }
    }

    for change in &changes {
        tracing::info!("repair: {}", change);
    }
    RepairOutcome { repaired, changes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::validate;
    use crate::model::TabConfigEntry;
    use crate::model::agent::test_support::{agent, directory};

    fn dir() -> Directory {
        directory(vec![agent("Planner", "Planner"), agent("Bid", "Bid")])
    }

    #[test]
    fn valid_config_is_untouched() {
        let tabs = TabConfigs::new(vec![TabConfigEntry::new("plan", "Bid", &["Planner", "Bid"])]);
        let out = repair(&dir(), &tabs);
        assert!(out.is_noop());
        assert_eq!(out.repaired, tabs);
    }

    #[test]
    fn dangling_references_are_replaced_and_filtered() {
        let mut tab = TabConfigEntry::new("plan", "Ghost", &["Ghost", "Bid", "Phantom"]);
        tab.extra.insert("title".into(), serde_json::json!("Planning"));
        let tabs = TabConfigs::new(vec![tab]);
        let out = repair(&dir(), &tabs);
        let tab = out.repaired.get("plan").expect("tab");
        assert_eq!(tab.default_agent, "Planner");
        assert_eq!(tab.available_agents, vec!["Bid", "Planner"]);
        assert_eq!(tab.extra.get("title"), Some(&serde_json::json!("Planning")));
        assert_eq!(
            out.changes,
            vec![
                "tab 'plan': default agent 'Ghost' replaced with 'Planner'",
                "tab 'plan': removed unknown agent(s) Ghost, Phantom",
                "tab 'plan': added default agent 'Planner' to available agents",
            ]
        );
        assert!(validate(&dir(), &out.repaired).errors.is_empty());
        // Input left as-is.
        assert_eq!(tabs.tabs[0].default_agent, "Ghost");
    }

    #[test]
    fn empty_directory_clears_everything() {
        let tabs = TabConfigs::new(vec![TabConfigEntry::new("plan", "Planner", &["Planner"])]);
        let empty = directory(vec![]);
        let out = repair(&empty, &tabs);
        let tab = out.repaired.get("plan").expect("tab");
        assert_eq!(tab.default_agent, "");
        assert!(tab.available_agents.is_empty());
        assert!(validate(&empty, &out.repaired).errors.is_empty());
    }

    #[test]
    fn removed_agent_is_purged_from_every_tab() {
        let tabs = TabConfigs::new(vec![
            TabConfigEntry::new("plan", "Bid", &["Planner", "Bid"]),
            TabConfigEntry::new("bid", "Planner", &["Bid", "Planner"]),
        ]);
        let mut d = dir();
        assert!(d.remove("Bid"));
        let out = repair(&d, &tabs);
        for tab in &out.repaired.tabs {
            assert!(!tab.references("Bid"), "tab {}", tab.id);
        }
        assert_eq!(out.repaired.get("plan").map(|t| t.default_agent.as_str()), Some("Planner"));
        assert!(validate(&d, &out.repaired).is_valid());
    }
}
