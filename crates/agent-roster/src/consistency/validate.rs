use std::collections::HashSet;

use super::ValidationReport;
use crate::model::{Directory, TabConfigs};

/// Check every tab reference against `directory`.
///
/// Errors: one per (tab, key) pair whose key is missing from the directory,
/// whether it appears as the default, among the available agents, or both.
/// Warnings: no default set, default not among the tab's available agents,
/// empty available list, and directory agents no tab references.
pub fn validate(directory: &Directory, tabs: &TabConfigs) -> ValidationReport {
    let mut report = ValidationReport::default();

    for tab in &tabs.tabs {
        let mut reported: HashSet<&str> = HashSet::new();
        let referenced = std::iter::once(tab.default_agent.as_str())
            .filter(|k| !k.is_empty())
            .chain(tab.available_agents.iter().map(String::as_str));
        for key in referenced {
            if !directory.contains_key(key) && reported.insert(key) {
                report.errors.push(format!(
                    "tab '{}' references unknown agent '{}'",
                    tab.id, key
                ));
            }
        }

        if tab.default_agent.is_empty() {
            report
                .warnings
                .push(format!("tab '{}' has no default agent", tab.id));
        } else if !tab.available_agents.contains(&tab.default_agent) {
            report.warnings.push(format!(
                "tab '{}' default agent '{}' is not among its available agents",
                tab.id, tab.default_agent
            ));
        }
        if tab.available_agents.is_empty() {
            report
                .warnings
                .push(format!("tab '{}' has no available agents", tab.id));
        }
    }

    for agent in directory {
        if !tabs.tabs.iter().any(|t| t.references(&agent.key)) {
            report
                .warnings
                .push(format!("agent '{}' is not referenced by any tab", agent.key));
        }
    }

    if !report.is_valid() {
        tracing::warn!(
            "tab config has {} error(s), {} warning(s)",
            report.errors.len(),
            report.warnings.len()
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TabConfigEntry;
    use crate::model::agent::test_support::{agent, directory};

    fn dir() -> Directory {
        directory(vec![agent("Planner", "Planner"), agent("Bid", "Bid")])
    }

    #[test]
    fn clean_config_has_no_findings() {
        let tabs = TabConfigs::new(vec![TabConfigEntry::new("plan", "Planner", &["Planner", "Bid"])]);
        let report = validate(&dir(), &tabs);
        assert_eq!(report, ValidationReport::default());
    }

    #[test]
    fn missing_key_is_one_error_per_tab() {
        let tabs = TabConfigs::new(vec![
            TabConfigEntry::new("plan", "Ghost", &["Planner", "Ghost", "Bid"]),
            TabConfigEntry::new("bid", "Bid", &["Bid", "Ghost"]),
        ]);
        let report = validate(&dir(), &tabs);
        assert_eq!(
            report.errors,
            vec![
                "tab 'plan' references unknown agent 'Ghost'",
                "tab 'bid' references unknown agent 'Ghost'",
            ]
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn warnings_cover_soft_problems() {
        let tabs = TabConfigs::new(vec![
            TabConfigEntry::new("plan", "Planner", &[]),
            TabConfigEntry::new("misc", "", &["Planner"]),
        ]);
        let report = validate(&dir(), &tabs);
        assert!(report.is_valid());
        assert_eq!(
            report.warnings,
            vec![
                "tab 'plan' default agent 'Planner' is not among its available agents",
                "tab 'plan' has no available agents",
                "tab 'misc' has no default agent",
                "agent 'Bid' is not referenced by any tab",
            ]
        );
    }

    #[test]
    fn dropping_an_agent_surfaces_a_new_error() {
        let tabs = TabConfigs::new(vec![TabConfigEntry::new("plan", "Planner", &["Planner", "Bid"])]);
        let mut d = dir();
        assert!(validate(&d, &tabs).is_valid());
        assert!(d.remove("Bid"));
        let report = validate(&d, &tabs);
        assert_eq!(report.errors, vec!["tab 'plan' references unknown agent 'Bid'"]);
    }
}
