//! Enriched agents and the directory that holds them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::naming::Normalizer;
use super::types::{DeploymentKind, RuntimeRef};

/// Where a directory entry came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentOrigin {
    #[default]
    Deployed,
    /// Injected from topology as a team lead.
    Orchestrator,
    /// Injected from topology as a team member.
    Collaborator,
}

/// One entry of the directory: a deployment record merged with style and
/// topology metadata plus computed defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedAgent {
    /// Canonical lookup key; equal to `agent_type`.
    pub key: String,
    pub name: String,
    pub agent_type: String,
    pub status: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_or_session_ref: Option<String>,
    pub deployment_kind: DeploymentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeRef>,
    pub display_name: String,
    pub color: String,
    pub icon: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestrator_agent: Option<String>,
    #[serde(default)]
    pub origin: AgentOrigin,
}

impl EnrichedAgent {
    /// Search forms of the identity fields (`name`, alias, `key`), in that
    /// order. Derived on demand, never stored.
    pub fn identity_forms(&self, normalizer: &Normalizer) -> Vec<String> {
        let mut out = vec![normalizer.search_form(&self.name)];
        if let Some(alias) = self.alias_or_session_ref.as_deref() {
            out.push(normalizer.search_form(alias));
        }
        out.push(normalizer.search_form(&self.key));
        out.retain(|f| !f.is_empty());
        out
    }

    /// True if `search` (already a search form) names this agent by key,
    /// agent type or name.
    pub fn matches_identity(&self, normalizer: &Normalizer, search: &str) -> bool {
        !search.is_empty()
            && (normalizer.search_form(&self.key) == search
                || normalizer.search_form(&self.agent_type) == search
                || normalizer.search_form(&self.name) == search)
    }
}

/// Ordered key -> agent mapping produced by one enrichment pass.
///
/// Keys are unique; order is first-seen with deployment records ahead of
/// injected ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    agents: Vec<EnrichedAgent>,
    index: HashMap<String, usize>,
    normalizer: Normalizer,
}

impl Directory {
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            agents: Vec::new(),
            index: HashMap::new(),
            normalizer,
        }
    }

    /// Build from a list, dropping later entries whose key was already seen.
    pub fn from_agents(normalizer: Normalizer, agents: Vec<EnrichedAgent>) -> Self {
        let mut dir = Self::new(normalizer);
        for agent in agents {
            if !dir.insert(agent.clone()) {
                tracing::debug!("directory: dropping duplicate key '{}'", agent.key);
            }
        }
        dir
    }

    /// Append an agent; returns `false` (and leaves the directory untouched)
    /// if the key is already present.
    pub fn insert(&mut self, agent: EnrichedAgent) -> bool {
        if self.index.contains_key(&agent.key) {
            return false;
        }
        self.index.insert(agent.key.clone(), self.agents.len());
        self.agents.push(agent);
        true
    }

    /// Remove an agent by key; returns `false` if absent.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(pos) = self.index.remove(key) else {
            return false;
        };
        self.agents.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        true
    }

    pub fn get(&self, key: &str) -> Option<&EnrichedAgent> {
        self.index.get(key).map(|&i| &self.agents[i])
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut EnrichedAgent> {
        self.index.get(key).map(|&i| &mut self.agents[i])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn first(&self) -> Option<&EnrichedAgent> {
        self.agents.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnrichedAgent> {
        self.agents.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.agents.iter().map(|a| a.key.as_str())
    }

    pub fn as_slice(&self) -> &[EnrichedAgent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Key of the first entry matching `identifier` by key, agent type or
    /// name (search forms compared).
    pub fn find_by_identity(&self, identifier: &str) -> Option<&str> {
        let search = self.normalizer.search_form(identifier);
        self.agents
            .iter()
            .find(|a| a.matches_identity(&self.normalizer, &search))
            .map(|a| a.key.as_str())
    }
}

impl<'a> IntoIterator for &'a Directory {
    type Item = &'a EnrichedAgent;
    type IntoIter = std::slice::Iter<'a, EnrichedAgent>;

    fn into_iter(self) -> Self::IntoIter {
        self.agents.iter()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Minimal deployed agent for tests.
    pub fn agent(key: &str, display: &str) -> EnrichedAgent {
        EnrichedAgent {
            key: key.to_string(),
            name: key.to_string(),
            agent_type: key.to_string(),
            status: "active".to_string(),
            id: format!("id-{key}"),
            alias_or_session_ref: None,
            deployment_kind: DeploymentKind::HostedRuntime,
            runtime: None,
            display_name: display.to_string(),
            color: "#000000".to_string(),
            icon: "bot".to_string(),
            description: format!("{display} agent"),
            alternative_names: Vec::new(),
            team_name: None,
            orchestrator_agent: None,
            origin: AgentOrigin::Deployed,
        }
    }

    pub fn directory(agents: Vec<EnrichedAgent>) -> Directory {
        Directory::from_agents(Normalizer::default(), agents)
    }
}
