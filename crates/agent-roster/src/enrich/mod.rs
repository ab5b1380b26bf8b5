//! Enrichment: merge deployment records with optional style and topology
//! config into one directory.
//!
//! Responsibilities:
//! - Drop inactive and excluded deployments, de-duplicate keys.
//! - Compute display name, color, icon and description with fallbacks.
//! - Inject orchestrators and collaborators declared in topology but absent
//!   from the deployment list, and stamp team membership on existing agents.
//!
//! The pass is a pure function of its inputs, so recomputing it on a no-op
//! change yields an equal directory.

pub mod defaults;

use crate::config::RosterSettings;
use crate::model::{
    AgentOrigin, AgentStyleEntry, DeployedAgentRecord, DeploymentKind, Directory, EnrichedAgent,
    Normalizer, StyleConfig, TopologyConfig, humanize,
};

use self::defaults::{palette_color, sniff_description, sniff_icon, table_color};

/// Builds directories from raw source records.
#[derive(Debug, Clone)]
pub struct EnrichmentEngine {
    normalizer: Normalizer,
    /// Search forms of excluded agent names.
    excluded: Vec<String>,
}

impl EnrichmentEngine {
    pub fn new(normalizer: Normalizer, excluded: &[String]) -> Self {
        let excluded = excluded
            .iter()
            .map(|e| normalizer.search_form(e))
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            normalizer,
            excluded,
        }
    }

    pub fn from_settings(settings: &RosterSettings) -> Self {
        Self::new(settings.normalizer.clone(), &settings.excluded_agents)
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    fn is_excluded(&self, identifier: &str) -> bool {
        let form = self.normalizer.search_form(identifier);
        self.excluded.contains(&form)
    }

    /// Merge `deployed` with optional `style` and `topology` into a directory.
    pub fn enrich(
        &self,
        deployed: &[DeployedAgentRecord],
        style: Option<&StyleConfig>,
        topology: Option<&TopologyConfig>,
    ) -> Directory {
        let mut dir = Directory::new(self.normalizer.clone());

        for rec in deployed {
            if !rec.is_active() {
                tracing::debug!("skipping inactive agent '{}' (status={})", rec.name, rec.status);
                continue;
            }
            if rec.agent_type.trim().is_empty() {
                tracing::warn!("skipping agent '{}': empty agentType", rec.name);
                continue;
            }
            if self.is_excluded(&rec.agent_type) || self.is_excluded(&rec.name) {
                tracing::debug!("skipping excluded agent '{}'", rec.agent_type);
                continue;
            }
            let agent = self.enrich_record(rec, style_for(style, &rec.agent_type));
            let key = agent.key.clone();
            if !dir.insert(agent) {
                tracing::warn!("duplicate deployment for key '{}'; keeping the first", key);
            }
        }

        if let Some(topology) = topology {
            self.apply_topology(&mut dir, topology, style);
        }

        tracing::debug!(
            "enriched directory: {} agent(s) from {} deployment record(s)",
            dir.len(),
            deployed.len()
        );
        dir
    }

    fn enrich_record(
        &self,
        rec: &DeployedAgentRecord,
        style: Option<&AgentStyleEntry>,
    ) -> EnrichedAgent {
        let service_name = self.normalizer.strip_affixes(rec.name.trim()).to_string();
        let display_name = style
            .and_then(|s| non_empty(s.display_name.as_deref()))
            .or_else(|| non_empty(rec.display_name.as_deref()))
            .map(str::to_string)
            .unwrap_or_else(|| {
                let from_name = self.normalizer.display_from_name(&rec.name);
                if from_name.is_empty() {
                    humanize(&rec.agent_type)
                } else {
                    from_name
                }
            });
        let icon = style
            .and_then(|s| non_empty(s.icon.as_deref()))
            .or_else(|| non_empty(rec.icon.as_deref()))
            .map(str::to_string)
            .unwrap_or_else(|| {
                sniff_icon(&[rec.agent_type.as_str(), display_name.as_str()]).to_string()
            });
        EnrichedAgent {
            key: rec.agent_type.clone(),
            name: rec.name.clone(),
            agent_type: rec.agent_type.clone(),
            status: rec.status.clone(),
            id: rec.id.clone(),
            alias_or_session_ref: rec.alias_or_session_ref.clone(),
            deployment_kind: rec.deployment_kind,
            runtime: rec.runtime(),
            color: color_for(style, &[rec.agent_type.as_str(), service_name.as_str()]),
            icon,
            description: description_for(style, &display_name),
            alternative_names: style.map(|s| s.alternative_names.clone()).unwrap_or_default(),
            display_name,
            team_name: None,
            orchestrator_agent: None,
            origin: AgentOrigin::Deployed,
        }
    }

    /// Agent that exists only as a topology participant.
    fn synthesize(
        &self,
        key: &str,
        style: Option<&AgentStyleEntry>,
        origin: AgentOrigin,
    ) -> EnrichedAgent {
        let display_name = style
            .and_then(|s| non_empty(s.display_name.as_deref()))
            .map(str::to_string)
            .unwrap_or_else(|| humanize(self.normalizer.strip_affixes(key)));
        let icon = style
            .and_then(|s| non_empty(s.icon.as_deref()))
            .map(str::to_string)
            .unwrap_or_else(|| sniff_icon(&[key, display_name.as_str()]).to_string());
        EnrichedAgent {
            key: key.to_string(),
            name: key.to_string(),
            agent_type: key.to_string(),
            status: "active".to_string(),
            id: key.to_string(),
            alias_or_session_ref: None,
            deployment_kind: DeploymentKind::HostedRuntime,
            runtime: None,
            color: color_for(style, &[key]),
            icon,
            description: description_for(style, &display_name),
            alternative_names: style.map(|s| s.alternative_names.clone()).unwrap_or_default(),
            display_name,
            team_name: None,
            orchestrator_agent: None,
            origin,
        }
    }

    /// Key of the directory entry for `orchestrator`, injecting one if absent.
    fn ensure_orchestrator(
        &self,
        dir: &mut Directory,
        orchestrator: &str,
        style: Option<&StyleConfig>,
        team_name: Option<&str>,
    ) -> String {
        if let Some(k) = dir.find_by_identity(orchestrator) {
            return k.to_string();
        }
        let mut agent = self.synthesize(
            orchestrator,
            style_for(style, orchestrator),
            AgentOrigin::Orchestrator,
        );
        agent.team_name = team_name.map(str::to_string);
        tracing::debug!("injecting orchestrator '{}'", orchestrator);
        let key = agent.key.clone();
        dir.insert(agent);
        key
    }

    fn apply_topology(
        &self,
        dir: &mut Directory,
        topology: &TopologyConfig,
        style: Option<&StyleConfig>,
    ) {
        for (orchestrator, team) in &topology.teams {
            if orchestrator.trim().is_empty() {
                continue;
            }
            let team_name = non_empty(Some(team.team_name.as_str())).map(str::to_string);

            // An excluded orchestrator is neither injected nor stamped; its
            // collaborators still are.
            let orch_key = if self.is_excluded(orchestrator) {
                None
            } else {
                Some(self.ensure_orchestrator(dir, orchestrator, style, team_name.as_deref()))
            };
            if let Some(agent) = orch_key.as_deref().and_then(|k| dir.get_mut(k))
                && agent.team_name.is_none()
            {
                agent.team_name = team_name.clone();
            }
            let orch_runtime = orch_key
                .as_deref()
                .and_then(|k| dir.get(k))
                .and_then(|a| a.runtime.clone());

            for collaborator in &team.collaborators {
                if collaborator.trim().is_empty() || self.is_excluded(collaborator) {
                    continue;
                }
                let key = match dir.find_by_identity(collaborator) {
                    Some(k) => k.to_string(),
                    None => {
                        let mut agent = self.synthesize(
                            collaborator,
                            style_for(style, collaborator),
                            AgentOrigin::Collaborator,
                        );
                        agent.runtime = orch_runtime.clone();
                        tracing::debug!(
                            "injecting collaborator '{}' (orchestrator={:?})",
                            collaborator,
                            orch_key
                        );
                        let key = agent.key.clone();
                        dir.insert(agent);
                        key
                    }
                };
                if orch_key.as_deref() == Some(key.as_str()) {
                    continue;
                }
                if let Some(agent) = dir.get_mut(&key) {
                    if agent.team_name.is_none() {
                        agent.team_name = team_name.clone();
                    }
                    if agent.orchestrator_agent.is_none() {
                        agent.orchestrator_agent = orch_key.clone();
                    }
                }
            }
        }
    }
}

fn style_for<'a>(style: Option<&'a StyleConfig>, key: &str) -> Option<&'a AgentStyleEntry> {
    style.and_then(|s| s.entry_for(key))
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn color_for(style: Option<&AgentStyleEntry>, names: &[&str]) -> String {
    if let Some(c) = style.and_then(|s| non_empty(s.color.as_deref())) {
        return c.to_string();
    }
    if let Some(c) = table_color(names.iter().copied()) {
        return c.to_string();
    }
    palette_color(names.first().copied().unwrap_or_default()).to_string()
}

fn description_for(style: Option<&AgentStyleEntry>, display_name: &str) -> String {
    style
        .and_then(|s| non_empty(s.description.as_deref()))
        .map(str::to_string)
        .unwrap_or_else(|| sniff_description(display_name))
}
