use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a deployed agent is hosted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentKind {
    #[default]
    HostedRuntime,
    ContainerRuntime,
}

/// Reference to the runtime an agent executes on. Collaborators of one team
/// share their orchestrator's runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
}

impl RuntimeRef {
    pub fn is_empty(&self) -> bool {
        self.id.as_deref().is_none_or(str::is_empty) && self.arn.as_deref().is_none_or(str::is_empty)
    }
}

/// One agent as reported by the deployment registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedAgentRecord {
    /// Raw deployment name; may carry the environment prefix/suffix.
    pub name: String,
    /// Stable key shared with style and topology config.
    pub agent_type: String,
    pub status: String,
    pub id: String,
    #[serde(default, alias = "aliasId", alias = "sessionRef")]
    pub alias_or_session_ref: Option<String>,
    #[serde(default)]
    pub deployment_kind: DeploymentKind,
    #[serde(default)]
    pub runtime_id: Option<String>,
    #[serde(default)]
    pub runtime_arn: Option<String>,
    /// Display name the deployment advertises for itself.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl DeployedAgentRecord {
    pub fn is_active(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("active")
    }

    /// Runtime reference, only for container-runtime deployments.
    pub fn runtime(&self) -> Option<RuntimeRef> {
        if self.deployment_kind != DeploymentKind::ContainerRuntime {
            return None;
        }
        let rt = RuntimeRef {
            id: self.runtime_id.clone(),
            arn: self.runtime_arn.clone(),
        };
        if rt.is_empty() { None } else { Some(rt) }
    }
}

/// Optional decoration for one agent type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentStyleEntry {
    pub display_name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub alternative_names: Vec<String>,
    pub description: Option<String>,
}

/// Style entries keyed by agent type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleConfig {
    pub agents: BTreeMap<String, AgentStyleEntry>,
}

impl StyleConfig {
    /// Exact key lookup, then a case- and separator-insensitive match.
    pub fn entry_for(&self, key: &str) -> Option<&AgentStyleEntry> {
        if let Some(e) = self.agents.get(key) {
            return Some(e);
        }
        let wanted = super::naming::strip_separators(&key.to_lowercase());
        self.agents
            .iter()
            .find(|(k, _)| super::naming::strip_separators(&k.to_lowercase()) == wanted)
            .map(|(_, e)| e)
    }
}

/// A team led by one orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamTopologyEntry {
    pub team_name: String,
    #[serde(default, alias = "collaboratorAgents", alias = "agents")]
    pub collaborators: Vec<String>,
}

/// Teams keyed by orchestrator agent type, iterated in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopologyConfig {
    pub teams: BTreeMap<String, TeamTopologyEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployed_record_deserializes_camel_case() {
        let json = r#"{
            "name": "agentcore-BidSimulator-dev",
            "agentType": "BidSimulator",
            "status": "ACTIVE",
            "id": "a-1",
            "deploymentKind": "container-runtime",
            "runtimeArn": "arn:runtime/1"
        }"#;
        let rec: DeployedAgentRecord = serde_json::from_str(json).expect("parse ok");
        assert!(rec.is_active());
        assert_eq!(rec.deployment_kind, DeploymentKind::ContainerRuntime);
        let rt = rec.runtime().expect("runtime");
        assert_eq!(rt.arn.as_deref(), Some("arn:runtime/1"));
    }

    #[test]
    fn hosted_records_carry_no_runtime() {
        let json = r#"{"name":"n","agentType":"t","status":"active","id":"1","runtimeId":"r"}"#;
        let rec: DeployedAgentRecord = serde_json::from_str(json).expect("parse ok");
        assert_eq!(rec.deployment_kind, DeploymentKind::HostedRuntime);
        assert!(rec.runtime().is_none());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let json = r#"{"name":"n","status":"active","id":"1"}"#;
        assert!(serde_json::from_str::<DeployedAgentRecord>(json).is_err());
    }

    #[test]
    fn style_lookup_falls_back_to_folded_key() {
        let style: StyleConfig = serde_json::from_str(
            r#"{"bid_simulator": {"displayName": "Bid Sim", "alternativeNames": ["bidder"]}}"#,
        )
        .expect("parse ok");
        let e = style.entry_for("BidSimulator").expect("entry");
        assert_eq!(e.display_name.as_deref(), Some("Bid Sim"));
        assert_eq!(e.alternative_names, vec!["bidder"]);
    }

    #[test]
    fn topology_accepts_collaborator_aliases() {
        let topo: TopologyConfig = serde_yaml::from_str(
            "Planner:\n  teamName: Planning\n  collaboratorAgents: [BidSimulator, Creative]\n",
        )
        .expect("parse ok");
        let team = topo.teams.get("Planner").expect("team");
        assert_eq!(team.team_name, "Planning");
        assert_eq!(team.collaborators, vec!["BidSimulator", "Creative"]);
    }
}
