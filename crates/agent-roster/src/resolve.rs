//! Identifier resolution against a directory.
//!
//! Tiers, first match wins, each tier scanned over the whole directory:
//! 1. identity: exact key, then search-form match on name, alias or key;
//! 2. display: search-form match on display name, then alternative names;
//! 3. substring: a candidate's name/alias/key form contains the search form,
//!    or the search form contains the candidate's name form;
//! 4. default: the first directory entry (lenient mode only).
//!
//! A chosen collaborator without its own runtime reference borrows its
//! orchestrator's in a second, depth-one pass.

use serde::Serialize;

use crate::model::{Directory, EnrichedAgent, strip_separators};

/// Whether resolution may fall back to the first directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// `None` when no tier matches.
    Strict,
    /// Always returns an entry for a non-empty directory. Callers that show
    /// the result as a confident match must use `Strict` instead.
    Lenient,
}

/// Tier that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchTier {
    Identity,
    Display,
    Substring,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub agent: EnrichedAgent,
    pub tier: MatchTier,
}

pub fn resolve(directory: &Directory, identifier: &str, mode: ResolveMode) -> Option<EnrichedAgent> {
    resolve_with_tier(directory, identifier, mode).map(|r| r.agent)
}

/// Tiers 1–3 only.
pub fn resolve_strict(directory: &Directory, identifier: &str) -> Option<EnrichedAgent> {
    resolve(directory, identifier, ResolveMode::Strict)
}

/// Tiers 1–4: falls back to the first directory entry.
pub fn resolve_lenient(directory: &Directory, identifier: &str) -> Option<EnrichedAgent> {
    resolve(directory, identifier, ResolveMode::Lenient)
}

pub fn resolve_with_tier(
    directory: &Directory,
    identifier: &str,
    mode: ResolveMode,
) -> Option<Resolution> {
    let found = match find(directory, identifier) {
        Some(hit) => Some(hit),
        None if mode == ResolveMode::Lenient => {
            let first = directory.first()?;
            tracing::debug!(
                "no match for '{}'; defaulting to first agent '{}'",
                identifier,
                first.key
            );
            Some((first, MatchTier::Default))
        }
        None => None,
    };
    let (agent, tier) = found?;
    Some(Resolution {
        agent: backfill_runtime(directory, agent.clone()),
        tier,
    })
}

/// Tiers 1–3 without back-fill.
fn find<'a>(directory: &'a Directory, identifier: &str) -> Option<(&'a EnrichedAgent, MatchTier)> {
    if let Some(agent) = directory.get(identifier.trim()) {
        return Some((agent, MatchTier::Identity));
    }
    let normalizer = directory.normalizer();
    let search = normalizer.search_form(identifier);
    if search.is_empty() {
        return None;
    }

    if let Some(agent) = directory
        .iter()
        .find(|a| a.identity_forms(normalizer).iter().any(|f| *f == search))
    {
        return Some((agent, MatchTier::Identity));
    }

    let display_form = |s: &str| strip_separators(&s.to_lowercase());
    if let Some(agent) = directory
        .iter()
        .find(|a| display_form(&a.display_name) == search)
    {
        return Some((agent, MatchTier::Display));
    }
    if let Some(agent) = directory
        .iter()
        .find(|a| a.alternative_names.iter().any(|n| display_form(n) == search))
    {
        return Some((agent, MatchTier::Display));
    }

    directory
        .iter()
        .find(|a| {
            let forms = a.identity_forms(normalizer);
            let name_form = normalizer.search_form(&a.name);
            forms.iter().any(|f| f.contains(&search))
                || (!name_form.is_empty() && search.contains(&name_form))
        })
        .map(|a| (a, MatchTier::Substring))
}

/// Copy the orchestrator's runtime onto a collaborator that lacks one.
///
/// Looks one level up only; a missing or self-referencing orchestrator, or
/// one without a runtime, leaves the agent unchanged.
fn backfill_runtime(directory: &Directory, mut agent: EnrichedAgent) -> EnrichedAgent {
    if agent.runtime.is_some() {
        return agent;
    }
    let Some(orch_id) = agent.orchestrator_agent.clone() else {
        return agent;
    };
    let orchestrator = directory
        .get(&orch_id)
        .or_else(|| find(directory, &orch_id).map(|(a, _)| a));
    match orchestrator {
        Some(orch) if orch.key == agent.key => {
            tracing::warn!("agent '{}' lists itself as orchestrator; skipping back-fill", agent.key);
        }
        Some(orch) => {
            if let Some(rt) = orch.runtime.as_ref() {
                tracing::debug!("back-filled runtime for '{}' from '{}'", agent.key, orch.key);
                agent.runtime = Some(rt.clone());
            }
        }
        None => {
            tracing::debug!(
                "orchestrator '{}' of '{}' not in directory; no back-fill",
                orch_id,
                agent.key
            );
        }
    }
    agent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RuntimeRef;
    use crate::model::agent::test_support::{agent, directory};
    use proptest::prelude::*;

    fn sample() -> Directory {
        let mut bid = agent("BidSimulator", "Bid Simulator Agent");
        bid.name = "agentcore-BidSimulator-dev".into();
        bid.alias_or_session_ref = Some("bid-alias-7".into());
        let mut creative = agent("CreativeAgent", "Creative Studio");
        creative.alternative_names = vec!["Ad Maker".into()];
        let audience = agent("AudienceInsights", "Audience Insights");
        directory(vec![bid, creative, audience])
    }

    fn key_of(r: Option<EnrichedAgent>) -> Option<String> {
        r.map(|a| a.key)
    }

    #[test]
    fn identity_tier_matches_name_alias_and_key() {
        let d = sample();
        for ident in [
            "BidSimulator",
            "bid simulator",
            "Bid-Simulator",
            "agentcore-BidSimulator-dev",
            "BID_ALIAS_7",
        ] {
            let r = resolve_with_tier(&d, ident, ResolveMode::Strict).expect(ident);
            assert_eq!(r.agent.key, "BidSimulator", "{ident}");
            assert_eq!(r.tier, MatchTier::Identity, "{ident}");
        }
    }

    #[test]
    fn display_tier_matches_display_and_alternative_names() {
        let d = sample();
        let r = resolve_with_tier(&d, "creative studio", ResolveMode::Strict).expect("display");
        assert_eq!((r.agent.key.as_str(), r.tier), ("CreativeAgent", MatchTier::Display));
        let r = resolve_with_tier(&d, "Bid Simulator Agent", ResolveMode::Strict).expect("display");
        assert_eq!((r.agent.key.as_str(), r.tier), ("BidSimulator", MatchTier::Display));
        let r = resolve_with_tier(&d, "ad-maker", ResolveMode::Strict).expect("alt");
        assert_eq!((r.agent.key.as_str(), r.tier), ("CreativeAgent", MatchTier::Display));
    }

    #[test]
    fn substring_tier_both_directions() {
        let d = sample();
        let r = resolve_with_tier(&d, "audience", ResolveMode::Strict).expect("contains");
        assert_eq!((r.agent.key.as_str(), r.tier), ("AudienceInsights", MatchTier::Substring));
        let r = resolve_with_tier(&d, "the creativeagent please", ResolveMode::Strict)
            .expect("contained");
        assert_eq!((r.agent.key.as_str(), r.tier), ("CreativeAgent", MatchTier::Substring));
    }

    #[test]
    fn strict_misses_lenient_defaults_to_first() {
        let d = sample();
        assert_eq!(resolve_strict(&d, "forecaster"), None);
        assert_eq!(resolve_strict(&d, "   "), None);
        let r = resolve_with_tier(&d, "forecaster", ResolveMode::Lenient).expect("default");
        assert_eq!((r.agent.key.as_str(), r.tier), ("BidSimulator", MatchTier::Default));
        assert_eq!(resolve_lenient(&directory(vec![]), "anything"), None);
    }

    #[test]
    fn exact_key_beats_another_agents_name() {
        let mut shadow = agent("Shadow", "Shadow");
        shadow.name = "bid".into();
        let d = directory(vec![shadow, agent("Bid", "Bid")]);
        assert_eq!(key_of(resolve_strict(&d, "Bid")), Some("Bid".into()));
        assert_eq!(key_of(resolve_strict(&d, "BID")), Some("Shadow".into()));
    }

    #[test]
    fn collaborator_borrows_orchestrator_runtime() {
        let mut planner = agent("Planner", "Planner");
        planner.runtime = Some(RuntimeRef {
            id: Some("rt-1".into()),
            arn: None,
        });
        let mut bid = agent("Bid", "Bid");
        bid.orchestrator_agent = Some("Planner".into());
        let mut own = agent("Own", "Own");
        own.orchestrator_agent = Some("Planner".into());
        own.runtime = Some(RuntimeRef {
            id: Some("rt-own".into()),
            arn: None,
        });
        let d = directory(vec![planner, bid, own]);

        let bid = resolve_strict(&d, "Bid").expect("bid");
        assert_eq!(bid.runtime.and_then(|r| r.id).as_deref(), Some("rt-1"));
        // Directory itself is untouched.
        assert_eq!(d.get("Bid").and_then(|a| a.runtime.clone()), None);

        let own = resolve_strict(&d, "Own").expect("own");
        assert_eq!(own.runtime.and_then(|r| r.id).as_deref(), Some("rt-own"));
    }

    #[test]
    fn orchestrator_cycles_fail_closed() {
        let mut a = agent("A", "Alpha");
        a.orchestrator_agent = Some("B".into());
        let mut b = agent("B", "Beta");
        b.orchestrator_agent = Some("A".into());
        let mut selfish = agent("Selfish", "Selfish");
        selfish.orchestrator_agent = Some("Selfish".into());
        let d = directory(vec![a, b, selfish]);
        assert_eq!(resolve_strict(&d, "A").expect("a").runtime, None);
        assert_eq!(resolve_strict(&d, "Selfish").expect("self").runtime, None);
    }

    fn arb_keys() -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set("[A-Za-z][A-Za-z0-9_]{0,10}", 1..8)
            .prop_map(|s| s.into_iter().collect())
    }

    proptest! {
        #[test]
        fn present_key_resolves_to_itself(keys in arb_keys(), pick in any::<prop::sample::Index>()) {
            let d = directory(keys.iter().map(|k| agent(k, k)).collect());
            let key = &keys[pick.index(keys.len())];
            let got = resolve_strict(&d, key).map(|a| a.key);
            prop_assert_eq!(got.as_deref(), Some(key.as_str()));
        }

        #[test]
        fn resolution_is_idempotent(keys in arb_keys(), ident in "[A-Za-z _-]{0,12}") {
            let d = directory(keys.iter().map(|k| agent(k, k)).collect());
            prop_assert_eq!(resolve_lenient(&d, &ident), resolve_lenient(&d, &ident));
            prop_assert_eq!(resolve_strict(&d, &ident), resolve_strict(&d, &ident));
        }
    }
}
