//! Actions: what a character does, and how it perfumes the seeds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of the action table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// trait id -> delta passed to the seed update
    #[serde(default)]
    pub trait_effects: Vec<(String, f64)>,
    /// capability id -> delta passed to the gauge update
    #[serde(default)]
    pub capability_effects: Vec<(String, f64)>,
    /// Traits whose configured antidote is applied
    #[serde(default)]
    pub counterforce_targets: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<String>,
}

/// What `perform_action` changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: String,
    pub intensity: f64,
    /// trait id -> `delta * intensity` as requested
    pub seeds: BTreeMap<String, f64>,
    /// capability id -> `delta * intensity` as requested
    pub capabilities: BTreeMap<String, f64>,
    /// (target, antidote) pairs that were applied
    pub counterforces: Vec<(String, String)>,
}

impl ActionOutcome {
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty() && self.capabilities.is_empty() && self.counterforces.is_empty()
    }
}

/// Lookup table of actions.
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    actions: Vec<ActionDef>,
}

impl ActionTable {
    pub fn new(actions: Vec<ActionDef>) -> Self {
        Self { actions }
    }

    pub fn builtin() -> Self {
        fn pairs(v: &[(&str, f64)]) -> Vec<(String, f64)> {
            v.iter().map(|(k, d)| (k.to_string(), *d)).collect()
        }
        fn strings(v: &[&str]) -> Vec<String> {
            v.iter().map(|s| s.to_string()).collect()
        }
        let a = |id: &str,
                 title: &str,
                 traits: &[(&str, f64)],
                 caps: &[(&str, f64)],
                 targets: &[&str],
                 triggers: &[&str]| ActionDef {
            id: id.to_string(),
            title: title.to_string(),
            trait_effects: pairs(traits),
            capability_effects: pairs(caps),
            counterforce_targets: strings(targets),
            triggers: strings(triggers),
        };

        Self::new(vec![
            a(
                "generosity",
                "Generosity",
                &[("alobha", 0.5), ("matsarya", -0.3), ("raga", -0.2), ("sraddha", 0.2)],
                &[("chanda", 0.1)],
                &["raga", "matsarya"],
                &["generosity_practiced", "letting_go"],
            ),
            a(
                "discipline",
                "Ethical discipline",
                &[("apramada", 0.4), ("hri", 0.3), ("apatrapya", 0.3), ("pramada", -0.3)],
                &[("adhimoksa", 0.1)],
                &["pramada"],
                &["discipline_maintained"],
            ),
            a(
                "patience",
                "Patience",
                &[("advesa", 0.5), ("pratigha", -0.4), ("krodha", -0.3), ("upeksa", 0.3)],
                &[("adhimoksa", 0.1), ("samadhi", 0.05)],
                &["pratigha", "krodha"],
                &["patience_shown"],
            ),
            a(
                "diligence",
                "Diligence",
                &[("virya", 0.5), ("kausidya", -0.4), ("styana", -0.2)],
                &[("chanda", 0.15), ("smrti", 0.05)],
                &["kausidya", "styana"],
                &["effort_sustained"],
            ),
            a(
                "meditation",
                "Meditation",
                &[("samadhi", 0.5), ("prasrabdhi", 0.4), ("viksepa", -0.4), ("auddhatya", -0.3)],
                &[("samadhi", 0.2), ("smrti", 0.1)],
                &["viksepa", "auddhatya"],
                &["meditation_deepened", "focus_sustained"],
            ),
            a(
                "contemplation",
                "Contemplation",
                &[("prajna", 0.4), ("moha", -0.3), ("drsti", -0.2)],
                &[("prajna", 0.15)],
                &["moha"],
                &["analysis_active"],
            ),
            a(
                "mindfulness",
                "Mindfulness",
                &[("smrti", 0.5), ("musitasmritita", -0.4), ("viksepa", -0.2)],
                &[("smrti", 0.2), ("samadhi", 0.1)],
                &["musitasmritita"],
                &["mindfulness_practiced"],
            ),
            a(
                "loving_kindness",
                "Loving-kindness",
                &[("advesa", 0.5), ("ahimsa", 0.4), ("pratigha", -0.3), ("vihimsa", -0.4)],
                &[("samadhi", 0.05)],
                &["pratigha", "vihimsa"],
                &["compassion_practiced"],
            ),
            a(
                "sympathetic_joy",
                "Sympathetic joy",
                &[("irsya", -0.5), ("alobha", 0.3)],
                &[],
                &["irsya"],
                &["joy_in_others_success"],
            ),
            a(
                "repentance",
                "Repentance",
                &[("hri", 0.5), ("apatrapya", 0.5), ("mraksa", -0.5), ("ahrikya", -0.4)],
                &[],
                &["mraksa", "ahrikya"],
                &["confession_made"],
            ),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDef> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FactorCatalog;

    #[test]
    fn builtin_table() {
        let table = ActionTable::builtin();
        assert_eq!(table.len(), 10);
        let g = table.get("generosity").unwrap();
        assert_eq!(g.counterforce_targets, vec!["raga", "matsarya"]);
        assert!(table.get("teleport").is_none());
    }

    #[test]
    fn builtin_effects_reference_known_traits() {
        let catalog = FactorCatalog::builtin();
        for action in ActionTable::builtin().iter() {
            for (id, _) in &action.trait_effects {
                assert!(catalog.contains(id), "{} -> {}", action.id, id);
            }
            for id in &action.counterforce_targets {
                assert!(catalog.antidote(id).is_some(), "{} -> {}", action.id, id);
            }
        }
    }
}
