//! Capability patterns: named combinations of capability and trait levels.
//!
//! Patterns are not exclusive: strong mindfulness and desire-to-act
//! alongside active greed report both `fixation` and `craving`.

use serde::{Deserialize, Serialize};

use crate::capability::{Capability, CapabilitySystem};
use crate::manifestation::StrengthMap;

/// One pattern definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDef {
    pub name: String,
    /// id -> minimum strength (inclusive)
    pub required: Vec<(String, f64)>,
    /// id -> strength at or above which the pattern is excluded. Capability
    /// ids resolve through the gauge's effective strength here too.
    #[serde(default)]
    pub forbidden: Vec<(String, f64)>,
    #[serde(default)]
    pub effect: String,
}

impl PatternDef {
    /// Capability ids read the gauge's effective strength, everything else
    /// the active-trait map (0.0 when inactive).
    fn level(id: &str, capabilities: &CapabilitySystem, active: &StrengthMap) -> f64 {
        if Capability::from_id(id).is_some() {
            capabilities.effective_strength(id)
        } else {
            active.get(id).copied().unwrap_or(0.0)
        }
    }

    pub fn matches(&self, capabilities: &CapabilitySystem, active: &StrengthMap) -> bool {
        let required = self
            .required
            .iter()
            .all(|(id, min)| Self::level(id, capabilities, active) >= *min);
        required
            && !self
                .forbidden
                .iter()
                .any(|(id, max)| Self::level(id, capabilities, active) >= *max)
    }
}

/// Ordered set of pattern definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternLibrary {
    patterns: Vec<PatternDef>,
}

impl PatternLibrary {
    pub fn new(patterns: Vec<PatternDef>) -> Self {
        Self { patterns }
    }

    pub fn builtin() -> Self {
        let p = |name: &str, req: &[(&str, f64)], forb: &[(&str, f64)], effect: &str| PatternDef {
            name: name.to_string(),
            required: req.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            forbidden: forb.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            effect: effect.to_string(),
        };

        Self::new(vec![
            p(
                "right_wisdom",
                &[("prajna", 0.6), ("amoha", 0.5)],
                &[("drsti", 0.5)],
                "insight that cuts through clinging",
            ),
            p(
                "wrong_wisdom",
                &[("prajna", 0.6), ("drsti", 0.5)],
                &[],
                "clever self-justification, harder to correct",
            ),
            p(
                "clear_concentration",
                &[("samadhi", 0.6), ("prasrabdhi", 0.5)],
                &[("styana", 0.5)],
                "stable and lucid focus",
            ),
            p(
                "dull_concentration",
                &[("samadhi", 0.6), ("styana", 0.5)],
                &[],
                "sunken stillness that only looks stable",
            ),
            p(
                "right_mindfulness",
                &[("smrti", 0.6), ("apramada", 0.5)],
                &[],
                "clear recollection without negligence",
            ),
            p(
                "fixation",
                &[("smrti", 0.6), ("raga", 0.5)],
                &[],
                "remembers but clings, cannot let go",
            ),
            p(
                "right_effort",
                &[("chanda", 0.6), ("virya", 0.5)],
                &[("raga", 0.5)],
                "wholesome drive",
            ),
            p(
                "craving",
                &[("chanda", 0.6), ("raga", 0.5)],
                &[],
                "intense, insatiable wanting",
            ),
            p(
                "right_faith",
                &[("adhimoksa", 0.6), ("sraddha", 0.5)],
                &[],
                "firm conviction that is not shaken",
            ),
            p(
                "stubbornness",
                &[("adhimoksa", 0.6), ("mana", 0.5)],
                &[],
                "self-willed, deaf to advice",
            ),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternDef> {
        self.patterns.iter()
    }

    pub fn get(&self, name: &str) -> Option<&PatternDef> {
        self.patterns.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Names of every matching pattern, in library order.
    pub fn detect(&self, capabilities: &CapabilitySystem, active: &StrengthMap) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|p| p.matches(capabilities, active))
            .map(|p| p.name.clone())
            .collect()
    }
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Match the built-in library.
pub fn detect_patterns(capabilities: &CapabilitySystem, active: &StrengthMap) -> Vec<String> {
    PatternLibrary::builtin().detect(capabilities, active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FactorCatalog;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn caps(entries: &[(&str, f64)]) -> CapabilitySystem {
        let initial: HashMap<String, f64> =
            entries.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        CapabilitySystem::new(
            Arc::new(FactorCatalog::builtin()),
            &initial,
            Default::default(),
        )
    }

    fn active(entries: &[(&str, f64)]) -> StrengthMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn thresholds_are_inclusive() {
        let c = caps(&[("prajna", 0.6)]);
        let found = detect_patterns(&c, &active(&[("amoha", 0.5)]));
        assert_eq!(found, vec!["right_wisdom".to_string()]);
    }

    #[test]
    fn forbidden_excludes_at_threshold() {
        let c = caps(&[("prajna", 0.7)]);
        let found = detect_patterns(&c, &active(&[("amoha", 0.6), ("drsti", 0.5)]));
        assert_eq!(found, vec!["wrong_wisdom".to_string()]);
    }

    #[test]
    fn overlapping_patterns_are_all_reported() {
        let c = caps(&[("chanda", 0.8), ("smrti", 0.7)]);
        let found = detect_patterns(&c, &active(&[("raga", 0.9)]));
        assert_eq!(found, vec!["fixation".to_string(), "craving".to_string()]);
    }

    #[test]
    fn disrupted_capability_uses_effective_strength() {
        let mut c = caps(&[("samadhi", 0.9)]);
        let act = active(&[("prasrabdhi", 0.6)]);
        assert!(detect_patterns(&c, &act).contains(&"clear_concentration".to_string()));

        c.check_disruption(&active(&[("viksepa", 0.8)]));
        assert!(detect_patterns(&c, &act).is_empty());
    }

    #[test]
    fn nothing_matches_at_rest() {
        let c = caps(&[]);
        assert!(detect_patterns(&c, &StrengthMap::new()).is_empty());
    }

    #[test]
    fn custom_library() {
        let lib = PatternLibrary::new(vec![PatternDef {
            name: "calm".into(),
            required: vec![("upeksa".into(), 0.3)],
            forbidden: vec![("auddhatya".into(), 0.2)],
            effect: String::new(),
        }]);
        let c = caps(&[]);
        assert_eq!(lib.detect(&c, &active(&[("upeksa", 0.4)])), vec!["calm".to_string()]);
        assert!(lib
            .detect(&c, &active(&[("upeksa", 0.4), ("auddhatya", 0.2)]))
            .is_empty());
        assert_eq!(PatternLibrary::builtin().len(), 10);
    }

    #[test]
    fn forbidden_capability_reads_the_gauge() {
        let lib = PatternLibrary::new(vec![PatternDef {
            name: "unfocused_calm".into(),
            required: vec![("upeksa".into(), 0.3)],
            forbidden: vec![("samadhi".into(), 0.5)],
            effect: String::new(),
        }]);
        let act = active(&[("upeksa", 0.4)]);
        let mut c = caps(&[("samadhi", 0.9)]);
        assert!(lib.detect(&c, &act).is_empty());

        // disrupted: 0.9 * 0.2 falls under the forbidden level
        c.check_disruption(&active(&[("viksepa", 0.8)]));
        assert_eq!(lib.detect(&c, &act), vec!["unfocused_calm".to_string()]);
    }
}
