//! Scenes: per-tick condition matrices.
//!
//! A scene biases which seeds ripen. Each entry is a signed coefficient
//! added (scaled) to a trait's activation input; absent traits read 0.0.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An environment the character is placed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// trait id -> signed coefficient
    #[serde(default)]
    pub conditions: BTreeMap<String, f64>,
    /// Stimulus tags the scene tends to raise
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Baseline hedonic tone fed to the feeling stage, [-1, 1]
    #[serde(default)]
    pub valence: f64,
}

impl Scene {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            description: String::new(),
            conditions: BTreeMap::new(),
            triggers: Vec::new(),
            valence: 0.0,
        }
    }

    pub fn with_condition(mut self, trait_id: impl Into<String>, coefficient: f64) -> Self {
        self.conditions.insert(trait_id.into(), coefficient);
        self
    }

    pub fn with_valence(mut self, valence: f64) -> Self {
        self.valence = valence.clamp(-1.0, 1.0);
        self
    }

    /// Coefficient for `trait_id`, 0.0 when absent.
    #[inline]
    pub fn condition(&self, trait_id: &str) -> f64 {
        self.conditions.get(trait_id).copied().unwrap_or(0.0)
    }

    pub fn display_name(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}

/// Named scenes available to the driver.
#[derive(Debug, Clone, Default)]
pub struct SceneLibrary {
    scenes: Vec<Scene>,
}

impl SceneLibrary {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self { scenes }
    }

    pub fn builtin() -> Self {
        let s = |id: &str,
                 title: &str,
                 description: &str,
                 valence: f64,
                 conditions: &[(&str, f64)],
                 triggers: &[&str]| Scene {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            conditions: conditions.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            valence,
        };

        Self::new(vec![
            s(
                "market",
                "Bustling market",
                "Goods everywhere, crowds and noise, temptation at every stall",
                0.3,
                &[
                    ("raga", 0.6),
                    ("chanda", 0.4),
                    ("viksepa", 0.3),
                    ("samadhi", -0.3),
                    ("alobha", -0.2),
                ],
                &["desirable_object", "scarcity_perceived"],
            ),
            s(
                "battlefield",
                "Battlefield",
                "Blades and blood, life on a knife edge, anger and fear entwined",
                -0.5,
                &[
                    ("pratigha", 0.7),
                    ("krodha", 0.5),
                    ("virya", 0.4),
                    ("auddhatya", 0.4),
                    ("advesa", -0.4),
                    ("prasrabdhi", -0.5),
                ],
                &["harm_received", "obstacle_encountered"],
            ),
            s(
                "meditation_hall",
                "Meditation hall",
                "Quiet and dignified, incense drifting, a place to gather the mind",
                0.3,
                &[
                    ("samadhi", 0.5),
                    ("prasrabdhi", 0.4),
                    ("smrti", 0.3),
                    ("viksepa", -0.4),
                    ("auddhatya", -0.3),
                    ("raga", -0.2),
                ],
                &["meditation_deepened", "focus_sustained"],
            ),
            s(
                "deceptive_realm",
                "Realm of illusion",
                "Truth and falsehood blur in the fog, deception everywhere",
                -0.2,
                &[
                    ("moha", 0.7),
                    ("drsti", 0.4),
                    ("vicikitsa", 0.5),
                    ("prajna", -0.4),
                    ("adhimoksa", -0.3),
                ],
                &["complexity_high", "deceptive_input"],
            ),
            s(
                "competition",
                "Arena",
                "Masters everywhere, clear winners and losers, fame hanging on a thought",
                0.0,
                &[
                    ("mana", 0.5),
                    ("irsya", 0.4),
                    ("virya", 0.4),
                    ("vicikitsa", 0.2),
                    ("upeksa", -0.4),
                ],
                &[
                    "comparison_favorable",
                    "comparison_unfavorable",
                    "success_achieved",
                ],
            ),
            s(
                "solitude",
                "Solitude",
                "Far from people, alone with one's own mind",
                0.0,
                &[
                    ("kaukritya", 0.3),
                    ("styana", 0.2),
                    ("vicara", 0.3),
                    ("viksepa", -0.4),
                    ("sathya", -0.5),
                ],
                &["action_reviewed", "memory_accessed"],
            ),
            s(
                "teaching",
                "Dharma hall",
                "A good teacher expounds, right principle revealed",
                0.4,
                &[
                    ("sraddha", 0.4),
                    ("prajna", 0.5),
                    ("amoha", 0.3),
                    ("drsti", -0.4),
                    ("moha", -0.3),
                    ("asraddhya", -0.3),
                ],
                &["truth_encountered", "understanding_gained"],
            ),
            s(
                "suffering",
                "Hardship",
                "Body and mind in pain, adversity at hand",
                -0.6,
                &[
                    ("pratigha", 0.4),
                    ("vicikitsa", 0.3),
                    ("kausidya", 0.3),
                    ("virya", -0.2),
                    ("sraddha", 0.1),
                    ("hri", 0.2),
                ],
                &["obstacle_encountered", "harm_received"],
            ),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.scenes.iter().map(|s| s.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_scenes() {
        let lib = SceneLibrary::builtin();
        assert_eq!(lib.len(), 8);
        let market = lib.get("market").unwrap();
        assert_eq!(market.condition("raga"), 0.6);
        assert_eq!(market.condition("moha"), 0.0);
        assert!(lib.get("moon").is_none());
    }

    #[test]
    fn builder() {
        let scene = Scene::new("storm")
            .with_condition("auddhatya", 0.5)
            .with_valence(-3.0);
        assert_eq!(scene.condition("auddhatya"), 0.5);
        assert_eq!(scene.valence, -1.0);
        assert_eq!(scene.display_name(), "storm");
    }

    #[test]
    fn deserializes_with_defaults() {
        let scene: Scene = serde_json::from_str(r#"{"id": "void"}"#).unwrap();
        assert!(scene.conditions.is_empty());
        assert_eq!(scene.valence, 0.0);
    }
}
