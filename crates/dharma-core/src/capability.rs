//! Capability gauges (the five "particular" factors).
//!
//! A capability is a direction-less tool. Concentration, memory or analysis
//! can serve a wholesome or an afflicted pattern depending on which traits
//! accompany its use:
//!
//! 1. **Chanda** - desire-to-act, motivation
//! 2. **Adhimoksa** - resolve, commitment
//! 3. **Smrti** - mindfulness, retention
//! 4. **Samadhi** - concentration, one-pointedness
//! 5. **Prajna** - wisdom, discrimination
//!
//! `direction` and `disrupted` are recomputed from scratch on every cycle
//! (replace, never merge). Only `strength` carries state between ticks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::catalog::FactorCatalog;
use crate::config::CapabilityConfig;
use crate::manifestation::StrengthMap;
use crate::status::CapabilityStatus;

/// Strength reported for capability ids the system does not know.
pub const NEUTRAL_STRENGTH: f64 = 0.5;

// ============================================================================
// Identifiers
// ============================================================================

/// The fixed set of capability gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Chanda,
    Adhimoksa,
    Smrti,
    Samadhi,
    Prajna,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Chanda,
        Capability::Adhimoksa,
        Capability::Smrti,
        Capability::Samadhi,
        Capability::Prajna,
    ];

    /// Trait id shared with the catalog's particular category.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Chanda => "chanda",
            Self::Adhimoksa => "adhimoksa",
            Self::Smrti => "smrti",
            Self::Samadhi => "samadhi",
            Self::Prajna => "prajna",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Chanda => "desire-to-act",
            Self::Adhimoksa => "resolve",
            Self::Smrti => "mindfulness",
            Self::Samadhi => "concentration",
            Self::Prajna => "wisdom",
        }
    }

    /// Afflictions that interrupt this capability, in check order.
    pub fn default_disruptors(&self) -> &'static [&'static str] {
        match self {
            Self::Chanda => &["kausidya", "styana"],
            Self::Adhimoksa => &["vicikitsa"],
            Self::Smrti => &["musitasmritita", "viksepa"],
            Self::Samadhi => &["viksepa", "auddhatya", "styana"],
            Self::Prajna => &["styana", "moha"],
        }
    }

    #[inline]
    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Contextual polarity of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Wholesome,
    Unwholesome,
    #[default]
    Neutral,
}

impl Direction {
    #[inline]
    pub fn valence(&self) -> f64 {
        match self {
            Self::Wholesome => 1.0,
            Self::Unwholesome => -1.0,
            Self::Neutral => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Wholesome => "wholesome",
            Self::Unwholesome => "unwholesome",
            Self::Neutral => "neutral",
        }
    }
}

// ============================================================================
// Gauge
// ============================================================================

/// One capability gauge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityGauge {
    pub capability: Capability,
    /// Raw strength, [0, 1]
    pub strength: f64,
    /// Recomputed every cycle
    pub direction: Direction,
    /// Resistance to disruption, [0, 1]
    pub stability: f64,
    pub disruptors: Vec<String>,
    /// Recomputed every cycle
    pub disrupted: bool,
    pub disruption_source: Option<String>,
}

impl CapabilityGauge {
    fn new(capability: Capability, strength: f64, stability: f64) -> Self {
        Self {
            capability,
            strength: strength.clamp(0.0, 1.0),
            direction: Direction::Neutral,
            stability: stability.clamp(0.0, 1.0),
            disruptors: capability
                .default_disruptors()
                .iter()
                .map(|d| d.to_string())
                .collect(),
            disrupted: false,
            disruption_source: None,
        }
    }

    /// Strength after the disruption penalty.
    #[inline]
    pub fn effective_strength(&self, penalty: f64) -> f64 {
        if self.disrupted {
            self.strength * penalty
        } else {
            self.strength
        }
    }
}

// ============================================================================
// System
// ============================================================================

/// The five gauges plus the catalog used to classify accompanying traits.
#[derive(Debug, Clone)]
pub struct CapabilitySystem {
    catalog: Arc<FactorCatalog>,
    config: CapabilityConfig,
    gauges: Vec<CapabilityGauge>,
}

impl CapabilitySystem {
    /// `initial` maps capability ids to starting strengths; unknown ids are
    /// ignored.
    pub fn new(
        catalog: Arc<FactorCatalog>,
        initial: &HashMap<String, f64>,
        config: CapabilityConfig,
    ) -> Self {
        let gauges = Capability::ALL
            .into_iter()
            .map(|cap| {
                let strength = initial
                    .get(cap.id())
                    .copied()
                    .filter(|s| s.is_finite())
                    .unwrap_or(config.default_strength);
                CapabilityGauge::new(cap, strength, config.default_stability)
            })
            .collect();

        Self {
            catalog,
            config,
            gauges,
        }
    }

    pub fn with_defaults(catalog: Arc<FactorCatalog>) -> Self {
        Self::new(catalog, &HashMap::new(), CapabilityConfig::default())
    }

    #[inline]
    pub fn gauge(&self, cap: Capability) -> &CapabilityGauge {
        &self.gauges[cap.index()]
    }

    pub fn gauge_by_id(&self, id: &str) -> Option<&CapabilityGauge> {
        Capability::from_id(id).map(|c| self.gauge(c))
    }

    fn gauge_mut(&mut self, id: &str) -> Option<&mut CapabilityGauge> {
        Capability::from_id(id).map(move |c| &mut self.gauges[c.index()])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapabilityGauge> {
        self.gauges.iter()
    }

    /// Raw strength, ignoring disruption. 0.5 for unknown ids.
    pub fn strength(&self, id: &str) -> f64 {
        self.gauge_by_id(id)
            .map(|g| g.strength)
            .unwrap_or(NEUTRAL_STRENGTH)
    }

    /// Strength after the disruption penalty. 0.5 for unknown ids.
    pub fn effective_strength(&self, id: &str) -> f64 {
        self.gauge_by_id(id)
            .map(|g| g.effective_strength(self.config.disruption_penalty))
            .unwrap_or(NEUTRAL_STRENGTH)
    }

    /// Effective strength of every gauge, keyed by id.
    pub fn effective_strengths(&self) -> StrengthMap {
        self.gauges
            .iter()
            .map(|g| {
                (
                    g.capability.id().to_string(),
                    g.effective_strength(self.config.disruption_penalty),
                )
            })
            .collect()
    }

    pub fn update_strength(&mut self, id: &str, delta: f64, intensity: f64) {
        if !delta.is_finite() || !intensity.is_finite() {
            log::warn!(
                "Ignoring non-finite capability update for '{}' (delta={}, intensity={})",
                id,
                delta,
                intensity
            );
            return;
        }
        let rate = self.config.learn_rate;
        if let Some(g) = self.gauge_mut(id) {
            let step = delta.clamp(-1.0, 1.0) * intensity.clamp(0.0, 1.0) * rate;
            g.strength = (g.strength + step).clamp(0.0, 1.0);
        }
    }

    pub fn set_stability(&mut self, id: &str, stability: f64) {
        if !stability.is_finite() {
            return;
        }
        if let Some(g) = self.gauge_mut(id) {
            g.stability = stability.clamp(0.0, 1.0);
        }
    }

    /// Recompute the direction of `id` from the traits active alongside it.
    ///
    /// Wholesome wins only if it leads the root afflictions by more than the
    /// margin, and vice versa; anything closer is neutral.
    pub fn update_direction(&mut self, id: &str, accompanying: &StrengthMap) {
        let (wholesome, unwholesome) = self.direction_weights(accompanying);
        let margin = self.config.direction_margin;
        if let Some(g) = self.gauge_mut(id) {
            g.direction = if wholesome > unwholesome + margin {
                Direction::Wholesome
            } else if unwholesome > wholesome + margin {
                Direction::Unwholesome
            } else {
                Direction::Neutral
            };
        }
    }

    /// [`update_direction`](Self::update_direction) for every gauge.
    pub fn update_all_directions(&mut self, accompanying: &StrengthMap) {
        for cap in Capability::ALL {
            self.update_direction(cap.id(), accompanying);
        }
    }

    fn direction_weights(&self, accompanying: &StrengthMap) -> (f64, f64) {
        let mut wholesome = 0.0;
        let mut unwholesome = 0.0;
        for (id, strength) in accompanying {
            if self.catalog.in_wholesome_set(id) {
                wholesome += strength;
            } else if self.catalog.in_core_affliction_set(id) {
                unwholesome += strength;
            }
        }
        (wholesome, unwholesome)
    }

    /// Recompute disruption for every gauge. The first registered disruptor
    /// whose active strength exceeds the gauge's stability wins.
    pub fn check_disruption(&mut self, active_afflictions: &StrengthMap) {
        for g in &mut self.gauges {
            g.disrupted = false;
            g.disruption_source = None;

            let hit = g.disruptors.iter().find(|d| {
                active_afflictions
                    .get(d.as_str())
                    .is_some_and(|s| *s > g.stability)
            });
            if let Some(source) = hit {
                log::debug!("{} disrupted by {}", g.capability, source);
                g.disruption_source = Some(source.clone());
                g.disrupted = true;
            }
        }
    }

    /// Signed effect (`effective * valence`) and a one-line description.
    pub fn combined_effect(&self, id: &str) -> (f64, String) {
        let Some(g) = self.gauge_by_id(id) else {
            return (0.0, "none".to_string());
        };
        let effective = g.effective_strength(self.config.disruption_penalty);
        let effect = effective * g.direction.valence();
        let name = g.capability.name();

        let desc = match (&g.disruption_source, g.direction) {
            (Some(src), _) if g.disrupted => {
                format!("{} disrupted by {}", name, self.catalog.display_name(src))
            }
            (_, Direction::Wholesome) => format!("{} used wholesomely ({:.2})", name, effective),
            (_, Direction::Unwholesome) => {
                format!("{} used unwholesomely ({:.2})", name, effective)
            }
            (_, Direction::Neutral) => format!("{} used neutrally ({:.2})", name, effective),
        };
        (effect, desc)
    }

    /// Status table, one row per gauge.
    pub fn status(&self) -> Vec<CapabilityStatus> {
        self.gauges
            .iter()
            .map(|g| {
                let (effect, description) = self.combined_effect(g.capability.id());
                CapabilityStatus {
                    id: g.capability.id().to_string(),
                    name: g.capability.name().to_string(),
                    strength: g.strength,
                    effective: g.effective_strength(self.config.disruption_penalty),
                    stability: g.stability,
                    direction: g.direction,
                    disrupted: g.disrupted,
                    disruption_source: g.disruption_source.clone(),
                    effect,
                    description,
                }
            })
            .collect()
    }

    /// Raw strengths keyed by id, in gauge order.
    pub fn strengths(&self) -> Vec<(Capability, f64)> {
        self.gauges.iter().map(|g| (g.capability, g.strength)).collect()
    }
}

impl fmt::Display for CapabilitySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .gauges
            .iter()
            .map(|g| {
                let sign = match g.direction {
                    Direction::Wholesome => "+",
                    Direction::Unwholesome => "-",
                    Direction::Neutral => "o",
                };
                let mark = if g.disrupted { "!" } else { "" };
                format!(
                    "{}{}{}:{:.2}",
                    g.capability,
                    sign,
                    mark,
                    g.effective_strength(self.config.disruption_penalty)
                )
            })
            .collect();
        write!(f, "Capabilities({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> CapabilitySystem {
        CapabilitySystem::with_defaults(Arc::new(FactorCatalog::builtin()))
    }

    fn map(entries: &[(&str, f64)]) -> StrengthMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn ids_round_trip() {
        for cap in Capability::ALL {
            assert_eq!(Capability::from_id(cap.id()), Some(cap));
        }
        assert_eq!(Capability::from_id("virya"), None);
    }

    #[test]
    fn unknown_capability_is_neutral() {
        let mut sys = system();
        assert_eq!(sys.strength("virya"), 0.5);
        assert_eq!(sys.effective_strength("virya"), 0.5);
        sys.update_strength("virya", 1.0, 1.0);
        assert_eq!(sys.combined_effect("virya").0, 0.0);
    }

    #[test]
    fn update_strength_scales_and_clamps() {
        let mut sys = system();
        sys.update_strength("samadhi", 1.0, 0.5);
        assert!((sys.strength("samadhi") - 0.55).abs() < 1e-12);
        for _ in 0..20 {
            sys.update_strength("samadhi", 5.0, 5.0);
        }
        assert_eq!(sys.strength("samadhi"), 1.0);
    }

    #[test]
    fn disruption_penalises_to_twenty_percent() {
        let mut sys = system();
        sys.update_strength("smrti", 1.0, 1.0); // 0.6
        sys.check_disruption(&map(&[("viksepa", 0.6)]));

        let g = sys.gauge(Capability::Smrti);
        assert!(g.disrupted);
        assert_eq!(g.disruption_source.as_deref(), Some("viksepa"));
        assert!((sys.effective_strength("smrti") - 0.12).abs() < 1e-12);
        assert!((sys.strength("smrti") - 0.6).abs() < 1e-12);
    }

    #[test]
    fn disruption_requires_strictly_exceeding_stability() {
        let mut sys = system();
        sys.check_disruption(&map(&[("vicikitsa", 0.5)]));
        assert!(!sys.gauge(Capability::Adhimoksa).disrupted);
    }

    #[test]
    fn first_registered_disruptor_wins() {
        let mut sys = system();
        sys.check_disruption(&map(&[("styana", 0.9), ("viksepa", 0.7)]));
        let g = sys.gauge(Capability::Samadhi);
        assert_eq!(g.disruption_source.as_deref(), Some("viksepa"));
    }

    #[test]
    fn disruption_is_recomputed_not_sticky() {
        let mut sys = system();
        let active = map(&[("moha", 0.8)]);
        sys.check_disruption(&active);
        assert!(sys.gauge(Capability::Prajna).disrupted);

        sys.check_disruption(&StrengthMap::new());
        assert!(!sys.gauge(Capability::Prajna).disrupted);
        assert!(sys.gauge(Capability::Prajna).disruption_source.is_none());

        sys.check_disruption(&active);
        let again = sys.gauge(Capability::Prajna).clone();
        sys.check_disruption(&active);
        assert_eq!(&again, sys.gauge(Capability::Prajna));
    }

    #[test]
    fn direction_hysteresis() {
        let mut sys = system();

        sys.update_direction("prajna", &map(&[("amoha", 0.3), ("moha", 0.3)]));
        assert_eq!(sys.gauge(Capability::Prajna).direction, Direction::Neutral);

        sys.update_direction("prajna", &map(&[("amoha", 0.3 + 0.2), ("moha", 0.3)]));
        assert_eq!(sys.gauge(Capability::Prajna).direction, Direction::Neutral);

        sys.update_direction("prajna", &map(&[("amoha", 0.3 + 0.2001), ("moha", 0.3)]));
        assert_eq!(sys.gauge(Capability::Prajna).direction, Direction::Wholesome);

        sys.update_direction("prajna", &map(&[("amoha", 0.1), ("raga", 0.4)]));
        assert_eq!(sys.gauge(Capability::Prajna).direction, Direction::Unwholesome);
    }

    #[test]
    fn secondary_afflictions_do_not_steer_direction() {
        let mut sys = system();
        sys.update_direction("chanda", &map(&[("krodha", 1.0), ("styana", 1.0)]));
        assert_eq!(sys.gauge(Capability::Chanda).direction, Direction::Neutral);
    }

    #[test]
    fn combined_effect_signs() {
        let mut sys = system();
        sys.update_direction("samadhi", &map(&[("prasrabdhi", 1.0)]));
        let (effect, desc) = sys.combined_effect("samadhi");
        assert!((effect - 0.5).abs() < 1e-12);
        assert!(desc.contains("wholesomely"));

        sys.update_direction("samadhi", &map(&[("raga", 1.0)]));
        sys.check_disruption(&map(&[("auddhatya", 0.9)]));
        let (effect, desc) = sys.combined_effect("samadhi");
        assert!((effect + 0.1).abs() < 1e-12);
        assert!(desc.contains("disrupted"));
    }
}
