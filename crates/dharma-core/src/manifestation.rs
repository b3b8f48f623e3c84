//! Activation math and the per-tick manifestation snapshot.
//!
//! ```text
//! x = SEED_WEIGHT * (seed - 0.5)
//!   + CONDITION_WEIGHT * condition
//!   + PARTICULAR_WEIGHT * particular_modifier
//!   - COUNTER_WEIGHT * counterforce
//! P = sigmoid(x)
//! ```
//!
//! Everything here is pure; sampling and reinforcement live in the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::capability::CapabilitySystem;
use crate::catalog::FactorCategory;
use crate::config::ManifestConfig;

/// Trait or capability id -> strength. Ordered so that sums and reports are
/// reproducible.
pub type StrengthMap = BTreeMap<String, f64>;

/// Logistic function. Strictly inside (0, 1) for finite input.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    // Saturate before exp() so the result never rounds to exactly 0 or 1.
    let x = x.clamp(-36.0, 36.0);
    1.0 / (1.0 + (-x).exp())
}

/// Capability modulation for a trait of `category`.
///
/// Concentration and mindfulness suppress afflictions; wisdom supports
/// wholesome traits; other categories are unaffected.
pub fn particular_modifier(category: FactorCategory, capabilities: &CapabilitySystem) -> f64 {
    match category {
        FactorCategory::PrimaryAffliction | FactorCategory::SecondaryAffliction => {
            let samadhi = capabilities.effective_strength("samadhi");
            let smrti = capabilities.effective_strength("smrti");
            -(samadhi + smrti) * 0.3
        }
        FactorCategory::Wholesome => capabilities.effective_strength("prajna") * 0.2,
        _ => 0.0,
    }
}

/// Inputs to the activation formula for one trait.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActivationInputs {
    pub seed_weight: f64,
    pub condition: f64,
    pub particular: f64,
    pub counterforce: f64,
}

impl ActivationInputs {
    /// Activation probability `P(f)`.
    pub fn probability(&self, cfg: &ManifestConfig) -> f64 {
        let x = cfg.seed_weight * (self.seed_weight - 0.5)
            + cfg.condition_weight * self.condition
            + cfg.particular_weight * self.particular
            - cfg.counter_weight * self.counterforce;
        sigmoid(x)
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Which traits were active on one tick. Replaced, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestationState {
    /// Universal and capability-linked traits
    pub baseline: StrengthMap,
    pub wholesome: StrengthMap,
    /// Primary and secondary afflictions
    pub afflictions: StrengthMap,
    pub indeterminate: StrengthMap,
    pub patterns: Vec<String>,
    /// Trait store clock when the snapshot was taken
    pub timestamp: u64,
}

impl ManifestationState {
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// Every active trait in one map.
    pub fn all_active(&self) -> StrengthMap {
        self.baseline
            .iter()
            .chain(&self.wholesome)
            .chain(&self.afflictions)
            .chain(&self.indeterminate)
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.strength(id) > 0.0
    }

    /// Active strength, 0.0 when inactive.
    pub fn strength(&self, id: &str) -> f64 {
        [
            &self.baseline,
            &self.wholesome,
            &self.afflictions,
            &self.indeterminate,
        ]
        .iter()
        .find_map(|m| m.get(id).copied())
        .unwrap_or(0.0)
    }

    /// Sum of wholesome strengths minus sum of affliction strengths.
    pub fn net_valence(&self) -> f64 {
        self.wholesome.values().sum::<f64>() - self.afflictions.values().sum::<f64>()
    }

    pub fn active_count(&self) -> usize {
        self.baseline.len() + self.wholesome.len() + self.afflictions.len() + self.indeterminate.len()
    }
}
