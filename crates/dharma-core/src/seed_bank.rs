//! Seed bank: the latent trait layer.
//!
//! One [`Seed`] per catalog entry holds the long-run disposition (`weight`)
//! and the recent trend (`momentum`). Every action nudges seeds ("perfuming");
//! updates that run along the existing momentum learn faster. Momentum relaxes
//! geometrically toward zero on every tick, independent of weight.
//!
//! The bank never fails on bad input: unknown ids are no-ops, reads of unknown
//! ids return the neutral weight, and all values are clamped after every
//! mutation (weight ∈ [0, 1], momentum ∈ [-1, 1]).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::catalog::{FactorCatalog, FactorCategory};
use crate::config::SeedBankConfig;
use crate::error::PersistResult;

/// Weight reported for ids the catalog does not know.
pub const NEUTRAL_WEIGHT: f64 = 0.5;

/// Persistent disposition for one trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    pub id: String,
    /// Long-run disposition strength, [0, 1]
    pub weight: f64,
    /// Recent-trend accelerator, [-1, 1]
    pub momentum: f64,
    /// Store tick of the most recent manifestation
    pub last_manifest: u64,
    pub manifest_count: u64,
}

impl Seed {
    fn new(id: &str, weight: f64) -> Self {
        Self {
            id: id.to_string(),
            weight: weight.clamp(0.0, 1.0),
            momentum: 0.0,
            last_manifest: 0,
            manifest_count: 0,
        }
    }
}

/// Store of all seeds, in catalog order.
#[derive(Debug, Clone)]
pub struct TraitStore {
    catalog: Arc<FactorCatalog>,
    config: SeedBankConfig,
    seeds: Vec<Seed>,
    current_time: u64,
}

impl TraitStore {
    /// Create a store with one seed per catalog entry.
    ///
    /// `initial` overrides the default weight for the ids it names; ids the
    /// catalog does not know are ignored.
    pub fn new(
        catalog: Arc<FactorCatalog>,
        initial: &HashMap<String, f64>,
        config: SeedBankConfig,
    ) -> Self {
        let seeds = catalog
            .iter()
            .map(|f| {
                let w = initial
                    .get(&f.id)
                    .copied()
                    .filter(|w| w.is_finite())
                    .unwrap_or(config.default_weight);
                Seed::new(&f.id, w)
            })
            .collect();

        for id in initial.keys().filter(|id| !catalog.contains(id)) {
            log::debug!("Ignoring initial weight for unknown trait '{}'", id);
        }

        Self {
            catalog,
            config,
            seeds,
            current_time: 0,
        }
    }

    /// Store with every seed at the default weight.
    pub fn with_defaults(catalog: Arc<FactorCatalog>) -> Self {
        Self::new(catalog, &HashMap::new(), SeedBankConfig::default())
    }

    #[inline]
    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    #[inline]
    pub fn catalog(&self) -> &Arc<FactorCatalog> {
        &self.catalog
    }

    pub fn seed(&self, id: &str) -> Option<&Seed> {
        self.catalog.position(id).map(|i| &self.seeds[i])
    }

    fn seed_mut(&mut self, id: &str) -> Option<&mut Seed> {
        self.catalog.position(id).map(move |i| &mut self.seeds[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seed> {
        self.seeds.iter()
    }

    /// Current weight, or the neutral 0.5 for unknown ids.
    pub fn get_weight(&self, id: &str) -> f64 {
        self.seed(id).map(|s| s.weight).unwrap_or(NEUTRAL_WEIGHT)
    }

    /// Perfume a seed.
    ///
    /// `base = delta * intensity * learn_rate`, amplified by
    /// `1 + |momentum| * momentum_gain` when momentum already points the
    /// same way as `delta`. Momentum then follows an EMA of `delta`.
    pub fn update(&mut self, id: &str, delta: f64, intensity: f64) {
        if !delta.is_finite() || !intensity.is_finite() {
            log::warn!(
                "Ignoring non-finite seed update for '{}' (delta={}, intensity={})",
                id,
                delta,
                intensity
            );
            return;
        }
        let cfg = self.config.clone();
        let Some(seed) = self.seed_mut(id) else {
            return;
        };

        let delta = delta.clamp(-1.0, 1.0);
        let intensity = intensity.clamp(0.0, 1.0);

        let mut base = delta * intensity * cfg.learn_rate;
        let same_trend =
            (delta > 0.0 && seed.momentum > 0.0) || (delta < 0.0 && seed.momentum < 0.0);
        if same_trend {
            base *= 1.0 + seed.momentum.abs() * cfg.momentum_gain;
        }

        let before = seed.weight;
        seed.weight = (seed.weight + base).clamp(0.0, 1.0);
        seed.momentum = (seed.momentum * cfg.momentum_retention
            + delta * (1.0 - cfg.momentum_retention))
            .clamp(-1.0, 1.0);

        log::trace!(
            "seed {}: weight {:.4} -> {:.4}, momentum {:.4}",
            id,
            before,
            seed.weight,
            seed.momentum
        );
    }

    /// Record that a trait manifested at the current tick.
    pub fn manifest(&mut self, id: &str) {
        let now = self.current_time;
        if let Some(seed) = self.seed_mut(id) {
            seed.last_manifest = now;
            seed.manifest_count += 1;
        }
    }

    /// Apply an antidote: the target loses `strength * 0.5`, the counter
    /// gains `strength * 0.3`. No-op unless both ids are known.
    pub fn apply_counterforce(&mut self, counter_id: &str, target_id: &str, strength: f64) {
        if !self.catalog.contains(counter_id) || !self.catalog.contains(target_id) {
            return;
        }
        self.update(target_id, -strength * 0.5, 1.0);
        self.update(counter_id, strength * 0.3, 1.0);
    }

    /// Advance the store clock; momentum of every seed decays.
    pub fn tick(&mut self) {
        self.current_time += 1;
        let decay = self.config.momentum_decay;
        for seed in &mut self.seeds {
            seed.momentum *= decay;
        }
    }

    /// Top `top_n` seeds of `category` by weight, descending. Ties keep
    /// catalog order.
    pub fn dominant(&self, category: FactorCategory, top_n: usize) -> Vec<(String, f64)> {
        self.dominant_where(|c| c == category, top_n)
    }

    /// Strongest afflictions across both affliction categories.
    pub fn dominant_afflictions(&self, top_n: usize) -> Vec<(String, f64)> {
        self.dominant_where(|c| c.is_affliction(), top_n)
    }

    pub fn dominant_wholesome(&self, top_n: usize) -> Vec<(String, f64)> {
        self.dominant(FactorCategory::Wholesome, top_n)
    }

    fn dominant_where<F>(&self, pred: F, top_n: usize) -> Vec<(String, f64)>
    where
        F: Fn(FactorCategory) -> bool,
    {
        let mut picked: Vec<(String, f64)> = self
            .catalog
            .iter()
            .zip(&self.seeds)
            .filter(|(f, _)| pred(f.category))
            .map(|(_, s)| (s.id.clone(), s.weight))
            .collect();
        // sort_by is stable
        picked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        picked.truncate(top_n);
        picked
    }

    /// Weights of every seed in `category`.
    pub fn weights_in(&self, category: FactorCategory) -> BTreeMap<String, f64> {
        self.catalog
            .iter()
            .zip(&self.seeds)
            .filter(|(f, _)| f.category == category)
            .map(|(_, s)| (s.id.clone(), s.weight))
            .collect()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            current_time: self.current_time,
            traits: self
                .seeds
                .iter()
                .map(|s| {
                    (
                        s.id.clone(),
                        SeedRecord {
                            weight: s.weight,
                            momentum: s.momentum,
                            last_manifest: s.last_manifest,
                            manifest_count: s.manifest_count,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Restore ids present in both the snapshot and the catalog. Others keep
    /// their current values; unknown ids in the snapshot are ignored.
    pub fn restore(&mut self, snapshot: &StoreSnapshot) {
        self.current_time = snapshot.current_time;
        let mut restored = 0usize;
        for (id, rec) in &snapshot.traits {
            let Some(seed) = self.seed_mut(id) else {
                log::debug!("Skipping unknown trait '{}' in snapshot", id);
                continue;
            };
            if rec.weight.is_finite() {
                seed.weight = rec.weight.clamp(0.0, 1.0);
            }
            if rec.momentum.is_finite() {
                seed.momentum = rec.momentum.clamp(-1.0, 1.0);
            }
            seed.last_manifest = rec.last_manifest;
            seed.manifest_count = rec.manifest_count;
            restored += 1;
        }
        log::debug!(
            "Restored {} of {} traits at t={}",
            restored,
            self.seeds.len(),
            self.current_time
        );
    }

    /// Fresh store (constructor defaults) overlaid with `snapshot`.
    pub fn from_snapshot(
        catalog: Arc<FactorCatalog>,
        config: SeedBankConfig,
        snapshot: &StoreSnapshot,
    ) -> Self {
        let mut store = Self::new(catalog, &HashMap::new(), config);
        store.restore(snapshot);
        store
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshot())
    }

    /// Save to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> PersistResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::info!("Saved {} seeds to {}", self.seeds.len(), path.display());
        Ok(())
    }

    /// Load a store from a JSON file written by [`TraitStore::save`].
    pub fn load<P: AsRef<Path>>(
        path: P,
        catalog: Arc<FactorCatalog>,
        config: SeedBankConfig,
    ) -> PersistResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)?;
        log::info!("Loaded seed snapshot from {}", path.display());
        Ok(Self::from_snapshot(catalog, config, &snapshot))
    }
}

/// Serialized form of a [`TraitStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default, alias = "time")]
    pub current_time: u64,
    #[serde(default, alias = "seeds")]
    pub traits: BTreeMap<String, SeedRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRecord {
    #[serde(default = "neutral_weight")]
    pub weight: f64,
    #[serde(default)]
    pub momentum: f64,
    #[serde(default, alias = "last_manifest_time")]
    pub last_manifest: u64,
    #[serde(default)]
    pub manifest_count: u64,
}

fn neutral_weight() -> f64 {
    NEUTRAL_WEIGHT
}
