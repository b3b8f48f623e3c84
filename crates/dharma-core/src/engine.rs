//! Per-character manifestation engine.
//!
//! Owns every piece of one character's mutable state and drives the tick:
//!
//! 1. **Seed bank** - latent dispositions ([`TraitStore`])
//! 2. **Capabilities** - neutral gauges ([`CapabilitySystem`])
//! 3. **Pipeline** - stimulus events ([`StimulusPipeline`])
//! 4. **Manifestation** - which traits are active this tick
//! 5. **Indeterminate** - sleep, regret, initial and sustained thought
//!
//! # Manifestation cycle
//! ```text
//! scene + seeds + capabilities + counterforces
//!     -> P(f) per trait -> seeded Bernoulli draws -> active set
//!     -> check_disruption(active afflictions)
//!     -> update_direction(all active) for every gauge
//!     -> pattern detection -> snapshot + history
//! ```
//!
//! All randomness comes from one `StdRng` per engine, seeded from
//! [`EngineConfig::rng_seed`], so identical seeds and inputs replay exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::action::{ActionOutcome, ActionTable};
use crate::archetype::Archetype;
use crate::capability::CapabilitySystem;
use crate::catalog::{FactorCatalog, FactorCategory};
use crate::config::EngineConfig;
use crate::error::{ActionError, PersistResult};
use crate::manifestation::{particular_modifier, ActivationInputs, ManifestationState};
use crate::patterns::PatternLibrary;
use crate::pipeline::{MentalEvent, PipelineContext, StimulusPipeline};
use crate::scene::Scene;
use crate::seed_bank::TraitStore;
use crate::status::{EngineStatus, TraitLevel};

// ============================================================================
// Indeterminate scalars
// ============================================================================

/// Levels of the four indeterminate factors, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndeterminateState {
    pub sleep: f64,
    pub regret: f64,
    pub vitarka: f64,
    pub vicara: f64,
}

impl IndeterminateState {
    /// Raise the scalar tied to `trait_id` to at least `level`.
    fn raise(&mut self, trait_id: &str, level: f64) {
        let slot = match trait_id {
            "middha" => &mut self.sleep,
            "kaukritya" => &mut self.regret,
            "vitarka" => &mut self.vitarka,
            "vicara" => &mut self.vicara,
            _ => return,
        };
        *slot = slot.max(level.clamp(0.0, 1.0));
    }

    fn decay(&mut self) {
        self.sleep *= 0.9;
        self.regret *= 0.95;
        self.vitarka *= 0.9;
        self.vicara *= 0.9;
    }
}

// ============================================================================
// Engine
// ============================================================================

pub struct ManifestationEngine {
    catalog: Arc<FactorCatalog>,
    config: EngineConfig,
    store: TraitStore,
    capabilities: CapabilitySystem,
    pipeline: StimulusPipeline,
    patterns: PatternLibrary,
    actions: ActionTable,
    scene: Option<Scene>,
    current: ManifestationState,
    history: VecDeque<ManifestationState>,
    /// Target trait -> tick-scoped suppression
    counterforces: BTreeMap<String, f64>,
    indeterminate: IndeterminateState,
    stimulus_valence: HashMap<String, f64>,
    rng: StdRng,
}

impl ManifestationEngine {
    /// Engine with default seeds and capabilities.
    pub fn new(catalog: Arc<FactorCatalog>, config: EngineConfig) -> Self {
        Self::with_initial(catalog, config, &HashMap::new(), &HashMap::new())
    }

    /// Engine with caller-supplied starting seed weights and capability
    /// strengths. Unknown ids in either map are ignored.
    pub fn with_initial(
        catalog: Arc<FactorCatalog>,
        config: EngineConfig,
        seeds: &HashMap<String, f64>,
        capabilities: &HashMap<String, f64>,
    ) -> Self {
        let store = TraitStore::new(Arc::clone(&catalog), seeds, config.seed_bank.clone());
        let capabilities =
            CapabilitySystem::new(Arc::clone(&catalog), capabilities, config.capability.clone());
        let pipeline = StimulusPipeline::new(config.pipeline.clone());
        let rng = StdRng::seed_from_u64(config.rng_seed);

        log::debug!(
            "Engine created: {} traits, rng_seed={}",
            catalog.len(),
            config.rng_seed
        );

        Self {
            catalog,
            store,
            capabilities,
            pipeline,
            patterns: PatternLibrary::builtin(),
            actions: ActionTable::builtin(),
            scene: None,
            current: ManifestationState::default(),
            history: VecDeque::new(),
            counterforces: BTreeMap::new(),
            indeterminate: IndeterminateState::default(),
            stimulus_valence: HashMap::new(),
            rng,
            config,
        }
    }

    /// Engine over the built-in catalog, initialised from a preset.
    pub fn from_archetype(archetype: Archetype, config: EngineConfig) -> Self {
        let catalog = Arc::new(FactorCatalog::builtin());
        let seeds = archetype.seeds(&catalog);
        let caps = archetype.capabilities();
        Self::with_initial(catalog, config, &seeds, &caps)
    }

    pub fn with_actions(mut self, actions: ActionTable) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_patterns(mut self, patterns: PatternLibrary) -> Self {
        self.patterns = patterns;
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    #[inline]
    pub fn catalog(&self) -> &Arc<FactorCatalog> {
        &self.catalog
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn store(&self) -> &TraitStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TraitStore {
        &mut self.store
    }

    #[inline]
    pub fn capabilities(&self) -> &CapabilitySystem {
        &self.capabilities
    }

    pub fn capabilities_mut(&mut self) -> &mut CapabilitySystem {
        &mut self.capabilities
    }

    #[inline]
    pub fn pipeline(&self) -> &StimulusPipeline {
        &self.pipeline
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    /// Snapshot of the most recent manifestation update.
    #[inline]
    pub fn current(&self) -> &ManifestationState {
        &self.current
    }

    /// Past snapshots, oldest first.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &ManifestationState> {
        self.history.iter()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn set_scene(&mut self, scene: Option<Scene>) {
        self.scene = scene;
    }

    pub fn counterforces(&self) -> &BTreeMap<String, f64> {
        &self.counterforces
    }

    pub fn indeterminate(&self) -> &IndeterminateState {
        &self.indeterminate
    }

    #[inline]
    pub fn time(&self) -> u64 {
        self.store.current_time()
    }

    // ------------------------------------------------------------------------
    // Manifestation
    // ------------------------------------------------------------------------

    /// Activation probability of `id` under the current scene,
    /// capabilities and counterforces. 0.0 for unknown ids.
    pub fn activation_probability(&self, id: &str) -> f64 {
        let Some(category) = self.catalog.category(id) else {
            return 0.0;
        };
        ActivationInputs {
            seed_weight: self.store.get_weight(id),
            condition: self.scene.as_ref().map(|s| s.condition(id)).unwrap_or(0.0),
            particular: particular_modifier(category, &self.capabilities),
            counterforce: self.counterforces.get(id).copied().unwrap_or(0.0),
        }
        .probability(&self.config.manifest)
    }

    /// Sample a new active set with the engine's own generator.
    /// `Some(scene)` replaces the current scene first.
    pub fn update_manifest(&mut self, scene: Option<&Scene>) -> &ManifestationState {
        let mut rng = std::mem::replace(&mut self.rng, StdRng::seed_from_u64(0));
        self.update_manifest_with(scene, &mut rng);
        self.rng = rng;
        &self.current
    }

    /// [`update_manifest`](Self::update_manifest) with an explicit generator.
    pub fn update_manifest_with<R: Rng>(
        &mut self,
        scene: Option<&Scene>,
        rng: &mut R,
    ) -> &ManifestationState {
        if let Some(scene) = scene {
            self.scene = Some(scene.clone());
        }

        let threshold = self.config.manifest.threshold;
        let mut next = ManifestationState::new(self.store.current_time());
        let catalog = Arc::clone(&self.catalog);

        for def in catalog.iter() {
            let id = def.id.as_str();
            match def.category {
                FactorCategory::Universal => {
                    next.baseline.insert(def.id.clone(), 1.0);
                }
                FactorCategory::Particular => {
                    let p = self.activation_probability(id);
                    if rng.gen::<f64>() < 0.5 + p * 0.5 {
                        next.baseline.insert(def.id.clone(), p);
                    } else {
                        continue;
                    }
                }
                category => {
                    let p = self.activation_probability(id);
                    if !(p > threshold && rng.gen::<f64>() < p) {
                        continue;
                    }
                    let slot = match category {
                        FactorCategory::Wholesome => &mut next.wholesome,
                        FactorCategory::Indeterminate => {
                            self.indeterminate.raise(id, p);
                            &mut next.indeterminate
                        }
                        _ => &mut next.afflictions,
                    };
                    slot.insert(def.id.clone(), p);
                }
            }
            self.store.manifest(id);
        }

        self.capabilities.check_disruption(&next.afflictions);
        let active = next.all_active();
        self.capabilities.update_all_directions(&active);
        next.patterns = self.patterns.detect(&self.capabilities, &active);

        log::debug!(
            "t={} scene={} wholesome={} afflictions={} patterns={:?}",
            next.timestamp,
            self.scene.as_ref().map(|s| s.id.as_str()).unwrap_or("-"),
            next.wholesome.len(),
            next.afflictions.len(),
            next.patterns
        );

        self.history.push_back(next.clone());
        let cap = self.config.manifest.history_cap;
        if self.history.len() > cap {
            let keep = self.config.manifest.history_keep.min(cap);
            let excess = self.history.len() - keep;
            self.history.drain(..excess);
        }
        self.current = next;
        &self.current
    }

    /// Advance time: seed momentum and the pipeline clock move, live
    /// counterforces and indeterminate levels decay.
    pub fn tick(&mut self) {
        self.store.tick();
        self.pipeline.tick();

        let decay = self.config.manifest.counterforce_decay;
        let floor = self.config.manifest.counterforce_floor;
        self.counterforces.retain(|_, v| {
            *v *= decay;
            *v >= floor
        });

        self.indeterminate.decay();
    }

    // ------------------------------------------------------------------------
    // Actions and counterforces
    // ------------------------------------------------------------------------

    /// Execute a named action from the action table.
    ///
    /// Each counterforce target gets both the store-level antidote update
    /// and a live suppression entry of `intensity`.
    pub fn perform_action(
        &mut self,
        name: &str,
        intensity: f64,
    ) -> Result<ActionOutcome, ActionError> {
        let Some(action) = self.actions.get(name).cloned() else {
            log::warn!("Unknown action '{}'", name);
            return Err(ActionError::UnknownAction(name.to_string()));
        };
        let intensity = if intensity.is_finite() {
            intensity.clamp(0.0, 1.0)
        } else {
            log::warn!("Non-finite intensity for action '{}', using 0", name);
            0.0
        };

        let mut outcome = ActionOutcome {
            action: action.id.clone(),
            intensity,
            ..Default::default()
        };

        for (id, delta) in &action.trait_effects {
            self.store.update(id, *delta, intensity);
            outcome.seeds.insert(id.clone(), delta * intensity);
        }

        for (id, delta) in &action.capability_effects {
            self.capabilities.update_strength(id, *delta, intensity);
            outcome.capabilities.insert(id.clone(), delta * intensity);
        }

        for target in &action.counterforce_targets {
            let Some(antidote) = self.catalog.antidote(target).map(str::to_string) else {
                continue;
            };
            self.store.apply_counterforce(&antidote, target, intensity);
            self.counterforces.insert(target.clone(), intensity);
            outcome.counterforces.push((target.clone(), antidote));
        }

        log::debug!(
            "Action '{}' x{:.2}: {} seeds, {} capabilities, {} counterforces",
            action.id,
            intensity,
            outcome.seeds.len(),
            outcome.capabilities.len(),
            outcome.counterforces.len()
        );
        Ok(outcome)
    }

    /// Apply an antidote directly: live suppression on `target_id` plus the
    /// store-level update.
    pub fn apply_counterforce(&mut self, counter_id: &str, target_id: &str, strength: f64) {
        if !strength.is_finite() {
            log::warn!("Ignoring non-finite counterforce on '{}'", target_id);
            return;
        }
        if self.catalog.contains(target_id) {
            self.counterforces
                .insert(target_id.to_string(), strength.clamp(0.0, 1.0));
        }
        self.store.apply_counterforce(counter_id, target_id, strength);
    }

    pub fn clear_counterforces(&mut self) {
        self.counterforces.clear();
    }

    // ------------------------------------------------------------------------
    // Stimuli
    // ------------------------------------------------------------------------

    /// Register the learned hedonic tone of a stimulus, clamped to [-1, 1].
    pub fn set_stimulus_valence(&mut self, stimulus: &str, valence: f64) {
        if valence.is_finite() {
            self.stimulus_valence
                .insert(stimulus.to_string(), valence.clamp(-1.0, 1.0));
        }
    }

    /// Pipeline context for `stimulus` built from live state.
    ///
    /// The attention bias is `2 * w - 1` for the heaviest seed among traits
    /// the stimulus triggers, or 0 when it triggers none.
    pub fn pipeline_context(&self, stimulus: &str) -> PipelineContext {
        let triggered: Vec<String> = self
            .catalog
            .triggered_by(stimulus)
            .map(|f| f.id.clone())
            .collect();

        let mut ctx = PipelineContext {
            capabilities: self.capabilities.effective_strengths(),
            afflictions: self.current.afflictions.clone(),
            scene_valence: self.scene.as_ref().map(|s| s.valence).unwrap_or(0.0),
            ..Default::default()
        };

        let heaviest = triggered
            .iter()
            .map(|id| self.store.get_weight(id))
            .fold(None, |acc: Option<f64>, w| Some(acc.map_or(w, |a| a.max(w))));
        if let Some(w) = heaviest {
            ctx.seed_bias.insert(stimulus.to_string(), 2.0 * w - 1.0);
        }
        if let Some(v) = self.stimulus_valence.get(stimulus) {
            ctx.seed_valence.insert(stimulus.to_string(), *v);
        }
        ctx.triggered = triggered;
        ctx
    }

    /// Run one stimulus through the pipeline. Does not touch the seeds.
    pub fn process_stimulus(&mut self, stimulus: &str, intensity: f64) -> MentalEvent {
        let ctx = self.pipeline_context(stimulus);
        self.pipeline.process(stimulus, intensity, &ctx)
    }

    // ------------------------------------------------------------------------
    // Review and persistence
    // ------------------------------------------------------------------------

    fn levels<'a, I>(&self, entries: I) -> Vec<TraitLevel>
    where
        I: IntoIterator<Item = (&'a String, f64)>,
    {
        let mut out: Vec<TraitLevel> = entries
            .into_iter()
            .map(|(id, level)| TraitLevel {
                id: id.clone(),
                name: self.catalog.display_name(id).to_string(),
                level,
            })
            .collect();
        out.sort_by(|a, b| {
            b.level
                .partial_cmp(&a.level)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        out
    }

    pub fn status(&self) -> EngineStatus {
        let afflictions = self.store.dominant_afflictions(3);
        let wholesome = self.store.dominant_wholesome(3);

        EngineStatus {
            time: self.store.current_time(),
            scene: self.scene.as_ref().map(|s| s.display_name().to_string()),
            capabilities: self.capabilities.status(),
            patterns: self.current.patterns.clone(),
            dominant_afflictions: self.levels(afflictions.iter().map(|(k, v)| (k, *v))),
            dominant_wholesome: self.levels(wholesome.iter().map(|(k, v)| (k, *v))),
            manifest_wholesome: self.levels(self.current.wholesome.iter().map(|(k, v)| (k, *v))),
            manifest_afflictions: self
                .levels(self.current.afflictions.iter().map(|(k, v)| (k, *v))),
            net_valence: self.current.net_valence(),
            indeterminate: self.indeterminate,
            counterforces: self.counterforces.clone(),
            pipeline: self.pipeline.summary(),
        }
    }

    /// Human-readable report of [`status`](Self::status).
    pub fn review(&self) -> String {
        self.status().to_string()
    }

    pub fn save_seeds<P: AsRef<Path>>(&self, path: P) -> PersistResult<()> {
        self.store.save(path)
    }

    /// Replace the seed bank with one loaded from `path`.
    pub fn load_seeds<P: AsRef<Path>>(&mut self, path: P) -> PersistResult<()> {
        self.store = TraitStore::load(
            path,
            Arc::clone(&self.catalog),
            self.config.seed_bank.clone(),
        )?;
        Ok(())
    }
}

impl Default for ManifestationEngine {
    fn default() -> Self {
        Self::new(Arc::new(FactorCatalog::builtin()), EngineConfig::default())
    }
}

impl fmt::Debug for ManifestationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestationEngine")
            .field("time", &self.store.current_time())
            .field("scene", &self.scene.as_ref().map(|s| &s.id))
            .field("active", &self.current.active_count())
            .field("counterforces", &self.counterforces)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ManifestationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ManifestationEngine(t={}, {}, valence={:.2})",
            self.store.current_time(),
            self.capabilities,
            self.current.net_valence()
        )
    }
}
