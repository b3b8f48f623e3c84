//! Dharma core: mental-factor simulation for one character.
//!
//! A character is a single-threaded, tick-driven state machine:
//! latent seeds ripen into active traits under a scene, neutral capability
//! gauges take their polarity from whatever accompanies them, and actions
//! perfume the seeds for the next tick.
//!
//! # Layers
//! - [`seed_bank`]: weights and momentum per trait
//! - [`capability`]: five direction-less gauges with disruption
//! - [`pipeline`]: attention, contact, feeling, labeling, volition
//! - [`engine`]: sampling, actions, counterforces, review
//! - [`patterns`]: named capability/trait combinations
//!
//! The static tables ([`catalog`], [`scene`], [`action`], [`archetype`]) are
//! plain data injected at construction; nothing reads a global.

#![allow(clippy::new_without_default)]
#![allow(clippy::len_without_is_empty)]

pub mod action;
pub mod archetype;
pub mod capability;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod manifestation;
pub mod patterns;
pub mod pipeline;
pub mod scene;
pub mod seed_bank;
pub mod status;

#[cfg(test)]
pub mod tests_config;
#[cfg(test)]
pub mod tests_determinism;
#[cfg(test)]
pub mod tests_proptest;

// ============================================================================
// CURATED PUBLIC API EXPORTS
// ============================================================================

// Static tables
pub use action::{ActionDef, ActionOutcome, ActionTable};
pub use archetype::Archetype;
pub use catalog::{FactorCatalog, FactorCategory, FactorDef};
pub use scene::{Scene, SceneLibrary};

// Core components
pub use capability::{Capability, CapabilityGauge, CapabilitySystem, Direction};
pub use manifestation::{sigmoid, ActivationInputs, ManifestationState, StrengthMap};
pub use patterns::{detect_patterns, PatternDef, PatternLibrary};
pub use pipeline::{
    EventSummary, FeelingTone, MentalEvent, PipelineContext, StimulusPipeline, VolitionDirection,
};
pub use seed_bank::{Seed, SeedRecord, StoreSnapshot, TraitStore};

// Orchestration
pub use engine::{IndeterminateState, ManifestationEngine};
pub use status::{CapabilityStatus, EngineStatus, TraitLevel};

// Configuration
pub use config::{
    CapabilityConfig, EngineConfig, ManifestConfig, PipelineConfig, SeedBankConfig,
};

// Errors
pub use error::{ActionError, CatalogError, ConfigError, PersistError, PersistResult};
