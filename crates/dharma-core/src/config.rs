use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

/// Tuning for one character engine. Defaults are the reference constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub seed_bank: SeedBankConfig,
    pub capability: CapabilityConfig,
    pub manifest: ManifestConfig,
    pub pipeline: PipelineConfig,
    /// Seed of the per-engine sampling generator
    pub rng_seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedBankConfig {
    /// Scale applied to `delta * intensity` on every update
    pub learn_rate: f64,
    /// Extra gain when the update runs along the existing momentum
    pub momentum_gain: f64,
    /// EMA weight of the previous momentum (the new delta gets `1 - retention`)
    pub momentum_retention: f64,
    /// Per-tick geometric decay of momentum
    pub momentum_decay: f64,
    /// Weight of traits the caller did not initialise
    pub default_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    pub learn_rate: f64,
    /// Fraction of raw strength left while disrupted
    pub disruption_penalty: f64,
    /// Hysteresis margin for direction changes
    pub direction_margin: f64,
    pub default_strength: f64,
    pub default_stability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    pub seed_weight: f64,
    pub condition_weight: f64,
    pub particular_weight: f64,
    pub counter_weight: f64,
    /// Probability a general trait must exceed before its draw is attempted
    pub threshold: f64,
    pub counterforce_decay: f64,
    /// Live counterforces below this are dropped on tick
    pub counterforce_floor: f64,
    pub history_cap: usize,
    /// Entries kept after the history overflows `history_cap`
    pub history_keep: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub log_cap: usize,
    pub log_keep: usize,
    /// Number of most recent events the summary covers
    pub summary_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed_bank: SeedBankConfig::default(),
            capability: CapabilityConfig::default(),
            manifest: ManifestConfig::default(),
            pipeline: PipelineConfig::default(),
            rng_seed: 0,
        }
    }
}

impl Default for SeedBankConfig {
    fn default() -> Self {
        Self {
            learn_rate: 0.1,
            momentum_gain: 0.2,
            momentum_retention: 0.9,
            momentum_decay: 0.95,
            default_weight: 0.5,
        }
    }
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            learn_rate: 0.1,
            disruption_penalty: 0.2,
            direction_margin: 0.2,
            default_strength: 0.5,
            default_stability: 0.5,
        }
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            seed_weight: 2.0,
            condition_weight: 1.5,
            particular_weight: 0.8,
            counter_weight: 1.0,
            threshold: 0.4,
            counterforce_decay: 0.8,
            counterforce_floor: 0.1,
            history_cap: 100,
            history_keep: 50,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_cap: 1000,
            log_keep: 500,
            summary_window: 100,
        }
    }
}

impl EngineConfig {
    /// Default configuration with an explicit sampling seed.
    pub fn with_seed(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            ..Self::default()
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. User config file (if exists)
    /// 3. Default config file
    /// 4. Built-in defaults (lowest priority)
    pub fn load_layered(
        default_path: Option<&Path>,
        user_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = EngineConfig::default();

        if let Some(path) = default_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        }

        // Sections missing from the user file fall back to serde defaults,
        // so the user file replaces the whole config.
        if let Some(path) = user_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    /// Variables are prefixed with DHARMA_, e.g. DHARMA_MANIFEST_THRESHOLD=0.5
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        fn parse_into<T: std::str::FromStr>(key: &str, slot: &mut T) -> Result<(), ConfigError> {
            if let Ok(val) = std::env::var(key) {
                *slot = val
                    .parse()
                    .map_err(|_| ConfigError::Validation(format!("Invalid {}", key)))?;
            }
            Ok(())
        }

        parse_into("DHARMA_RNG_SEED", &mut self.rng_seed)?;

        parse_into("DHARMA_SEED_LEARN_RATE", &mut self.seed_bank.learn_rate)?;
        parse_into("DHARMA_SEED_MOMENTUM_DECAY", &mut self.seed_bank.momentum_decay)?;

        parse_into("DHARMA_CAPABILITY_LEARN_RATE", &mut self.capability.learn_rate)?;
        parse_into(
            "DHARMA_CAPABILITY_DIRECTION_MARGIN",
            &mut self.capability.direction_margin,
        )?;

        parse_into("DHARMA_MANIFEST_THRESHOLD", &mut self.manifest.threshold)?;
        parse_into(
            "DHARMA_MANIFEST_COUNTERFORCE_DECAY",
            &mut self.manifest.counterforce_decay,
        )?;
        parse_into("DHARMA_MANIFEST_HISTORY_CAP", &mut self.manifest.history_cap)?;

        parse_into("DHARMA_PIPELINE_LOG_CAP", &mut self.pipeline.log_cap)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn unit_open(name: &str, v: f64) -> Result<(), ConfigError> {
            if !(v > 0.0 && v <= 1.0) {
                return Err(ConfigError::Validation(format!("{} must be in (0, 1]", name)));
            }
            Ok(())
        }
        fn unit_closed(name: &str, v: f64) -> Result<(), ConfigError> {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::Validation(format!("{} must be in [0, 1]", name)));
            }
            Ok(())
        }

        // Seed bank
        let s = &self.seed_bank;
        if !(s.learn_rate > 0.0) {
            return Err(ConfigError::Validation(
                "seed_bank.learn_rate must be positive".to_string(),
            ));
        }
        if !(s.momentum_gain >= 0.0) {
            return Err(ConfigError::Validation(
                "seed_bank.momentum_gain must be non-negative".to_string(),
            ));
        }
        unit_closed("seed_bank.momentum_retention", s.momentum_retention)?;
        unit_open("seed_bank.momentum_decay", s.momentum_decay)?;
        unit_closed("seed_bank.default_weight", s.default_weight)?;

        // Capabilities
        let c = &self.capability;
        if !(c.learn_rate > 0.0) {
            return Err(ConfigError::Validation(
                "capability.learn_rate must be positive".to_string(),
            ));
        }
        unit_closed("capability.disruption_penalty", c.disruption_penalty)?;
        if !(c.direction_margin >= 0.0) {
            return Err(ConfigError::Validation(
                "capability.direction_margin must be non-negative".to_string(),
            ));
        }
        unit_closed("capability.default_strength", c.default_strength)?;
        unit_closed("capability.default_stability", c.default_stability)?;

        // Manifestation
        let m = &self.manifest;
        for (name, w) in [
            ("manifest.seed_weight", m.seed_weight),
            ("manifest.condition_weight", m.condition_weight),
            ("manifest.particular_weight", m.particular_weight),
            ("manifest.counter_weight", m.counter_weight),
        ] {
            if !(w.is_finite() && w >= 0.0) {
                return Err(ConfigError::Validation(format!(
                    "{} must be finite and non-negative",
                    name
                )));
            }
        }
        unit_closed("manifest.threshold", m.threshold)?;
        unit_open("manifest.counterforce_decay", m.counterforce_decay)?;
        unit_closed("manifest.counterforce_floor", m.counterforce_floor)?;
        if m.history_cap == 0 {
            return Err(ConfigError::Validation(
                "manifest.history_cap must be > 0".to_string(),
            ));
        }
        if m.history_keep == 0 || m.history_keep > m.history_cap {
            return Err(ConfigError::Validation(
                "manifest.history_keep must be in [1, history_cap]".to_string(),
            ));
        }

        // Pipeline
        let p = &self.pipeline;
        if p.log_cap == 0 {
            return Err(ConfigError::Validation(
                "pipeline.log_cap must be > 0".to_string(),
            ));
        }
        if p.log_keep == 0 || p.log_keep > p.log_cap {
            return Err(ConfigError::Validation(
                "pipeline.log_keep must be in [1, log_cap]".to_string(),
            ));
        }
        if p.summary_window == 0 {
            return Err(ConfigError::Validation(
                "pipeline.summary_window must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Export configuration to TOML string
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self.to_toml_string()?;
        fs::write(path, content)?;
        Ok(())
    }
}
