#[cfg(test)]
mod tests {
    use crate::config::*;
    use std::env;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Tests that read or write DHARMA_* variables hold this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.manifest.threshold, 0.4);
        assert_eq!(config.seed_bank.momentum_decay, 0.95);
        assert_eq!(config.capability.direction_margin, 0.2);
        assert_eq!(config.pipeline.log_cap, 1000);
    }

    #[test]
    fn test_config_validation_seed_bank() {
        let mut config = EngineConfig::default();

        config.seed_bank.learn_rate = 0.0;
        assert!(config.validate().is_err());

        config.seed_bank.learn_rate = 0.1;
        config.seed_bank.momentum_decay = 1.5;
        assert!(config.validate().is_err());

        config.seed_bank.momentum_decay = 0.0;
        assert!(config.validate().is_err());

        config.seed_bank.momentum_decay = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_manifest() {
        let mut config = EngineConfig::default();

        config.manifest.threshold = 1.2;
        assert!(config.validate().is_err());

        config.manifest.threshold = 0.4;
        config.manifest.history_keep = config.manifest.history_cap + 1;
        assert!(config.validate().is_err());

        config.manifest.history_keep = 50;
        config.manifest.seed_weight = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_pipeline() {
        let mut config = EngineConfig::default();
        config.pipeline.log_cap = 0;
        assert!(config.validate().is_err());

        config.pipeline.log_cap = 10;
        config.pipeline.log_keep = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_to_toml_string() {
        let toml_str = EngineConfig::default().to_toml_string().unwrap();

        assert!(toml_str.contains("[seed_bank]"));
        assert!(toml_str.contains("[manifest]"));
        assert!(toml_str.contains("counterforce_decay"));
        assert!(toml_str.contains("rng_seed"));
    }

    #[test]
    fn test_config_from_toml_string() {
        let toml_str = r#"
            rng_seed = 42

            [seed_bank]
            learn_rate = 0.2

            [manifest]
            threshold = 0.5
            history_cap = 20
            history_keep = 10
        "#;

        let config = EngineConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.rng_seed, 42);
        assert_eq!(config.seed_bank.learn_rate, 0.2);
        // untouched fields keep defaults
        assert_eq!(config.seed_bank.momentum_gain, 0.2);
        assert_eq!(config.manifest.threshold, 0.5);
        assert_eq!(config.manifest.counterforce_floor, 0.1);
        assert_eq!(config.pipeline, PipelineConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_invalid_values() {
        let result = EngineConfig::from_toml_str("[manifest]\nthreshold = -1.0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_config_save_and_load() {
        let mut config = EngineConfig::with_seed(9);
        config.capability.learn_rate = 0.05;

        let temp_file = NamedTempFile::new().unwrap();
        config.save_to_file(temp_file.path()).unwrap();
        let loaded = EngineConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config, loaded);
    }

    #[test]
    fn test_config_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        env::set_var("DHARMA_MANIFEST_THRESHOLD", "0.55");
        env::set_var("DHARMA_RNG_SEED", "1234");
        env::set_var("DHARMA_PIPELINE_LOG_CAP", "50");

        let mut config = EngineConfig::default();
        let result = config.apply_env_overrides();

        env::remove_var("DHARMA_MANIFEST_THRESHOLD");
        env::remove_var("DHARMA_RNG_SEED");
        env::remove_var("DHARMA_PIPELINE_LOG_CAP");

        result.unwrap();
        assert_eq!(config.manifest.threshold, 0.55);
        assert_eq!(config.rng_seed, 1234);
        assert_eq!(config.pipeline.log_cap, 50);
    }

    #[test]
    fn test_invalid_env_var_handling() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        env::set_var("DHARMA_SEED_LEARN_RATE", "invalid");

        let mut config = EngineConfig::default();
        let result = config.apply_env_overrides();
        env::remove_var("DHARMA_SEED_LEARN_RATE");

        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_config_layered_loading() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let default_file = NamedTempFile::new().unwrap();
        let user_file = NamedTempFile::new().unwrap();

        EngineConfig::default()
            .save_to_file(default_file.path())
            .unwrap();

        let mut user = EngineConfig::default();
        user.manifest.counterforce_decay = 0.7;
        user.seed_bank.momentum_gain = 0.3;
        user.save_to_file(user_file.path()).unwrap();

        let loaded =
            EngineConfig::load_layered(Some(default_file.path()), Some(user_file.path())).unwrap();
        assert_eq!(loaded.manifest.counterforce_decay, 0.7);
        assert_eq!(loaded.seed_bank.momentum_gain, 0.3);

        // missing files fall through to defaults
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let loaded = EngineConfig::load_layered(Some(&missing), None).unwrap();
        assert_eq!(loaded, EngineConfig::default());
    }

    #[test]
    fn test_config_file_not_found() {
        let result = EngineConfig::from_file("nonexistent.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_invalid_toml_syntax() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "invalid toml: syntax").unwrap();

        let result = EngineConfig::from_file(temp_file.path());
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_config_roundtrip() {
        let original = EngineConfig::default();
        let toml_str = original.to_toml_string().unwrap();
        let roundtrip: EngineConfig = toml::from_str(&toml_str).unwrap();

        assert!(roundtrip.validate().is_ok());
        assert_eq!(original, roundtrip);
    }
}
