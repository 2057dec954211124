//! Configuration file loading and parsing.

use crate::env::{vars, Environment};
use crate::types::{CashConfig, CodecConfig, TierConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up inside the config directory.
pub const CONFIG_FILE_NAME: &str = "cash.yaml";

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given config directory.
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: config_dir.as_ref().to_path_buf(),
        }
    }

    /// Create a loader for `$CASH_CONFIG_PATH`, or the current directory.
    pub fn from_env() -> Self {
        match Environment::get(vars::CASH_CONFIG_PATH) {
            Some(dir) => Self::new(dir),
            None => Self::default(),
        }
    }

    /// Path of the config file this loader reads.
    pub fn config_path(&self) -> PathBuf {
        self.base_path.join(CONFIG_FILE_NAME)
    }

    /// Load `cash.yaml`, returning defaults when the file does not exist.
    pub fn load(&self) -> Result<CashConfig, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Ok(CashConfig::default());
        }

        self.load_file(&config_path)
    }

    /// Load an explicit config file.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<CashConfig, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        self.parse(&contents)
    }

    /// Parse YAML text, expanding environment variables first.
    pub fn parse(&self, contents: &str) -> Result<CashConfig, ConfigError> {
        let expanded = self.expand_env_vars(contents)?;

        let config: CashConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        self.validate(&config)?;
        Ok(config)
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let re = regex::Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").map_err(|e| {
            ConfigError::ParseError {
                line: None,
                message: e.to_string(),
            }
        })?;

        let mut result = String::with_capacity(content.len());
        let mut last = 0;
        for cap in re.captures_iter(content) {
            let Some(whole) = cap.get(0) else { continue };
            let var_name = &cap[1];
            let value = match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match cap.get(2) {
                    Some(default) => default.as_str().to_string(),
                    None => {
                        return Err(ConfigError::EnvVarNotFound {
                            var: var_name.to_string(),
                        })
                    }
                },
            };
            result.push_str(&content[last..whole.start()]);
            result.push_str(&value);
            last = whole.end();
        }
        result.push_str(&content[last..]);

        Ok(result)
    }

    /// Validate configuration values.
    pub fn validate(&self, config: &CashConfig) -> Result<(), ConfigError> {
        for (i, tier) in config.tiers.iter().enumerate() {
            match tier {
                TierConfig::Lru { size: 0 } => {
                    return Err(ConfigError::invalid(format!(
                        "tiers[{i}]: lru size must be greater than 0"
                    )));
                }
                TierConfig::Redis(redis) => {
                    if redis.url.trim().is_empty() {
                        return Err(ConfigError::invalid(format!(
                            "tiers[{i}]: redis url must not be empty"
                        )));
                    }
                    if redis.ttl_secs == Some(0) {
                        return Err(ConfigError::invalid(format!(
                            "tiers[{i}]: redis ttl_secs must be greater than 0"
                        )));
                    }
                }
                _ => {}
            }
        }

        for (i, codec) in config.codecs.iter().enumerate() {
            let in_range = match *codec {
                CodecConfig::Deflate { level } => level.map_or(true, |l| l <= 9),
                CodecConfig::Zstd { level } => level.map_or(true, |l| (1..=22).contains(&l)),
                CodecConfig::Lz4 { level } => level.map_or(true, |l| l <= 16),
            };
            if !in_range {
                return Err(ConfigError::invalid(format!(
                    "codecs[{i}]: {} level out of range",
                    codec.kind()
                )));
            }
        }

        Ok(())
    }

    /// Save configuration to `cash.yaml`.
    pub fn save(&self, config: &CashConfig) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.base_path)?;

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(self.config_path(), yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RedisTierConfig;
    use cash_test_utils::{assert_err, temp_dir};
    use std::fs;

    #[test]
    fn test_load_defaults_when_no_file() {
        let dir = temp_dir();
        let loader = ConfigLoader::new(dir.path());
        let config = loader.load().unwrap();
        assert!(config.tiers.is_empty());
        assert!(config.codecs.is_empty());
    }

    #[test]
    fn test_load_config_from_yaml_file() {
        let dir = temp_dir();
        let config_content = r#"
codecs:
  - kind: deflate
    level: 6
  - kind: lz4
tiers:
  - kind: lru
    size: 3
  - kind: map
  - kind: redis
    url: redis://127.0.0.1/
    ttl_secs: 60
"#;
        fs::write(dir.path().join(CONFIG_FILE_NAME), config_content).unwrap();

        let config = ConfigLoader::new(dir.path()).load().unwrap();

        assert_eq!(
            config.codecs,
            vec![
                CodecConfig::Deflate { level: Some(6) },
                CodecConfig::Lz4 { level: None },
            ]
        );
        assert_eq!(config.tiers.len(), 3);
        assert_eq!(config.tiers[0], TierConfig::Lru { size: 3 });
        assert_eq!(config.tiers[1], TierConfig::Map);
        match &config.tiers[2] {
            TierConfig::Redis(redis) => {
                assert_eq!(redis.url, "redis://127.0.0.1/");
                assert_eq!(redis.ttl_secs(), 60);
                assert_eq!(redis.key_prefix(), "cash:");
                assert!(redis.connect_timeout_ms.is_none());
            }
            other => panic!("expected redis tier, got {:?}", other),
        }
        assert_eq!(config.local_tier_count(), 2);
    }

    #[test]
    fn test_load_file_missing_is_error() {
        let dir = temp_dir();
        let loader = ConfigLoader::new(dir.path());
        match loader.load_file(dir.path().join("absent.yaml")) {
            Err(ConfigError::NotFound { path }) => assert!(path.ends_with("absent.yaml")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("CASH_TEST_VAR", "test_value");
        let loader = ConfigLoader::new(".");
        let result = loader.expand_env_vars("key: ${CASH_TEST_VAR}").unwrap();
        assert_eq!(result, "key: test_value");
        std::env::remove_var("CASH_TEST_VAR");
    }

    #[test]
    fn test_env_var_default() {
        let loader = ConfigLoader::new(".");
        let result = loader
            .expand_env_vars("url: ${CASH_NONEXISTENT:-redis://localhost/}")
            .unwrap();
        assert_eq!(result, "url: redis://localhost/");
    }

    #[test]
    fn test_env_var_missing_error() {
        let loader = ConfigLoader::new(".");
        match loader.expand_env_vars("key: ${CASH_MISSING_VAR}") {
            Err(ConfigError::EnvVarNotFound { var }) => assert_eq!(var, "CASH_MISSING_VAR"),
            other => panic!("Expected EnvVarNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_env_vars_in_single_value() {
        std::env::set_var("CASH_TEST_HOST", "cache");
        std::env::set_var("CASH_TEST_PORT", "6380");

        let loader = ConfigLoader::new(".");
        let result = loader
            .expand_env_vars("url: redis://${CASH_TEST_HOST}:${CASH_TEST_PORT}/")
            .unwrap();
        assert_eq!(result, "url: redis://cache:6380/");

        std::env::remove_var("CASH_TEST_HOST");
        std::env::remove_var("CASH_TEST_PORT");
    }

    #[test]
    fn test_env_var_expansion_in_config() {
        std::env::set_var("CASH_TEST_LRU_SIZE", "128");
        let loader = ConfigLoader::new(".");
        let config = loader
            .parse("tiers:\n  - kind: lru\n    size: ${CASH_TEST_LRU_SIZE}\n  - kind: redis\n    url: ${CASH_TEST_REDIS_URL:-redis://10.0.0.1/}\n")
            .unwrap();
        std::env::remove_var("CASH_TEST_LRU_SIZE");

        assert_eq!(config.tiers[0], TierConfig::Lru { size: 128 });
        assert_eq!(
            config.tiers[1],
            TierConfig::Redis(RedisTierConfig::new("redis://10.0.0.1/"))
        );
    }

    #[test]
    fn test_validation_errors() {
        let loader = ConfigLoader::new(".");

        let config = CashConfig {
            tiers: vec![TierConfig::Map, TierConfig::Lru { size: 0 }],
            ..Default::default()
        };
        match loader.validate(&config) {
            Err(ConfigError::ValidationError { message }) => {
                assert!(message.contains("tiers[1]"));
                assert!(message.contains("lru size"));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }

        let config = CashConfig {
            tiers: vec![TierConfig::Redis(RedisTierConfig::new("  "))],
            ..Default::default()
        };
        assert_err!(loader.validate(&config));

        let mut redis = RedisTierConfig::new("redis://127.0.0.1/");
        redis.ttl_secs = Some(0);
        let config = CashConfig {
            tiers: vec![TierConfig::Redis(redis)],
            ..Default::default()
        };
        assert_err!(loader.validate(&config));

        let config = CashConfig {
            codecs: vec![CodecConfig::Zstd { level: Some(0) }],
            ..Default::default()
        };
        match loader.validate(&config) {
            Err(ConfigError::ValidationError { message }) => assert!(message.contains("zstd")),
            other => panic!("Expected ValidationError, got {:?}", other),
        }

        let config = CashConfig {
            codecs: vec![CodecConfig::Deflate { level: Some(10) }],
            ..Default::default()
        };
        assert_err!(loader.validate(&config));
    }

    #[test]
    fn test_parse_error_with_line_number() {
        let loader = ConfigLoader::new(".");
        let bad_yaml = "\ntiers:\n  - kind: lru\n    size: [unclosed\n";
        match loader.parse(bad_yaml) {
            Err(ConfigError::ParseError { line, .. }) => assert!(line.is_some()),
            other => panic!("Expected ParseError with line number, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_tier_kind_is_parse_error() {
        let loader = ConfigLoader::new(".");
        let result = loader.parse("tiers:\n  - kind: memcached\n");
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_save_config() {
        let dir = temp_dir();
        let loader = ConfigLoader::new(dir.path().join("nested"));

        let mut redis = RedisTierConfig::new("redis://127.0.0.1/");
        redis.key_prefix = Some("app:".to_string());
        let config = CashConfig {
            codecs: vec![CodecConfig::Zstd { level: Some(3) }],
            tiers: vec![TierConfig::Lru { size: 16 }, TierConfig::Redis(redis)],
        };

        loader.save(&config).unwrap();
        assert!(loader.config_path().exists());

        let loaded = loader.load().unwrap();
        assert_eq!(loaded, config);
    }
}
