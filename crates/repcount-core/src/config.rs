use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::counter::{pushup, situp, squat};
use crate::landmarks::DEFAULT_VISIBILITY_THRESHOLD;
use crate::registry::SHARD_COUNT;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepcountConfig {
    pub landmarks: LandmarkConfig,
    pub pushup: PushupConfig,
    pub squat: SquatConfig,
    pub situp: SitupConfig,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkConfig {
    /// Minimum visibility for a joint to be usable (inclusive)
    pub visibility_threshold: f32,
}

/// Elbow-angle thresholds in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushupConfig {
    pub up_threshold: f32,
    pub down_threshold: f32,
    pub calories_per_rep: f64,
}

/// Knee-angle thresholds in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquatConfig {
    pub up_threshold: f32,
    pub down_threshold: f32,
    pub calories_per_rep: f64,
}

/// Hip-angle thresholds in degrees. Lying flat is the larger angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitupConfig {
    pub down_threshold: f32,
    pub up_threshold: f32,
    pub calories_per_rep: f64,
}

/// Eviction policy of the session registry. `None` disables the bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Entries untouched for longer than this are dropped by `evict_idle`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_ttl_secs: Option<u64>,
    /// Upper bound on tracked sessions, at least `SHARD_COUNT`. Each shard
    /// keeps `max_sessions / SHARD_COUNT` entries in LRU order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_sessions: Option<usize>,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
        }
    }
}

impl Default for PushupConfig {
    fn default() -> Self {
        Self {
            up_threshold: pushup::UP_THRESHOLD,
            down_threshold: pushup::DOWN_THRESHOLD,
            calories_per_rep: pushup::CALORIES_PER_REP,
        }
    }
}

impl Default for SquatConfig {
    fn default() -> Self {
        Self {
            up_threshold: squat::UP_THRESHOLD,
            down_threshold: squat::DOWN_THRESHOLD,
            calories_per_rep: squat::CALORIES_PER_REP,
        }
    }
}

impl Default for SitupConfig {
    fn default() -> Self {
        Self {
            down_threshold: situp::DOWN_THRESHOLD,
            up_threshold: situp::UP_THRESHOLD,
            calories_per_rep: situp::CALORIES_PER_REP,
        }
    }
}

impl RepcountConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: RepcountConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    /// Environment variables are prefixed with REPCOUNT_
    /// Example: REPCOUNT_PUSHUP_UP_THRESHOLD=75
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. User config file (if exists)
    /// 3. Default config file
    /// 4. Built-in defaults (lowest priority)
    ///
    /// A file layer replaces the previous one wholesale; sections it omits
    /// come from built-in defaults, not from the lower file.
    pub fn load_layered(
        default_path: Option<&Path>,
        user_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = RepcountConfig::default();

        if let Some(path) = default_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        }

        if let Some(path) = user_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        override_from_env(
            "REPCOUNT_VISIBILITY_THRESHOLD",
            &mut self.landmarks.visibility_threshold,
        )?;

        override_from_env("REPCOUNT_PUSHUP_UP_THRESHOLD", &mut self.pushup.up_threshold)?;
        override_from_env(
            "REPCOUNT_PUSHUP_DOWN_THRESHOLD",
            &mut self.pushup.down_threshold,
        )?;

        override_from_env("REPCOUNT_SQUAT_UP_THRESHOLD", &mut self.squat.up_threshold)?;
        override_from_env("REPCOUNT_SQUAT_DOWN_THRESHOLD", &mut self.squat.down_threshold)?;

        override_from_env("REPCOUNT_SITUP_UP_THRESHOLD", &mut self.situp.up_threshold)?;
        override_from_env("REPCOUNT_SITUP_DOWN_THRESHOLD", &mut self.situp.down_threshold)?;

        if let Some(ttl) = read_env("REPCOUNT_REGISTRY_IDLE_TTL_SECS")? {
            self.registry.idle_ttl_secs = Some(ttl);
        }
        if let Some(max) = read_env("REPCOUNT_REGISTRY_MAX_SESSIONS")? {
            self.registry.max_sessions = Some(max);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let visibility = self.landmarks.visibility_threshold;
        if !(0.0..=1.0).contains(&visibility) {
            return Err(ConfigError::Validation(
                "landmarks.visibility_threshold must be in [0, 1]".to_string(),
            ));
        }

        check_angle("pushup.up_threshold", self.pushup.up_threshold)?;
        check_angle("pushup.down_threshold", self.pushup.down_threshold)?;
        if self.pushup.up_threshold <= self.pushup.down_threshold {
            return Err(ConfigError::Validation(
                "pushup.up_threshold must be > down_threshold".to_string(),
            ));
        }
        check_calories("pushup.calories_per_rep", self.pushup.calories_per_rep)?;

        check_angle("squat.up_threshold", self.squat.up_threshold)?;
        check_angle("squat.down_threshold", self.squat.down_threshold)?;
        if self.squat.up_threshold <= self.squat.down_threshold {
            return Err(ConfigError::Validation(
                "squat.up_threshold must be > down_threshold".to_string(),
            ));
        }
        check_calories("squat.calories_per_rep", self.squat.calories_per_rep)?;

        check_angle("situp.up_threshold", self.situp.up_threshold)?;
        check_angle("situp.down_threshold", self.situp.down_threshold)?;
        if self.situp.down_threshold <= self.situp.up_threshold {
            return Err(ConfigError::Validation(
                "situp.down_threshold must be > up_threshold".to_string(),
            ));
        }
        check_calories("situp.calories_per_rep", self.situp.calories_per_rep)?;

        if let Some(max) = self.registry.max_sessions {
            if max < SHARD_COUNT {
                return Err(ConfigError::Validation(format!(
                    "registry.max_sessions must be >= {}",
                    SHARD_COUNT
                )));
            }
        }
        if self.registry.idle_ttl_secs == Some(0) {
            return Err(ConfigError::Validation(
                "registry.idle_ttl_secs must be > 0".to_string(),
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
        let content = self
            .to_toml_string()
            .map_err(|e| ConfigError::Validation(format!("TOML serialization error: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Parse `name` if it is set. Non-unicode values surface as `EnvVar`.
fn read_env<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Validation(format!("Invalid {}", name))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn override_from_env<T: FromStr>(name: &str, slot: &mut T) -> Result<(), ConfigError> {
    if let Some(val) = read_env(name)? {
        *slot = val;
    }
    Ok(())
}

fn check_angle(name: &str, degrees: f32) -> Result<(), ConfigError> {
    if !(degrees > 0.0 && degrees < 180.0) {
        return Err(ConfigError::Validation(format!(
            "{} must be in (0, 180)",
            name
        )));
    }
    Ok(())
}

fn check_calories(name: &str, per_rep: f64) -> Result<(), ConfigError> {
    if !(per_rep >= 0.0 && per_rep.is_finite()) {
        return Err(ConfigError::Validation(format!(
            "{} must be non-negative",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = RepcountConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pushup.up_threshold, 70.0);
        assert_eq!(config.squat.down_threshold, 100.0);
        assert_eq!(config.situp.down_threshold, 120.0);
        assert_eq!(config.registry.max_sessions, None);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[pushup]\nup_threshold = 75.0\n").unwrap();

        let config = RepcountConfig::from_file(file.path()).unwrap();
        assert_eq!(config.pushup.up_threshold, 75.0);
        assert_eq!(config.pushup.down_threshold, 55.0);
        assert_eq!(config.squat, SquatConfig::default());
        assert_eq!(config.landmarks.visibility_threshold, 0.5);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = RepcountConfig::default();
        config.pushup.down_threshold = 80.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = RepcountConfig::default();
        config.situp.up_threshold = 130.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let mut config = RepcountConfig::default();
        config.landmarks.visibility_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = RepcountConfig::default();
        config.squat.up_threshold = 180.0;
        assert!(config.validate().is_err());

        let mut config = RepcountConfig::default();
        config.situp.calories_per_rep = -0.1;
        assert!(config.validate().is_err());

        let mut config = RepcountConfig::default();
        config.registry.max_sessions = Some(0);
        assert!(config.validate().is_err());

        let mut config = RepcountConfig::default();
        config.registry.max_sessions = Some(4);
        match config.validate() {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("max_sessions"), "{}", msg),
            other => panic!("expected validation error, got {:?}", other),
        }
        config.registry.max_sessions = Some(SHARD_COUNT);
        assert!(config.validate().is_ok());

        let mut config = RepcountConfig::default();
        config.registry.idle_ttl_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_file_reports_validation() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[squat]\nup_threshold = 90.0\n").unwrap();

        let err = RepcountConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("squat.up_threshold"));
    }

    #[test]
    fn test_malformed_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[pushup\nup_threshold = ").unwrap();

        assert!(matches!(
            RepcountConfig::from_file(file.path()),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_layered_user_file_wins() {
        let mut defaults = NamedTempFile::new().unwrap();
        writeln!(defaults, "[landmarks]\nvisibility_threshold = 0.6\n").unwrap();
        let mut user = NamedTempFile::new().unwrap();
        writeln!(user, "[landmarks]\nvisibility_threshold = 0.7\n").unwrap();

        let config =
            RepcountConfig::load_layered(Some(defaults.path()), Some(user.path())).unwrap();
        assert_eq!(config.landmarks.visibility_threshold, 0.7);
    }

    #[test]
    fn test_layered_missing_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let config = RepcountConfig::load_layered(Some(&missing), None).unwrap();
        assert_eq!(config.situp, SitupConfig::default());
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("REPCOUNT_REGISTRY_MAX_SESSIONS", "128");
        let mut config = RepcountConfig::default();
        let result = config.apply_env_overrides();
        std::env::remove_var("REPCOUNT_REGISTRY_MAX_SESSIONS");

        result.unwrap();
        assert_eq!(config.registry.max_sessions, Some(128));
    }

    #[test]
    fn test_read_env_rejects_garbage() {
        std::env::set_var("REPCOUNT_TEST_GARBAGE_VALUE", "not-a-number");
        let result: Result<Option<f32>, _> = read_env("REPCOUNT_TEST_GARBAGE_VALUE");
        std::env::remove_var("REPCOUNT_TEST_GARBAGE_VALUE");

        assert!(matches!(result, Err(ConfigError::Validation(_))));
        let absent: Option<f32> = read_env("REPCOUNT_TEST_NEVER_SET").unwrap();
        assert!(absent.is_none());
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let mut config = RepcountConfig::default();
        config.squat.calories_per_rep = 0.4;
        config.registry.idle_ttl_secs = Some(600);

        let file = NamedTempFile::new().unwrap();
        config.save_to_file(file.path()).unwrap();
        let loaded = RepcountConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);

        let text = RepcountConfig::default().to_toml_string().unwrap();
        assert!(!text.contains("max_sessions"));
    }
}
