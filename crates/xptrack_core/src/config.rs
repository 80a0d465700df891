//! Tracker configuration.
//!
//! # Responsibility
//! - Describe leveling rules and logging settings in one TOML document.
//! - Fill every missing field with a default so an absent file is valid.
//!
//! # Invariants
//! - A loaded config always has a positive XP threshold.
//! - Unknown keys are rejected.
//!
//! Example:
//!
//! ```toml
//! [leveling]
//! threshold = 500
//! policy = "single_step"
//!
//! [logging]
//! level = "info"
//! dir = "/home/me/.local/state/xptrack/logs"
//! ```

use crate::leveling::{InvalidThreshold, LevelingRules};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    pub leveling: LevelingRules,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`; build-mode default when unset.
    pub level: Option<String>,
    /// Absolute directory for rolling log files. Logging stays off when unset.
    pub dir: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Toml(toml::de::Error),
    Leveling(InvalidThreshold),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Toml(err) => write!(f, "invalid config: {err}"),
            Self::Leveling(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Toml(err) => Some(err),
            Self::Leveling(err) => Some(err),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Toml(value)
    }
}

impl From<InvalidThreshold> for ConfigError {
    fn from(value: InvalidThreshold) -> Self {
        Self::Leveling(value)
    }
}

impl TrackerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.leveling.validate()?;
        Ok(config)
    }

    /// Reads a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, TrackerConfig};
    use crate::leveling::{LevelPolicy, DEFAULT_XP_THRESHOLD};

    #[test]
    fn empty_document_uses_defaults() {
        let config = TrackerConfig::from_toml_str("").unwrap();
        assert_eq!(config.leveling.threshold, DEFAULT_XP_THRESHOLD);
        assert_eq!(config.leveling.policy, LevelPolicy::SingleStep);
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn parses_leveling_and_logging_sections() {
        let config = TrackerConfig::from_toml_str(
            r#"
            [leveling]
            threshold = 300
            policy = "cascade"

            [logging]
            level = "debug"
            dir = "/tmp/xptrack-logs"
            "#,
        )
        .unwrap();
        assert_eq!(config.leveling.threshold, 300);
        assert_eq!(config.leveling.policy, LevelPolicy::Cascade);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn rejects_zero_threshold_and_unknown_keys() {
        let err = TrackerConfig::from_toml_str("[leveling]\nthreshold = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Leveling(_)));

        let err = TrackerConfig::from_toml_str("colour = \"blue\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrackerConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, TrackerConfig::default());
    }
}
