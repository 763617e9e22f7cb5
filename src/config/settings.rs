//! Application settings configuration
//!
//! Defines the default keystore format and the logging level.

use crate::models::BundleFormat;
use crate::utils::ConfigError;
use serde::Deserialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Default location of the settings file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Keystore settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BundleSettings {
    /// Format used by `bundle` when neither `--jks` nor `--format` is given
    #[serde(default)]
    pub format: BundleFormat,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub bundle: BundleSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from the default config file
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_path = Path::new(DEFAULT_CONFIG_PATH);
        if config_path.exists() {
            Self::load_from_file(config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load settings from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        Self::from_toml(&content)
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        EnvFilter::try_new(&self.logging.level).map_err(|e| ConfigError::InvalidValue {
            key: "logging.level".to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bundle.format, BundleFormat::P12);
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings = Settings::from_toml("[bundle]\nformat = \"jks\"\n").unwrap();
        assert_eq!(settings.bundle.format, BundleFormat::Jks);
        assert_eq!(settings.logging.level, "warn");

        let empty = Settings::from_toml("").unwrap();
        assert_eq!(empty.bundle.format, BundleFormat::P12);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Settings::from_toml("[bundle]\nformat = \"zip\"\n"),
            Err(ConfigError::ParseError { .. })
        ));
        assert!(matches!(
            Settings::from_toml("[logging]\nlevel = \"fiel_convert=nope=1\"\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load_from_file("/nonexistent/fiel.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_shipped_default_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let settings = Settings::load_from_file(path).unwrap();
        assert_eq!(settings.bundle.format, BundleFormat::P12);
    }
}
