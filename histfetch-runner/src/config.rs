//! Serializable download configuration.
//!
//! Loaded from a TOML file; every section and field has a default, so a
//! missing file or a partial file is never an error at this layer.

use histfetch_core::data::{YahooSettings, DEFAULT_SUFFIXES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration for the downloader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub markets: MarketsConfig,
    pub provider: ProviderConfig,
    pub output: OutputConfig,
}

/// Exchange-suffix fallback order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketsConfig {
    /// Suffix variants tried per ticker, highest priority first.
    pub suffixes: Vec<String>,
}

/// HTTP client knobs for the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Where and how the output file is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            markets: MarketsConfig::default(),
            provider: ProviderConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for MarketsConfig {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let defaults = YahooSettings::default();
        Self {
            user_agent: defaults.user_agent,
            timeout_secs: defaults.timeout.as_secs(),
            max_retries: defaults.max_retries,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            file_prefix: "quotes".into(),
        }
    }
}

impl FetchConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

impl ProviderConfig {
    /// Translate into the fetcher's settings struct.
    pub fn yahoo_settings(&self) -> YahooSettings {
        YahooSettings {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            ..YahooSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_everything() {
        let config = FetchConfig::default();
        assert_eq!(config.markets.suffixes, vec![".NS", ".BO"]);
        assert_eq!(config.output.file_prefix, "quotes");
        assert!(config.provider.max_retries > 0);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config = FetchConfig::from_toml("").unwrap();
        assert_eq!(config, FetchConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = FetchConfig::from_toml(
            r#"
            [markets]
            suffixes = [".BO", ".NS"]

            [output]
            file_prefix = "history"
            "#,
        )
        .unwrap();
        assert_eq!(config.markets.suffixes, vec![".BO", ".NS"]);
        assert_eq!(config.output.file_prefix, "history");
        // untouched sections keep their defaults
        assert_eq!(config.provider, ProviderConfig::default());
        assert_eq!(config.output.dir, PathBuf::from("output"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = FetchConfig::from_toml("markets = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn provider_settings_translate() {
        let config = ProviderConfig {
            timeout_secs: 5,
            max_retries: 1,
            ..ProviderConfig::default()
        };
        let settings = config.yahoo_settings();
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.max_retries, 1);
    }
}
