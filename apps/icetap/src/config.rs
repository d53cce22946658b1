//! CLI configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use icetap_core::{DemuxOptions, TextEncoding};
use serde::Deserialize;

/// Configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Bytes between metadata frames. Takes precedence over `headers_file`.
    /// Override: `ICETAP_METAINT`
    pub metaint: Option<i64>,

    /// File holding the captured response headers (`Name: value` lines).
    /// Used to find `icy-metaint` when `metaint` is not set.
    pub headers_file: Option<PathBuf>,

    /// Encoding for metadata text that passes the UTF-8 scan.
    /// Override: `ICETAP_ENCODING`
    pub encoding: TextEncoding,

    /// Extract metadata at all. When false the input is copied unchanged.
    /// Override: `ICETAP_METADATA_ENABLED`
    pub metadata_enabled: bool,

    /// Print every `key=value` pair instead of only track changes.
    pub raw_pairs: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            metaint: None,
            headers_file: None,
            encoding: TextEncoding::Utf8,
            metadata_enabled: true,
            raw_pairs: false,
        }
    }
}

impl CliConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies overrides looked up by variable name.
    ///
    /// Values that do not parse are logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("ICETAP_METAINT") {
            match val.trim().parse() {
                Ok(metaint) => self.metaint = Some(metaint),
                Err(_) => log::warn!("Ignoring ICETAP_METAINT={}", val),
            }
        }

        if let Some(val) = lookup("ICETAP_ENCODING") {
            match val.parse() {
                Ok(encoding) => self.encoding = encoding,
                Err(e) => log::warn!("Ignoring ICETAP_ENCODING: {}", e),
            }
        }

        if let Some(val) = lookup("ICETAP_METADATA_ENABLED") {
            match val.trim().parse() {
                Ok(enabled) => self.metadata_enabled = enabled,
                Err(_) => log::warn!("Ignoring ICETAP_METADATA_ENABLED={}", val),
            }
        }
    }

    /// Converts to icetap-core's demux options.
    pub fn to_demux_options(&self) -> DemuxOptions {
        DemuxOptions {
            metadata_enabled: self.metadata_enabled,
            encoding: self.encoding,
        }
    }
}
