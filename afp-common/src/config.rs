//! Configuration loading and config file resolution
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `AFP_CONFIG` environment variable
//! 3. `<config_dir>/afp/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing file found through steps 2-3 is not fatal: a warning is logged and
//! compiled defaults are used. A file named explicitly on the command line must exist.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "AFP_CONFIG";

/// Root of the TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AfpConfig {
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
    pub extractors: ExtractorsConfig,
}

/// Tunables of the consensus pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sentences shorter than this (in characters, after trimming) are noise
    pub min_sentence_chars: usize,
    /// Vote threshold used when at least this many sources survive normalization
    pub supermajority_threshold: usize,
    /// Vote threshold used when fewer sources survive
    pub fallback_threshold: usize,
    /// Number of hex characters kept from the article id digest
    pub article_id_len: usize,
    /// Rendered in place of missing metadata values in the article id input
    pub missing_sentinel: String,
    /// Source whose sentence order drives reconstruction (default: smallest id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_source: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_sentence_chars: 20,
            supermajority_threshold: 3,
            fallback_threshold: 2,
            article_id_len: 16,
            missing_sentinel: "None".to_string(),
            reference_source: None,
        }
    }
}

impl PipelineConfig {
    /// Check value ranges
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.supermajority_threshold == 0 || self.fallback_threshold == 0 {
            return Err(Error::Config(
                "vote thresholds must be at least 1".to_string(),
            ));
        }
        if self.fallback_threshold > self.supermajority_threshold {
            return Err(Error::Config(format!(
                "fallback_threshold ({}) exceeds supermajority_threshold ({})",
                self.fallback_threshold, self.supermajority_threshold
            )));
        }
        if !(8..=64).contains(&self.article_id_len) {
            return Err(Error::Config(format!(
                "article_id_len must be within 8..=64, got {}",
                self.article_id_len
            )));
        }
        if self.missing_sentinel.is_empty() {
            return Err(Error::Config("missing_sentinel must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Logging configuration (overridden by `RUST_LOG` when set)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Built-in extractors run when no pre-computed extractions are supplied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorsConfig {
    pub enabled: Vec<String>,
}

impl Default for ExtractorsConfig {
    fn default() -> Self {
        Self {
            enabled: vec![
                "article_paragraphs".to_string(),
                "body_paragraphs".to_string(),
                "body_text".to_string(),
            ],
        }
    }
}

/// Get the platform config file path (`<config_dir>/afp/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("afp").join("config.toml"))
}

/// Resolve which config file to read, following the documented priority
///
/// Returns `None` when neither an override nor a platform config dir exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path()
}

/// Read and validate a config file
///
/// # Errors
/// Returns `Error::Io` if the file cannot be read and `Error::Config` if it
/// does not parse or fails validation
pub fn load_config(path: &Path) -> Result<AfpConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AfpConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.pipeline.validate()?;
    Ok(config)
}

/// Resolve and load configuration with graceful degradation
///
/// An explicit `cli_arg` must point at a readable file. Otherwise a missing
/// file yields compiled defaults.
pub fn load_or_default(cli_arg: Option<&Path>) -> Result<AfpConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        warn!("No config directory available, using compiled defaults");
        return Ok(AfpConfig::default());
    };

    if cli_arg.is_none() && !path.exists() {
        warn!(path = %path.display(), "Config file not found, using compiled defaults");
        return Ok(AfpConfig::default());
    }

    let config = load_config(&path)?;
    info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Write configuration as TOML, creating parent directories
///
/// Writes to a temporary sibling first and renames it into place.
pub fn write_config(config: &AfpConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
