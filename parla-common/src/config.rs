//! Configuration loading and path resolution
//!
//! Paths resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: defaults are used and a warning is logged.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the session data root
pub const ENV_DATA_ROOT: &str = "PARLA_DATA_ROOT";
/// Environment variable overriding the roster root
pub const ENV_ROSTER_ROOT: &str = "PARLA_ROSTER_ROOT";
/// Environment variable overriding the shard output directory
pub const ENV_OUTPUT_DIR: &str = "PARLA_OUTPUT_DIR";

/// `<config_dir>/parla/config.toml`, when the platform has a config directory
static DEFAULT_CONFIG_PATH: Lazy<Option<PathBuf>> =
    Lazy::new(|| dirs::config_dir().map(|d| d.join("parla").join("config.toml")));

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Roll-call detection thresholds for the sub-speech splitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Minimum number of role-prefixed matches
    pub min_matches: usize,
    /// Mean matched-text length (characters) must stay below this
    pub max_mean_chars: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            min_matches: 5,
            max_mean_chars: 50,
        }
    }
}

/// Corpus merger settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Lines sampled when sniffing a file's content
    pub max_sample_lines: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_sample_lines: 20,
        }
    }
}

/// On-disk TOML configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub data_root: Option<PathBuf>,
    pub roster_root: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub markup_extension: Option<String>,
    pub logging: LoggingConfig,
    pub splitter: SplitterConfig,
    pub merge: MergeConfig,
}

/// Compiled fallbacks, relative to the working directory
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub data_root: PathBuf,
    pub roster_root: PathBuf,
    pub output_dir: PathBuf,
    pub markup_extension: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data/transcripts"),
            roster_root: PathBuf::from("data/deputies"),
            output_dir: PathBuf::from("output"),
            markup_extension: "html".to_string(),
        }
    }
}

/// Path values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub data_root: Option<PathBuf>,
    pub roster_root: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

/// Fully resolved configuration used by the pipeline
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub data_root: PathBuf,
    pub roster_root: PathBuf,
    pub output_dir: PathBuf,
    pub markup_extension: String,
    pub logging: LoggingConfig,
    pub splitter: SplitterConfig,
    pub merge: MergeConfig,
}

impl ResolvedConfig {
    /// Apply the CLI → ENV → TOML → default chain to every path setting
    pub fn resolve(overrides: &PathOverrides, toml: TomlConfig) -> Self {
        let defaults = CompiledDefaults::default();
        Self {
            data_root: resolve_path(
                overrides.data_root.as_deref(),
                ENV_DATA_ROOT,
                toml.data_root.as_deref(),
                &defaults.data_root,
            ),
            roster_root: resolve_path(
                overrides.roster_root.as_deref(),
                ENV_ROSTER_ROOT,
                toml.roster_root.as_deref(),
                &defaults.roster_root,
            ),
            output_dir: resolve_path(
                overrides.output_dir.as_deref(),
                ENV_OUTPUT_DIR,
                toml.output_dir.as_deref(),
                &defaults.output_dir,
            ),
            markup_extension: toml
                .markup_extension
                .map(|e| e.trim_start_matches('.').to_string())
                .unwrap_or(defaults.markup_extension),
            logging: toml.logging,
            splitter: toml.splitter,
            merge: toml.merge,
        }
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let defaults = CompiledDefaults::default();
        Self {
            data_root: defaults.data_root,
            roster_root: defaults.roster_root,
            output_dir: defaults.output_dir,
            markup_extension: defaults.markup_extension,
            logging: LoggingConfig::default(),
            splitter: SplitterConfig::default(),
            merge: MergeConfig::default(),
        }
    }
}

/// Resolve one path setting through the priority chain
pub fn resolve_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_value: Option<&Path>,
    default: &Path,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    // Priority 4: Compiled default
    default.to_path_buf()
}

/// Default config file location for the platform
pub fn default_config_path() -> Option<PathBuf> {
    DEFAULT_CONFIG_PATH.clone()
}

/// Load the TOML config.
///
/// An explicitly requested file must exist. When no path is given the platform
/// default is tried and its absence degrades to compiled defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::NotFound(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            Some(path) => {
                warn!(
                    path = %path.display(),
                    "No config file found, using compiled defaults"
                );
                return Ok(TomlConfig::default());
            }
            None => {
                warn!("Could not determine config directory, using compiled defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Parse TOML text into a config, validating threshold values
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    let config: TomlConfig = toml::from_str(content)?;
    if config.splitter.min_matches == 0 {
        return Err(Error::Config(
            "splitter.min_matches must be at least 1".to_string(),
        ));
    }
    if config.merge.max_sample_lines == 0 {
        return Err(Error::Config(
            "merge.max_sample_lines must be at least 1".to_string(),
        ));
    }
    Ok(config)
}
