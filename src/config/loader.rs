//! Configuration file loading with precedence handling.

use crate::state::RefreshMode;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// Refresh mode as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshModeSetting {
    /// Adapt from the moving-average render duration.
    Auto,
    /// Always render when stale.
    Continuous,
    /// Wait for a quiet tick while typing.
    Delayed,
}

impl RefreshModeSetting {
    /// The pinned mode, or `None` for adaptive behavior.
    pub fn pinned(self) -> Option<RefreshMode> {
        match self {
            RefreshModeSetting::Auto => None,
            RefreshModeSetting::Continuous => Some(RefreshMode::Continuous),
            RefreshModeSetting::Delayed => Some(RefreshMode::Delayed),
        }
    }
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/pvsync/config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Local render tick interval in milliseconds.
    #[serde(default)]
    pub refresh_interval_ms: Option<u64>,

    /// Secondary render tick interval in milliseconds.
    #[serde(default)]
    pub secondary_interval_ms: Option<u64>,

    /// Busy-indicator visibility delay in milliseconds.
    #[serde(default)]
    pub spinner_delay_ms: Option<u64>,

    /// Scroll animation duration in milliseconds.
    #[serde(default)]
    pub scroll_duration_ms: Option<u64>,

    /// Preview layout width in columns.
    #[serde(default)]
    pub preview_width: Option<u16>,

    /// Preview viewport height in layout lines.
    #[serde(default)]
    pub preview_height: Option<u64>,

    /// Editor soft-wrap column (wrapping off when absent).
    #[serde(default)]
    pub wrap_column: Option<u16>,

    /// Refresh mode: "auto", "continuous" or "delayed".
    #[serde(default)]
    pub refresh_mode: Option<RefreshModeSetting>,

    /// Secondary renderer command line.
    #[serde(default)]
    pub secondary_command: Option<String>,

    /// Path the rendered preview is written to.
    #[serde(default)]
    pub preview_path: Option<PathBuf>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Local render tick interval in milliseconds.
    pub refresh_interval_ms: u64,
    /// Secondary render tick interval in milliseconds.
    pub secondary_interval_ms: u64,
    /// Busy-indicator visibility delay in milliseconds.
    pub spinner_delay_ms: u64,
    /// Scroll animation duration in milliseconds.
    pub scroll_duration_ms: u64,
    /// Preview layout width in columns.
    pub preview_width: u16,
    /// Preview viewport height in layout lines.
    pub preview_height: u64,
    /// Editor soft-wrap column (wrapping off when absent).
    pub wrap_column: Option<u16>,
    /// Pinned refresh mode (`None` = adaptive).
    pub pinned_mode: Option<RefreshMode>,
    /// Secondary renderer command line, if configured.
    pub secondary_command: Option<String>,
    /// Preview output path; defaults beside the source document when absent.
    pub preview_path: Option<PathBuf>,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 500,
            secondary_interval_ms: 2500,
            spinner_delay_ms: 750,
            scroll_duration_ms: 500,
            preview_width: 80,
            preview_height: 40,
            wrap_column: None,
            pinned_mode: None,
            secondary_command: None,
            preview_path: None,
            log_file_path: default_log_path(),
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/pvsync/pvsync.log` on Unix-like systems, or the
/// platform equivalent elsewhere. Falls back to the current directory when
/// no state directory can be determined.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("pvsync").join("pvsync.log")
    } else {
        PathBuf::from("pvsync.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
/// Returns `Err` if file exists but cannot be read or parsed.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/pvsync/config.toml` on Unix, appropriate path on
/// other platforms. Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pvsync").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (like CLI `--config`)
/// 2. `PVSYNC_CONFIG` environment variable
/// 3. Default path `~/.config/pvsync/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var("PVSYNC_CONFIG") {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use
/// the default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        refresh_interval_ms: config
            .refresh_interval_ms
            .unwrap_or(defaults.refresh_interval_ms),
        secondary_interval_ms: config
            .secondary_interval_ms
            .unwrap_or(defaults.secondary_interval_ms),
        spinner_delay_ms: config.spinner_delay_ms.unwrap_or(defaults.spinner_delay_ms),
        scroll_duration_ms: config
            .scroll_duration_ms
            .unwrap_or(defaults.scroll_duration_ms),
        preview_width: config.preview_width.unwrap_or(defaults.preview_width),
        preview_height: config.preview_height.unwrap_or(defaults.preview_height),
        wrap_column: config.wrap_column.or(defaults.wrap_column),
        pinned_mode: config
            .refresh_mode
            .map(RefreshModeSetting::pinned)
            .unwrap_or(defaults.pinned_mode),
        secondary_command: config.secondary_command.or(defaults.secondary_command),
        preview_path: config.preview_path.or(defaults.preview_path),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `PVSYNC_PREVIEW_WIDTH`: override preview width
/// - `PVSYNC_SECONDARY`: override the secondary command
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(width) = std::env::var("PVSYNC_PREVIEW_WIDTH") {
        if let Ok(width) = width.parse() {
            config.preview_width = width;
        }
    }
    if let Ok(command) = std::env::var("PVSYNC_SECONDARY") {
        config.secondary_command = Some(command);
    }
    config
}

/// CLI overrides for [`apply_cli_overrides`]; only set fields apply.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `--interval-ms`
    pub refresh_interval_ms: Option<u64>,
    /// `--secondary-cmd`
    pub secondary_command: Option<String>,
    /// `--no-secondary`
    pub disable_secondary: bool,
    /// `--out`
    pub preview_path: Option<PathBuf>,
    /// `--wrap-column`
    pub wrap_column: Option<u16>,
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(mut config: ResolvedConfig, overrides: CliOverrides) -> ResolvedConfig {
    if let Some(interval) = overrides.refresh_interval_ms {
        config.refresh_interval_ms = interval;
    }
    if let Some(command) = overrides.secondary_command {
        config.secondary_command = Some(command);
    }
    if overrides.disable_secondary {
        config.secondary_command = None;
    }
    if let Some(path) = overrides.preview_path {
        config.preview_path = Some(path);
    }
    if let Some(column) = overrides.wrap_column {
        config.wrap_column = Some(column);
    }
    config
}

// ===== Tests =====

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
