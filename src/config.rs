//! Application-level configuration loading for queue and match tuning.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "RINHA_QUEUE_CONFIG_PATH";

/// Number of players per block.
const DEFAULT_BLOCK_SIZE: usize = 5;
/// Full match duration in seconds (one hour).
const DEFAULT_MATCH_DURATION_SECS: i64 = 3600;
/// How often the clock checkpoints remaining time to the backend.
const DEFAULT_CHECKPOINT_INTERVAL_SECS: i64 = 30;
/// Floor applied when admins reduce a match's remaining time.
const DEFAULT_MIN_REMAINING_SECS: i64 = 300;
/// Punishment window applied to participants when a match ends.
const DEFAULT_END_PUNISHMENT_MINS: u64 = 10;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Players per block.
    pub block_size: usize,
    /// Initial countdown of a fresh match, in seconds.
    pub match_duration_secs: i64,
    /// Countdown checkpoint period, in seconds.
    pub checkpoint_interval_secs: i64,
    /// Minimum remaining time enforced by time extension, in seconds.
    pub min_remaining_secs: i64,
    /// Ban window applied on normal match termination, in minutes.
    pub end_punishment_mins: u64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults when the file is absent or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded queue configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Punishment window as a duration.
    pub fn end_punishment(&self) -> Duration {
        Duration::from_secs(self.end_punishment_mins * 60)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            match_duration_secs: DEFAULT_MATCH_DURATION_SECS,
            checkpoint_interval_secs: DEFAULT_CHECKPOINT_INTERVAL_SECS,
            min_remaining_secs: DEFAULT_MIN_REMAINING_SECS,
            end_punishment_mins: DEFAULT_END_PUNISHMENT_MINS,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file.
struct RawConfig {
    block_size: Option<usize>,
    match_duration_secs: Option<i64>,
    checkpoint_interval_secs: Option<i64>,
    min_remaining_secs: Option<i64>,
    end_punishment_mins: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            block_size: value.block_size.unwrap_or(defaults.block_size),
            match_duration_secs: value
                .match_duration_secs
                .unwrap_or(defaults.match_duration_secs),
            checkpoint_interval_secs: value
                .checkpoint_interval_secs
                .unwrap_or(defaults.checkpoint_interval_secs),
            min_remaining_secs: value
                .min_remaining_secs
                .unwrap_or(defaults.min_remaining_secs),
            end_punishment_mins: value
                .end_punishment_mins
                .unwrap_or(defaults.end_punishment_mins),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
