//! Application-level configuration loading, including the runtime penalty catalog.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::penalty::PenaltyCatalog;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TENNIS_RELAY_CONFIG_PATH";

const DEFAULT_PREP_SECONDS: u32 = 90;
const DEFAULT_GAME_SECONDS: u32 = 120;
const DEFAULT_SAVE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SCORES_DIR: &str = "scores";
const DEFAULT_MAX_TABLES: usize = 64;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    prep_seconds: u32,
    game_seconds: u32,
    save_timeout: Duration,
    scores_dir: PathBuf,
    max_tables: usize,
    penalties: PenaltyCatalog,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        Self::load_from(&resolve_config_path())
    }

    /// Load the configuration stored at `path`, falling back to built-in defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        penalties = app_config.penalties.len(),
                        "loaded relay configuration"
                    );
                    app_config
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

    /// Length of the preparation countdown.
    pub fn prep_seconds(&self) -> u32 {
        self.prep_seconds
    }

    /// Length of the game countdown.
    pub fn game_seconds(&self) -> u32 {
        self.game_seconds
    }

    /// How long a save may stay unanswered before it counts as failed.
    pub fn save_timeout(&self) -> Duration {
        self.save_timeout
    }

    /// Directory used by the file-backed match store.
    pub fn scores_dir(&self) -> &Path {
        &self.scores_dir
    }

    /// How many tables the relay caches scores and opens SSE streams for.
    pub fn max_tables(&self) -> usize {
        self.max_tables
    }

    /// The single penalty catalog shared by validation, scoring and labels.
    pub fn penalties(&self) -> &PenaltyCatalog {
        &self.penalties
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prep_seconds: DEFAULT_PREP_SECONDS,
            game_seconds: DEFAULT_GAME_SECONDS,
            save_timeout: Duration::from_millis(DEFAULT_SAVE_TIMEOUT_MS),
            scores_dir: PathBuf::from(DEFAULT_SCORES_DIR),
            max_tables: DEFAULT_MAX_TABLES,
            penalties: PenaltyCatalog::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default = "default_prep_seconds")]
    prep_seconds: u32,
    #[serde(default = "default_game_seconds")]
    game_seconds: u32,
    #[serde(default = "default_save_timeout_ms")]
    save_timeout_ms: u64,
    #[serde(default = "default_scores_dir")]
    scores_dir: PathBuf,
    #[serde(default = "default_max_tables")]
    max_tables: usize,
    #[serde(default)]
    penalties: Option<Vec<RawPenalty>>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single catalog entry.
struct RawPenalty {
    code: String,
    label: String,
    delta: i32,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let penalties = match value.penalties {
            Some(entries) => PenaltyCatalog::from_entries(
                entries
                    .into_iter()
                    .map(|entry| (entry.code, entry.label, entry.delta)),
            )
            .unwrap_or_else(|err| {
                warn!(error = %err, "invalid penalty catalog in config; using defaults");
                PenaltyCatalog::default()
            }),
            None => PenaltyCatalog::default(),
        };

        Self {
            prep_seconds: value.prep_seconds,
            game_seconds: value.game_seconds,
            save_timeout: Duration::from_millis(value.save_timeout_ms),
            scores_dir: value.scores_dir,
            max_tables: value.max_tables.max(1),
            penalties,
        }
    }
}

fn default_prep_seconds() -> u32 {
    DEFAULT_PREP_SECONDS
}

fn default_game_seconds() -> u32 {
    DEFAULT_GAME_SECONDS
}

fn default_save_timeout_ms() -> u64 {
    DEFAULT_SAVE_TIMEOUT_MS
}

fn default_scores_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SCORES_DIR)
}

fn default_max_tables() -> usize {
    DEFAULT_MAX_TABLES
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
