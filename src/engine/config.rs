//! Engine configuration: match defaults, catalog location and bot profiles.
//! Loaded from TOML at runtime by the command driver and the arena CLI.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::game::types::PlayerConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("unknown strategy type '{0}'")]
    UnknownStrategy(String),
}

/// Defaults applied when a caller starts a match without full seat configs.
#[derive(Debug, Deserialize, Clone)]
pub struct MatchDefaults {
    #[serde(default = "default_win_threshold")]
    pub win_threshold: i64,
    #[serde(default = "default_p1_genre")]
    pub p1_genre: String,
    #[serde(default = "default_p2_genre")]
    pub p2_genre: String,
}

fn default_win_threshold() -> i64 {
    3
}

fn default_p1_genre() -> String {
    "sci-fi".into()
}

fn default_p2_genre() -> String {
    "action".into()
}

impl Default for MatchDefaults {
    fn default() -> Self {
        Self {
            win_threshold: default_win_threshold(),
            p1_genre: default_p1_genre(),
            p2_genre: default_p2_genre(),
        }
    }
}

impl MatchDefaults {
    pub fn player_configs(&self, p1_name: &str, p2_name: &str) -> Vec<PlayerConfig> {
        vec![
            PlayerConfig::new(p1_name, self.p1_genre.as_str(), self.win_threshold),
            PlayerConfig::new(p2_name, self.p2_genre.as_str(), self.win_threshold),
        ]
    }
}

/// A named bot setup for the arena.
#[derive(Debug, Deserialize, Clone)]
pub struct BotProfile {
    pub description: Option<String>,
    #[serde(default = "default_strategy_type")]
    pub strategy_type: String,
    /// Probability of spending the ability on a turn where it is usable.
    pub ability_chance: Option<f64>,
}

fn default_strategy_type() -> String {
    "random".into()
}

impl BotProfile {
    pub fn effective_ability_chance(&self) -> f64 {
        self.ability_chance.unwrap_or(0.1).clamp(0.0, 1.0)
    }
}

/// Top-level TOML file structure.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineConfig {
    pub catalog: Option<PathBuf>,
    #[serde(default, rename = "match")]
    pub match_defaults: MatchDefaults,
    #[serde(default)]
    pub profiles: HashMap<String, BotProfile>,
}

impl EngineConfig {
    pub fn profile(&self, name: &str) -> Result<&BotProfile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }
}

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Try well-known paths, returning defaults if none is usable.
pub fn load_default_config() -> EngineConfig {
    let candidates = ["engine.toml", "../engine.toml", "/etc/cinelink/engine.toml"];
    for path in &candidates {
        let p = Path::new(path);
        if p.exists() {
            match load_config(p) {
                Ok(config) => {
                    tracing::info!(path = %p.display(), profiles = config.profiles.len(), "loaded engine config");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "failed to load engine config");
                }
            }
        }
    }
    tracing::info!("no engine.toml found, using built-in defaults");
    EngineConfig::default()
}
