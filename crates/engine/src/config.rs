//! Simulation configuration
//!
//! Defaults come from the shared constants. A JSON file named by
//! `FLOODLINE_CONFIG` replaces any subset of fields, and the individual
//! `FLOODLINE_*` variables override the file.

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use floodline_core::GameConfig;
use floodline_season::{DirectorConfig, PressureConfig};

use crate::types::TICK_MS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{name}={value:?} is not valid")]
    InvalidVar { name: &'static str, value: String },
    #[error("{field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u32,
    /// Campaign level the runner starts on
    pub level: u32,
    /// Identity written to the score history
    pub player: String,
    /// Where the file store keeps its blobs
    pub save_dir: PathBuf,
    /// Runner stops after this many ticks
    pub max_ticks: u64,
    pub tick_ms: u32,
    /// Board, scoring and curve rules; mode, objective and base interval
    /// are replaced per level
    pub game: GameConfig,
    pub pressure: PressureConfig,
    pub director: DirectorConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            level: 1,
            player: "player".to_string(),
            save_dir: PathBuf::from(".floodline"),
            max_ticks: 60 * 60 * 1000 / TICK_MS as u64,
            tick_ms: TICK_MS,
            game: GameConfig::default(),
            pressure: PressureConfig::default(),
            director: DirectorConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source; used by [`from_env`](Self::from_env)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let mut config = match var("FLOODLINE_CONFIG") {
            Some(path) => {
                let path = PathBuf::from(path);
                let json = fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Read { path, source })?;
                Self::from_json_str(&json)?
            }
            None => Self::default(),
        };

        if let Some(v) = var("FLOODLINE_SEED") {
            config.seed = parse("FLOODLINE_SEED", v)?;
        }
        if let Some(v) = var("FLOODLINE_LEVEL") {
            config.level = parse("FLOODLINE_LEVEL", v)?;
        }
        if let Some(v) = var("FLOODLINE_MAX_TICKS") {
            config.max_ticks = parse("FLOODLINE_MAX_TICKS", v)?;
        }
        if let Some(v) = var("FLOODLINE_PLAYER") {
            config.player = v;
        }
        if let Some(v) = var("FLOODLINE_SAVE_DIR") {
            config.save_dir = PathBuf::from(v);
        }

        config.tick_ms = config.tick_ms.max(1);
        config.validate()?;
        Ok(config)
    }

    /// Reject values the board and gauge cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };

        let p = &self.pressure;
        if !(p.max_level > 0.0 && p.max_level <= 1.0) {
            return invalid("pressure.max_level", "must be in (0, 1]");
        }
        if !(p.lower_per_line >= 0.0 && p.lower_per_line.is_finite()) {
            return invalid("pressure.lower_per_line", "must be a non-negative number");
        }
        if !(1..=127).contains(&self.game.width) {
            return invalid("game.width", "must be in 1..=127");
        }
        if !(1..=127).contains(&self.game.height) {
            return invalid("game.height", "must be in 1..=127");
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidVar { name, value })
}
