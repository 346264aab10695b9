//! Session configuration

use serde::{Deserialize, Serialize};

use crate::difficulty::{DifficultyCurve, GameMode, Objective};
use crate::scoring::ScoreTable;
use crate::types::{BOARD_HEIGHT, BOARD_WIDTH};

/// Rules for one [`GameSession`](crate::GameSession)
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: u8,
    pub height: u8,
    pub mode: GameMode,
    /// Overrides the mode's default objective
    pub objective: Option<Objective>,
    pub curve: DifficultyCurve,
    pub scores: ScoreTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            mode: GameMode::default(),
            objective: None,
            curve: DifficultyCurve::default(),
            scores: ScoreTable::default(),
        }
    }
}

impl GameConfig {
    pub fn objective(&self) -> Objective {
        self.objective.unwrap_or_else(|| self.mode.default_objective())
    }

    pub fn max_level(&self) -> u32 {
        self.mode.max_level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: GameConfig =
            serde_json::from_str(r#"{"mode": "sprint", "curve": {"floor_ms": 50}}"#).unwrap();
        assert_eq!(cfg.mode, GameMode::Sprint);
        assert_eq!(cfg.curve.floor_ms, 50);
        assert_eq!(cfg.curve.base_interval_ms, 1000);
        assert_eq!(cfg.width, BOARD_WIDTH);
        assert_eq!(cfg.objective(), Objective::Lines(40));
    }

    #[test]
    fn explicit_objective_overrides_mode() {
        let cfg = GameConfig {
            objective: Some(Objective::Lines(12)),
            ..GameConfig::default()
        };
        assert_eq!(cfg.objective(), Objective::Lines(12));
    }
}
