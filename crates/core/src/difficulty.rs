//! Difficulty module - level progression, gravity speed and mode objectives

use serde::{Deserialize, Serialize};

use crate::types::{
    BASE_DROP_MS, DROP_DECAY_RATE, DROP_INTERVAL_FLOOR_MS, LINES_PER_LEVEL, STARTING_LEVEL,
};

/// Maps cumulative lines to a level, and a level to speed and score factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyCurve {
    pub lines_per_level: u32,
    pub starting_level: u32,
    /// Gravity interval at the starting level
    pub base_interval_ms: u32,
    /// Geometric factor applied per level above the first
    pub decay_rate: f64,
    pub floor_ms: u32,
    pub multiplier_base: f64,
    pub multiplier_increment: f64,
}

impl Default for DifficultyCurve {
    fn default() -> Self {
        Self {
            lines_per_level: LINES_PER_LEVEL,
            starting_level: STARTING_LEVEL,
            base_interval_ms: BASE_DROP_MS,
            decay_rate: DROP_DECAY_RATE,
            floor_ms: DROP_INTERVAL_FLOOR_MS,
            multiplier_base: 1.0,
            multiplier_increment: 0.1,
        }
    }
}

impl DifficultyCurve {
    /// Same curve with a different level-1 gravity interval
    pub fn with_base_interval(mut self, base_interval_ms: u32) -> Self {
        self.base_interval_ms = base_interval_ms;
        self
    }

    /// `floor(total_lines / lines_per_level) + starting_level`, capped at `max_level`
    pub fn level_for_lines(&self, total_lines: u32, max_level: u32) -> u32 {
        let per = self.lines_per_level.max(1);
        let level = total_lines / per + self.starting_level;
        level.min(max_level.max(self.starting_level))
    }

    /// `max(floor, base * decay^(level-1))`, rounded to whole milliseconds
    ///
    /// ```
    /// use floodline_core::DifficultyCurve;
    ///
    /// let curve = DifficultyCurve::default();
    /// assert_eq!(curve.drop_interval_ms(1), 1000);
    /// assert_eq!(curve.drop_interval_ms(2), 850);
    /// assert_eq!(curve.drop_interval_ms(50), 100);
    /// ```
    pub fn drop_interval_ms(&self, level: u32) -> u32 {
        let steps = level.saturating_sub(1).min(i32::MAX as u32) as i32;
        let interval = self.base_interval_ms as f64 * self.decay_rate.powi(steps);
        (interval.round() as u32).max(self.floor_ms)
    }

    /// `base + (level-1) * increment`
    pub fn score_multiplier(&self, level: u32) -> f64 {
        self.multiplier_base + level.saturating_sub(1) as f64 * self.multiplier_increment
    }
}

/// What a mode asks the player to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Lines(u32),
    Score(u64),
    SurviveMs(u64),
    None,
}

/// Counters an objective is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectiveProgress {
    pub lines: u32,
    pub score: u64,
    pub elapsed_ms: u64,
}

impl Objective {
    /// Fraction complete in [0, 1]; open-ended objectives report 0
    pub fn progress(&self, p: &ObjectiveProgress) -> f64 {
        let ratio = |have: f64, want: f64| {
            if want <= 0.0 {
                1.0
            } else {
                (have / want).clamp(0.0, 1.0)
            }
        };
        match *self {
            Objective::Lines(target) => ratio(p.lines as f64, target as f64),
            Objective::Score(target) => ratio(p.score as f64, target as f64),
            Objective::SurviveMs(target) => ratio(p.elapsed_ms as f64, target as f64),
            Objective::None => 0.0,
        }
    }

    pub fn is_complete(&self, p: &ObjectiveProgress) -> bool {
        match *self {
            Objective::Lines(target) => p.lines >= target,
            Objective::Score(target) => p.score >= target,
            Objective::SurviveMs(target) => p.elapsed_ms >= target,
            Objective::None => false,
        }
    }
}

/// Play modes and their defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Marathon,
    Sprint,
    ScoreAttack,
    Survival,
    #[default]
    Campaign,
    Endless,
}

impl GameMode {
    pub fn max_level(&self) -> u32 {
        match self {
            GameMode::Marathon => 15,
            GameMode::Sprint => 1,
            GameMode::ScoreAttack => 20,
            GameMode::Survival => 30,
            GameMode::Campaign => 20,
            GameMode::Endless => 99,
        }
    }

    /// Default objective; campaign levels supply their own line target
    pub fn default_objective(&self) -> Objective {
        match self {
            GameMode::Marathon => Objective::Lines(150),
            GameMode::Sprint => Objective::Lines(40),
            GameMode::ScoreAttack => Objective::Score(100_000),
            GameMode::Survival => Objective::SurviveMs(180_000),
            GameMode::Campaign | GameMode::Endless => Objective::None,
        }
    }

    /// Whether the curve's score multiplier applies to line clears
    pub fn scales_score(&self) -> bool {
        matches!(self, GameMode::Endless)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_follows_lines_and_clamps() {
        let c = DifficultyCurve::default();
        assert_eq!(c.level_for_lines(0, 20), 1);
        assert_eq!(c.level_for_lines(9, 20), 1);
        assert_eq!(c.level_for_lines(10, 20), 2);
        assert_eq!(c.level_for_lines(1000, 20), 20);
        assert_eq!(c.level_for_lines(1000, GameMode::Sprint.max_level()), 1);
    }

    #[test]
    fn drop_interval_decays_to_floor() {
        let c = DifficultyCurve::default();
        let mut last = c.drop_interval_ms(1);
        for level in 2..40 {
            let next = c.drop_interval_ms(level);
            assert!(next <= last);
            assert!(next >= c.floor_ms);
            last = next;
        }
        assert_eq!(c.drop_interval_ms(u32::MAX), c.floor_ms);
    }

    #[test]
    fn score_multiplier_grows_linearly() {
        let c = DifficultyCurve::default();
        assert!((c.score_multiplier(1) - 1.0).abs() < 1e-9);
        assert!((c.score_multiplier(6) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn objectives_report_progress() {
        let p = ObjectiveProgress {
            lines: 20,
            score: 5_000,
            elapsed_ms: 90_000,
        };
        assert!((Objective::Lines(40).progress(&p) - 0.5).abs() < 1e-9);
        assert!(!Objective::Lines(40).is_complete(&p));
        assert!(Objective::Lines(20).is_complete(&p));
        assert_eq!(Objective::Score(1_000).progress(&p), 1.0);
        assert!((Objective::SurviveMs(180_000).progress(&p) - 0.5).abs() < 1e-9);
        assert_eq!(Objective::None.progress(&p), 0.0);
        assert!(!Objective::None.is_complete(&p));
    }
}
