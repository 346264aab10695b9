//! Scoring module - points for line clears and drops
//!
//! Line clears earn a base value per simultaneous line count, multiplied by the
//! level. A four-line clear adds half its base as a bonus before the level
//! multiplication. An extra multiplier carries seasonal score modifiers.

use serde::{Deserialize, Serialize};

use crate::types::{HARD_DROP_POINTS, LINE_SCORES, SOFT_DROP_POINTS};

/// Configurable point values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTable {
    /// Base points indexed by lines cleared at once (index 0 unused)
    pub line_scores: [u32; 5],
    pub soft_drop_points: u32,
    pub hard_drop_points: u32,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            line_scores: LINE_SCORES,
            soft_drop_points: SOFT_DROP_POINTS,
            hard_drop_points: HARD_DROP_POINTS,
        }
    }
}

/// Score calculation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResult {
    /// Table value for the line count
    pub base: u64,
    /// Four-line bonus (half the base), zero otherwise
    pub bonus: u64,
    /// `(base + bonus) * level * multiplier`, rounded
    pub total: u64,
}

/// Calculate the score for clearing `lines` rows at once
///
/// Counts of 0 or more than 4 score nothing. A non-finite or negative
/// multiplier is treated as 1.0 and 0.0 respectively.
///
/// ```
/// use floodline_core::{calculate_score, ScoreTable};
///
/// let r = calculate_score(4, 2, &ScoreTable::default(), 1.0);
/// assert_eq!(r.total, 2400);
/// ```
pub fn calculate_score(lines: u32, level: u32, table: &ScoreTable, multiplier: f64) -> ScoreResult {
    if lines == 0 || lines > 4 {
        return ScoreResult::default();
    }

    let base = table.line_scores[lines as usize] as u64;
    let bonus = if lines == 4 { base / 2 } else { 0 };
    let multiplier = if multiplier.is_finite() {
        multiplier.max(0.0)
    } else {
        1.0
    };

    let raw = (base + bonus).saturating_mul(level.max(1) as u64);
    let total = (raw as f64 * multiplier).round() as u64;

    ScoreResult { base, bonus, total }
}

/// Calculate drop score
/// soft drop: `soft_drop_points` per row
/// hard drop: `hard_drop_points` per row
pub fn calculate_drop_score(rows: u32, is_hard_drop: bool, table: &ScoreTable) -> u64 {
    let per_row = if is_hard_drop {
        table.hard_drop_points
    } else {
        table.soft_drop_points
    };
    rows as u64 * per_row as u64
}
