//! Placement planner - pick a landing spot and steer the piece there
//!
//! [`best_placement`] tries every reachable rotation and column for the
//! falling piece, drops it, and scores the resulting board. [`apply_place`]
//! turns a chosen target into rotations, sideways moves and a hard drop.

use thiserror::Error;

use floodline_core::{controller, Board, GameSession, Piece};

use crate::types::Rotation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaceError {
    #[error("could not rotate to target rotation")]
    RotationBlocked,
    #[error("target x would place piece out of bounds")]
    XOutOfBounds,
    #[error("could not move to target x due to collision")]
    XBlocked,
    #[error("game is not playable")]
    NotPlayable,
    #[error("no active piece")]
    NoActive,
}

/// A candidate landing spot and its evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: i8,
    pub rotation: Rotation,
    /// Row the piece origin comes to rest on
    pub landing_y: i8,
    pub lines: u32,
    pub score: f64,
}

/// Heuristic weights for a resting board
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub aggregate_height: f64,
    pub lines: f64,
    pub holes: f64,
    pub bumpiness: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            aggregate_height: -0.51,
            lines: 0.76,
            holes: -0.36,
            bumpiness: -0.18,
        }
    }
}

/// Empty cells with a filled cell somewhere above them
pub fn count_holes(board: &Board) -> u32 {
    let mut holes = 0;
    for x in 0..board.width() as i8 {
        let mut covered = false;
        for y in 0..board.height() as i8 {
            if board.is_occupied(x, y) {
                covered = true;
            } else if covered {
                holes += 1;
            }
        }
    }
    holes
}

/// Weighted score of a board after `lines` were cleared to reach it
pub fn evaluate(board: &Board, lines: u32, weights: &Weights) -> f64 {
    let heights = board.column_heights();
    let aggregate: u32 = heights.iter().sum();
    let bumpiness: u32 = heights.windows(2).map(|w| w[0].abs_diff(w[1])).sum();
    weights.aggregate_height * aggregate as f64
        + weights.lines * lines as f64
        + weights.holes * count_holes(board) as f64
        + weights.bumpiness * bumpiness as f64
}

/// Best landing for `piece` on `board` with the default weights
pub fn best_placement(board: &Board, piece: &Piece) -> Option<Placement> {
    best_placement_with(board, piece, &Weights::default())
}

pub fn best_placement_with(board: &Board, piece: &Piece, weights: &Weights) -> Option<Placement> {
    let mut best: Option<Placement> = None;
    let mut oriented = piece.clone();

    for turn in 0..4 {
        if turn > 0 {
            match controller::rotate(board, &oriented, true) {
                Some(p) => oriented = p,
                None => break,
            }
        }

        let min_dx = oriented.shape.minos().map(|(dx, _)| dx).min().unwrap_or(0);
        let max_dx = oriented.shape.minos().map(|(dx, _)| dx).max().unwrap_or(0);
        for x in -min_dx..(board.width() as i8 - max_dx) {
            let candidate = oriented.clone().at(x, oriented.y);
            if board.collides(&candidate, 0, 0) {
                continue;
            }
            let (landed, _) = controller::hard_drop(board, &candidate);
            let mut after = board.clone();
            after.lock_piece(&landed);
            let lines = after.clear_full_rows().len() as u32;
            let score = evaluate(&after, lines, weights);

            if best.map_or(true, |b| score > b.score) {
                best = Some(Placement {
                    x,
                    rotation: landed.rotation,
                    landing_y: landed.y,
                    lines,
                    score,
                });
            }
        }
    }
    best
}

fn is_playable(session: &GameSession) -> bool {
    session.started() && !session.is_paused() && !session.is_game_over()
}

/// Rotate to `target_rot`, shift to `target_x` and hard drop
///
/// Returns the hard-drop distance. On error the session is left as it was.
pub fn apply_place(
    session: &mut GameSession,
    target_x: i8,
    target_rot: Rotation,
) -> Result<u32, PlaceError> {
    if !is_playable(session) {
        return Err(PlaceError::NotPlayable);
    }
    let Some(active0) = session.current_piece() else {
        return Err(PlaceError::NoActive);
    };

    let cur = active0.rotation.index() as i8;
    let tgt = target_rot.index() as i8;
    let cw = (tgt - cur).rem_euclid(4) as u8;
    let ccw = (cur - tgt).rem_euclid(4) as u8;

    // Shorter direction first; for a half turn both are 2.
    let mut plans = [(true, cw), (false, ccw)];
    if plans[1].1 < plans[0].1 {
        plans.swap(0, 1);
    }

    let snapshot = session.clone();
    let mut rotated = false;
    for (is_cw, steps) in plans {
        *session = snapshot.clone();
        if (0..steps).all(|_| session.rotate_piece(is_cw)) {
            rotated = true;
            break;
        }
    }
    if !rotated {
        *session = snapshot;
        return Err(PlaceError::RotationBlocked);
    }

    let Some(active) = session.current_piece() else {
        *session = snapshot;
        return Err(PlaceError::NoActive);
    };
    if active.rotation != target_rot {
        *session = snapshot;
        return Err(PlaceError::RotationBlocked);
    }

    let min_dx = active.shape.minos().map(|(dx, _)| dx).min().unwrap_or(0);
    let max_dx = active.shape.minos().map(|(dx, _)| dx).max().unwrap_or(0);
    if target_x + min_dx < 0 || target_x + max_dx >= session.board().width() as i8 {
        *session = snapshot;
        return Err(PlaceError::XOutOfBounds);
    }

    let dx = target_x - active.x;
    let step = dx.signum();
    for _ in 0..dx.abs() {
        if !matches!(
            session.move_piece(step, 0),
            floodline_core::MoveOutcome::Moved(_)
        ) {
            *session = snapshot;
            return Err(PlaceError::XBlocked);
        }
    }

    Ok(session.hard_drop())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameAction;
    use floodline_core::GameConfig;

    fn started() -> GameSession {
        let mut s = GameSession::new(GameConfig::default(), 1);
        s.start();
        s
    }

    #[test]
    fn place_rejected_when_paused() {
        let mut s = started();
        assert!(s.apply_action(GameAction::Pause));
        let a = s.current_piece().unwrap().clone();
        assert_eq!(
            apply_place(&mut s, a.x, a.rotation),
            Err(PlaceError::NotPlayable)
        );
    }

    #[test]
    fn place_rejected_when_x_out_of_bounds() {
        let mut s = started();
        let a = s.current_piece().unwrap().clone();
        assert_eq!(
            apply_place(&mut s, -50, a.rotation),
            Err(PlaceError::XOutOfBounds)
        );
        // Failed placement leaves the piece untouched.
        assert_eq!(s.current_piece(), Some(&a));
    }

    #[test]
    fn place_rejected_when_x_blocked_by_collision() {
        let mut s = started();
        let a = s.current_piece().unwrap().clone();

        // Wall off the column just left of the piece at its own rows.
        let wall_x = a.cells().map(|(x, _)| x).min().unwrap() - 1;
        assert!(wall_x >= 0);
        for (_, y) in a.cells() {
            s.board_mut().set(wall_x, y, 8);
        }

        let err = apply_place(&mut s, a.x - 1, a.rotation).unwrap_err();
        assert_eq!(err, PlaceError::XBlocked);
        assert_eq!(
            err.to_string(),
            "could not move to target x due to collision"
        );
    }

    #[test]
    fn place_drops_at_target() {
        let mut s = started();
        let a = s.current_piece().unwrap().clone();
        let before = s.board().occupied_count();
        let distance = apply_place(&mut s, a.x, a.rotation).unwrap();
        assert!(distance > 0);
        assert_eq!(s.board().occupied_count(), before + 4);
    }

    #[test]
    fn holes_count_covered_gaps() {
        let mut board = Board::new(3, 4);
        board.set(0, 1, 1);
        board.set(1, 3, 1);
        // Column 0 has two empty cells under its block.
        assert_eq!(count_holes(&board), 2);
    }

    #[test]
    fn planner_prefers_completing_a_line() {
        // Bottom row filled except the last two columns.
        let mut board = Board::standard();
        for x in 0..8 {
            board.set(x, 19, 8);
        }
        let piece = Piece::spawned(crate::types::PieceKind::O, 10);
        let plan = best_placement(&board, &piece).unwrap();
        assert_eq!(plan.lines, 1);
        assert_eq!(plan.x, 8);
    }

    #[test]
    fn planner_returns_nothing_when_every_spot_collides() {
        let mut board = Board::new(4, 4);
        for x in 0..4 {
            for y in 0..4 {
                board.set(x, y, 8);
            }
        }
        let piece = Piece::spawned(crate::types::PieceKind::O, 4);
        assert_eq!(best_placement(&board, &piece), None);
    }
}
