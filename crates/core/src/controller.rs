//! Controller module - piece movement rules against a board
//!
//! These are pure functions: they take the board and the falling piece and
//! return the piece's next position. Committing the result (and placing a
//! landed piece) is the session's job.

use crate::board::Board;
use crate::pieces::{spawn_x, try_rotate, Piece};

/// Result of a translation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The piece fits at its new position
    Moved(Piece),
    /// A sideways or upward move collided; the piece stays put
    Blocked,
    /// A downward move collided; the piece must be placed where it is
    Landed,
}

/// Move a piece by (dx, dy)
pub fn translate(board: &Board, piece: &Piece, dx: i8, dy: i8) -> MoveOutcome {
    if !board.collides(piece, dx, dy) {
        return MoveOutcome::Moved(piece.translated(dx, dy));
    }
    if dy > 0 {
        MoveOutcome::Landed
    } else {
        MoveOutcome::Blocked
    }
}

/// Rotate a piece a quarter turn, resolving collisions with wall kicks
///
/// Returns `None` when no kick fits; the caller keeps the original piece.
pub fn rotate(board: &Board, piece: &Piece, clockwise: bool) -> Option<Piece> {
    try_rotate(piece, clockwise, |x, y| board.is_free(x, y)).map(|(rotated, _)| rotated)
}

/// Drop a piece straight down until it rests; returns it with the distance
pub fn hard_drop(board: &Board, piece: &Piece) -> (Piece, u32) {
    let distance = board.drop_distance(piece);
    (piece.translated(0, distance as i8), distance)
}

/// Row the piece would rest on if dropped now
pub fn ghost_y(board: &Board, piece: &Piece) -> i8 {
    piece.y + board.drop_distance(piece) as i8
}

/// Position a piece horizontally centered on the top row
///
/// Returns `Err` with the positioned piece if the spawn cells are already
/// occupied, which ends the game.
pub fn spawn(board: &Board, piece: Piece) -> Result<Piece, Piece> {
    let x = spawn_x(board.width(), piece.shape.width());
    let piece = piece.at(x, 0);
    if board.collides(&piece, 0, 0) {
        Err(piece)
    } else {
        Ok(piece)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PieceKind, Rotation};

    #[test]
    fn downward_collision_lands_sideways_blocks() {
        let board = Board::standard();
        let piece = Piece::spawned(PieceKind::O, 10).at(4, 18);
        assert_eq!(translate(&board, &piece, 0, 1), MoveOutcome::Landed);

        let left = Piece::spawned(PieceKind::O, 10).at(0, 0);
        assert_eq!(translate(&board, &left, -1, 0), MoveOutcome::Blocked);
        assert!(matches!(
            translate(&board, &left, 1, 0),
            MoveOutcome::Moved(p) if p.x == 1
        ));
    }

    #[test]
    fn hard_drop_reports_distance() {
        let board = Board::standard();
        let piece = Piece::spawned(PieceKind::O, 10);
        let (dropped, distance) = hard_drop(&board, &piece);
        assert_eq!(distance, 18);
        assert_eq!(dropped.y, 18);
        assert_eq!(ghost_y(&board, &piece), 18);
    }

    #[test]
    fn rotation_against_wall_kicks_inward() {
        let board = Board::standard();
        // Vertical I hugging the left wall: its cells sit in column 0.
        let mut piece = Piece::new(PieceKind::I);
        piece.rotation = Rotation::East;
        piece.shape = crate::pieces::get_shape(PieceKind::I, Rotation::East);
        let piece = piece.at(-2, 5);
        assert!(!board.collides(&piece, 0, 0));

        let rotated = rotate(&board, &piece, true).expect("kick should resolve");
        assert_eq!(rotated.rotation, Rotation::South);
        assert!(!board.collides(&rotated, 0, 0));
    }

    #[test]
    fn boxed_in_rotation_is_a_no_op() {
        let mut board = Board::new(3, 3);
        for x in 0..3 {
            board.set(x, 0, 9);
            board.set(x, 2, 9);
        }
        // Horizontal I-like bar in the middle row of a 3x3 well.
        let bar = Piece::custom(
            crate::pieces::Shape::from_rows(&[[1u8, 1, 1]]).unwrap(),
            5,
        )
        .at(0, 1);
        assert!(!board.collides(&bar, 0, 0));
        assert_eq!(rotate(&board, &bar, true), None);
    }

    #[test]
    fn blocked_spawn_is_reported() {
        let mut board = Board::standard();
        board.set(4, 0, 1);
        assert!(spawn(&board, Piece::new(PieceKind::O)).is_err());
        assert!(spawn(&Board::standard(), Piece::new(PieceKind::O)).is_ok());
    }
}
