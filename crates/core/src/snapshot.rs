//! Read-only view of a session for presentation layers

use crate::board::Board;
use crate::pieces::Piece;
use crate::types::FailureReason;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub board: Board,
    pub current: Option<Piece>,
    pub next: Option<Piece>,
    /// Row the current piece would land on
    pub ghost_y: Option<i8>,
    pub score: u64,
    pub level: u32,
    pub lines: u32,
    pub game_over: bool,
    pub failure: Option<FailureReason>,
    pub paused: bool,
    pub started: bool,
    pub elapsed_ms: u64,
    pub drop_timer_ms: u32,
    pub drop_interval_ms: u32,
}

impl SessionSnapshot {
    pub fn playable(&self) -> bool {
        self.started && !self.game_over && !self.paused
    }

    /// Board with the falling piece drawn in, for rendering
    pub fn composed_board(&self) -> Board {
        match &self.current {
            Some(piece) => self.board.with_piece(piece),
            None => self.board.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{GameConfig, GameSession};

    #[test]
    fn snapshot_is_detached_from_session() {
        let mut session = GameSession::new(GameConfig::default(), 3);
        session.start();
        let before = session.snapshot();
        session.hard_drop();
        assert_eq!(before.board.occupied_count(), 0);
        assert!(before.playable());
        assert_eq!(before.composed_board().occupied_count(), 4);
        assert_eq!(session.snapshot().board.occupied_count(), 4);
    }
}
