//! Core game logic - pure, deterministic, and testable
//!
//! This crate contains the falling-block rules: the board, the piece catalog
//! and rotation, movement, scoring, the difficulty curve and the
//! [`GameSession`] that ties them together. It has no I/O, so the same seed
//! and tick sequence always replays the same game.
//!
//! # Module Structure
//!
//! - [`board`]: fixed-size grid with collision detection and line clearing
//! - [`pieces`]: piece shapes, table and matrix rotation, wall kicks
//! - [`controller`]: spawn, translate, rotate and drop rules
//! - [`game_state`]: the session, its counters and validated updates
//! - [`rng`]: seeded LCG and 7-bag piece queue
//! - [`scoring`]: line clear and drop points
//! - [`difficulty`]: level curve, gravity interval, modes and objectives
//! - [`events`]: synchronous event bus
//!
//! # Example
//!
//! ```
//! use floodline_core::{GameConfig, GameSession};
//! use floodline_types::GameAction;
//!
//! let mut game = GameSession::new(GameConfig::default(), 12345);
//! game.start();
//!
//! game.apply_action(GameAction::MoveRight);
//! game.apply_action(GameAction::RotateCw);
//! game.apply_action(GameAction::HardDrop);
//!
//! assert!(game.score() > 0); // Hard drop awards points
//! ```
//!
//! # Timing
//!
//! Call [`GameSession::tick`] with the elapsed milliseconds. Gravity moves the
//! piece one row per drop interval (1000ms at level 1, decaying per level);
//! a piece locks the moment it cannot fall further.

pub mod board;
pub mod config;
pub mod controller;
pub mod difficulty;
pub mod events;
pub mod game_state;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;
pub mod update;

pub use floodline_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, BoardError, LineClear};
pub use config::GameConfig;
pub use controller::MoveOutcome;
pub use difficulty::{DifficultyCurve, GameMode, Objective, ObjectiveProgress};
pub use events::{EventBus, SubscriptionId};
pub use game_state::GameSession;
pub use pieces::{get_shape, try_rotate, Piece, Rotator, Shape, ShapeError};
pub use rng::{PieceQueue, SimpleRng};
pub use scoring::{calculate_drop_score, calculate_score, ScoreResult, ScoreTable};
pub use snapshot::SessionSnapshot;
pub use update::{RejectedField, StateUpdate, StateViolation, UpdateReport};
