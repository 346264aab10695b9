//! Floodline engine: the per-tick [`Simulation`] that runs a session, its
//! flood gauge and its season together, plus the placement planner the
//! headless runner plays with.

pub use floodline_types as types;

pub mod config;
pub mod place;
pub mod simulation;

pub use config::{ConfigError, SimulationConfig};
pub use place::{
    apply_place, best_placement, best_placement_with, count_holes, evaluate, PlaceError,
    Placement, Weights,
};
pub use simulation::{
    EngineError, Outcome, PieceCommand, Simulation, ENDLESS_RATE_STEP, EXTENDED_GRACE_MS,
    SCORE_BOOST_FACTOR, SLOW_TIDE_FACTOR,
};
