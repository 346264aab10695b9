//! Floodline (workspace facade crate).
//!
//! Re-exports the member crates as `floodline::{core,season,progress,engine,types}`
//! so the runner, tests and benches use one path while the implementation
//! lives in dedicated crates under `crates/`.

pub use floodline_core as core;
pub use floodline_engine as engine;
pub use floodline_progress as progress;
pub use floodline_season as season;
pub use floodline_types as types;
