//! Player progress: campaign unlocks, star ratings and the score history,
//! persisted through an injected string store.

pub use floodline_types as types;

pub mod history;
pub mod progression;
pub mod store;

pub use history::{ScoreEntry, ScoreHistory};
pub use progression::{
    compute_stars, Bonus, LevelResult, ProgressError, ProgressRecord, ProgressSnapshot,
    ProgressUpdate, ProgressionTracker, WorldRecord,
};
pub use store::{FileStore, MemoryStore, PersistenceProvider, StoreError, PROGRESS_KEY, SCORES_KEY};
