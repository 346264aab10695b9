//! Historical scores - a capped list sorted best first

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{PersistenceProvider, SCORES_KEY};
use crate::types::SCORE_HISTORY_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Player or profile name
    pub identity: String,
    pub score: u64,
    /// Caller-supplied wall-clock milliseconds
    pub timestamp: u64,
    pub level: u32,
    pub lines: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreHistory {
    entries: Vec<ScoreEntry>,
    capacity: usize,
}

impl Default for ScoreHistory {
    fn default() -> Self {
        Self::with_capacity(SCORE_HISTORY_CAPACITY)
    }
}

impl ScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Read the saved list, skipping malformed entries
    pub fn load<S: PersistenceProvider + ?Sized>(store: &S) -> Self {
        let mut history = Self::default();
        let Some(blob) = store.get(SCORES_KEY) else {
            return history;
        };
        let raw: Vec<Value> = match serde_json::from_str(&blob) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("discarding saved scores: {}", e);
                return history;
            }
        };

        let total = raw.len();
        let mut entries: Vec<ScoreEntry> = raw
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();
        if entries.len() < total {
            log::warn!("skipped {} malformed score entries", total - entries.len());
        }
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(history.capacity);
        history.entries = entries;
        history
    }

    /// Write the list; failures are logged and otherwise ignored
    pub fn save<S: PersistenceProvider + ?Sized>(&self, store: &mut S) {
        let blob = match serde_json::to_string(&self.entries) {
            Ok(blob) => blob,
            Err(e) => {
                log::warn!("could not encode scores: {}", e);
                return;
            }
        };
        if let Err(e) = store.set(SCORES_KEY, &blob) {
            log::warn!("could not save scores: {}", e);
        }
    }

    /// Insert an entry; returns its 1-based rank if it made the list
    ///
    /// Equal scores rank behind older ones.
    pub fn record(&mut self, entry: ScoreEntry) -> Option<usize> {
        let pos = self.entries.partition_point(|e| e.score >= entry.score);
        if pos >= self.capacity {
            return None;
        }
        self.entries.insert(pos, entry);
        self.entries.truncate(self.capacity);
        Some(pos + 1)
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn best(&self) -> Option<&ScoreEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
