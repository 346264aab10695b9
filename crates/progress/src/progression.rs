//! Campaign progression - completion, stars and unlocks
//!
//! Completion and unlock flags only ever move from false to true, and stars
//! only go up. Level N+1 unlocks when level N completes; a world's last level
//! unlocks the next world and a bonus.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use floodline_season::{self as season, LevelDefinition, LEVEL_COUNT, WORLD_COUNT};

use crate::store::{PersistenceProvider, PROGRESS_KEY};
use crate::types::{GameEvent, LEVELS_PER_WORLD};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("no level with id {0}")]
    UnknownLevel(u32),
    #[error("level {0} is locked")]
    LevelLocked(u32),
    #[error("progress snapshot is inconsistent: {0}")]
    InvalidSnapshot(String),
}

/// Best results for one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub lines_cleared: u32,
    pub score: u64,
    /// Fastest completion in milliseconds, 0 until completed
    pub elapsed_time: u64,
    pub completed: bool,
    pub stars: u8,
    pub unlocked: bool,
}

/// Aggregate over a world's five levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldRecord {
    pub levels_completed: u32,
    pub total_levels: u32,
    pub unlocked: bool,
    pub best_score: u64,
    pub total_stars: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bonus {
    ExtendedGrace,
    SlowTide,
    ScoreBoost,
    EndlessMode,
}

impl Bonus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bonus::ExtendedGrace => "ExtendedGrace",
            Bonus::SlowTide => "SlowTide",
            Bonus::ScoreBoost => "ScoreBoost",
            Bonus::EndlessMode => "EndlessMode",
        }
    }

    /// Bonus granted for finishing a world
    pub fn for_world(world: u32) -> Option<Bonus> {
        match world {
            1 => Some(Bonus::ExtendedGrace),
            2 => Some(Bonus::SlowTide),
            3 => Some(Bonus::ScoreBoost),
            w if w == WORLD_COUNT => Some(Bonus::EndlessMode),
            _ => None,
        }
    }

    /// World whose finale grants this bonus
    pub fn world(&self) -> u32 {
        match self {
            Bonus::ExtendedGrace => 1,
            Bonus::SlowTide => 2,
            Bonus::ScoreBoost => 3,
            Bonus::EndlessMode => WORLD_COUNT,
        }
    }
}

/// Persisted form, `[id, record]` pairs in id order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub level_records: Vec<(u32, ProgressRecord)>,
    pub world_records: Vec<(u32, WorldRecord)>,
    pub unlocked_bonuses: Vec<Bonus>,
}

/// One finished attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelResult {
    pub lines: u32,
    pub score: u64,
    pub elapsed_ms: u64,
}

/// What an attempt changed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressUpdate {
    pub level: u32,
    pub completed: bool,
    /// First completion of this level
    pub newly_completed: bool,
    /// Stars earned by this attempt alone
    pub stars: u8,
    pub best_stars: u8,
    pub unlocked_levels: Vec<u32>,
    pub unlocked_worlds: Vec<u32>,
    pub unlocked_bonuses: Vec<Bonus>,
}

impl ProgressUpdate {
    /// Unlock notifications in level, world, bonus order
    pub fn unlock_events(&self) -> Vec<GameEvent> {
        let levels = self
            .unlocked_levels
            .iter()
            .map(|&level| GameEvent::LevelUnlocked { level });
        let worlds = self
            .unlocked_worlds
            .iter()
            .map(|&world| GameEvent::WorldUnlocked { world });
        let bonuses = self
            .unlocked_bonuses
            .iter()
            .map(|b| GameEvent::BonusUnlocked { name: b.as_str() });
        levels.chain(worlds).chain(bonuses).collect()
    }
}

/// Star rating for a result against a level
///
/// One star for reaching the target, one for beating the time threshold, and
/// one for finishing in under 70% of it or clearing 150% of the target.
pub fn compute_stars(def: &LevelDefinition, lines: u32, elapsed_ms: u64) -> u8 {
    if lines < def.target_lines {
        return 0;
    }
    let threshold = def.star_time_ms as f64;
    let elapsed = elapsed_ms as f64;
    let mut stars = 1;
    if elapsed < threshold {
        stars += 1;
    }
    if elapsed < threshold * 0.7 || lines as u64 * 2 >= def.target_lines as u64 * 3 {
        stars += 1;
    }
    stars
}

fn world_of(level: u32) -> u32 {
    (level - 1) / LEVELS_PER_WORLD + 1
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionTracker {
    levels: BTreeMap<u32, ProgressRecord>,
    worlds: BTreeMap<u32, WorldRecord>,
    bonuses: BTreeSet<Bonus>,
}

impl Default for ProgressionTracker {
    /// Fresh profile: only level 1 and world 1 unlocked
    fn default() -> Self {
        let levels = (1..=LEVEL_COUNT)
            .map(|id| {
                let record = ProgressRecord {
                    unlocked: id == 1,
                    ..ProgressRecord::default()
                };
                (id, record)
            })
            .collect();
        let mut tracker = Self {
            levels,
            worlds: BTreeMap::new(),
            bonuses: BTreeSet::new(),
        };
        for world in 1..=WORLD_COUNT {
            tracker.worlds.insert(
                world,
                WorldRecord {
                    unlocked: world == 1,
                    ..WorldRecord::default()
                },
            );
            tracker.refresh_world(world);
        }
        tracker
    }
}

impl ProgressionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the saved profile, falling back to a fresh one
    pub fn load<S: PersistenceProvider + ?Sized>(store: &S) -> Self {
        let Some(blob) = store.get(PROGRESS_KEY) else {
            return Self::default();
        };
        let parsed = serde_json::from_str::<ProgressSnapshot>(&blob)
            .map_err(|e| ProgressError::InvalidSnapshot(e.to_string()))
            .and_then(Self::from_snapshot);
        match parsed {
            Ok(tracker) => tracker,
            Err(e) => {
                log::warn!("discarding saved progress: {}", e);
                Self::default()
            }
        }
    }

    /// Write the profile; failures are logged and otherwise ignored
    pub fn save<S: PersistenceProvider + ?Sized>(&self, store: &mut S) {
        let blob = match serde_json::to_string(&self.snapshot()) {
            Ok(blob) => blob,
            Err(e) => {
                log::warn!("could not encode progress: {}", e);
                return;
            }
        };
        if let Err(e) = store.set(PROGRESS_KEY, &blob) {
            log::warn!("could not save progress: {}", e);
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            level_records: self.levels.iter().map(|(&id, &r)| (id, r)).collect(),
            world_records: self.worlds.iter().map(|(&id, &r)| (id, r)).collect(),
            unlocked_bonuses: self.bonuses.iter().copied().collect(),
        }
    }

    /// Rebuild from a snapshot, rejecting anything that breaks the unlock rules
    ///
    /// Missing records are filled with locked defaults. World aggregates are
    /// recomputed from the level records rather than trusted.
    pub fn from_snapshot(snapshot: ProgressSnapshot) -> Result<Self, ProgressError> {
        let mut tracker = Self::default();
        for (id, record) in snapshot.level_records {
            if !(1..=LEVEL_COUNT).contains(&id) {
                return Err(ProgressError::InvalidSnapshot(format!("level id {id}")));
            }
            tracker.levels.insert(id, record);
        }
        for (id, record) in snapshot.world_records {
            if !(1..=WORLD_COUNT).contains(&id) {
                return Err(ProgressError::InvalidSnapshot(format!("world id {id}")));
            }
            tracker.worlds.insert(id, record);
        }
        tracker.bonuses = snapshot.unlocked_bonuses.into_iter().collect();

        tracker.check()?;
        for world in 1..=WORLD_COUNT {
            tracker.refresh_world(world);
        }
        Ok(tracker)
    }

    fn check(&self) -> Result<(), ProgressError> {
        let bad = |msg: String| Err(ProgressError::InvalidSnapshot(msg));

        if !self.is_unlocked(1) {
            return bad("level 1 is locked".into());
        }
        for (&id, r) in &self.levels {
            if r.stars > 3 {
                return bad(format!("level {id} has {} stars", r.stars));
            }
            if r.completed != (r.stars > 0) {
                return bad(format!("level {id} stars disagree with completion"));
            }
            if r.completed && !r.unlocked {
                return bad(format!("level {id} completed while locked"));
            }
            if id > 1 && r.unlocked && !self.is_completed(id - 1) {
                return bad(format!("level {id} unlocked before level {}", id - 1));
            }
        }
        for (&world, w) in &self.worlds {
            if world > 1 && w.unlocked && !self.is_completed((world - 1) * LEVELS_PER_WORLD) {
                return bad(format!("world {world} unlocked early"));
            }
        }
        for bonus in &self.bonuses {
            if !self.is_completed(bonus.world() * LEVELS_PER_WORLD) {
                return bad(format!("bonus {} not earned", bonus.as_str()));
            }
        }
        Ok(())
    }

    pub fn record(&self, level: u32) -> Option<&ProgressRecord> {
        self.levels.get(&level)
    }

    pub fn world(&self, world: u32) -> Option<&WorldRecord> {
        self.worlds.get(&world)
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        self.levels.get(&level).is_some_and(|r| r.unlocked)
    }

    pub fn is_completed(&self, level: u32) -> bool {
        self.levels.get(&level).is_some_and(|r| r.completed)
    }

    pub fn is_world_unlocked(&self, world: u32) -> bool {
        self.worlds.get(&world).is_some_and(|w| w.unlocked)
    }

    pub fn has_bonus(&self, bonus: Bonus) -> bool {
        self.bonuses.contains(&bonus)
    }

    pub fn bonuses(&self) -> impl Iterator<Item = Bonus> + '_ {
        self.bonuses.iter().copied()
    }

    pub fn total_stars(&self) -> u32 {
        self.levels.values().map(|r| r.stars as u32).sum()
    }

    /// Fold one attempt into the records
    pub fn record_attempt(
        &mut self,
        level: u32,
        result: LevelResult,
    ) -> Result<ProgressUpdate, ProgressError> {
        let def = season::level(level).ok_or(ProgressError::UnknownLevel(level))?;
        if !self.is_unlocked(level) {
            return Err(ProgressError::LevelLocked(level));
        }

        let stars = compute_stars(def, result.lines, result.elapsed_ms);
        let completed = stars > 0;
        let mut update = ProgressUpdate {
            level,
            completed,
            stars,
            ..ProgressUpdate::default()
        };

        let record = self.levels.entry(level).or_default();
        record.lines_cleared = record.lines_cleared.max(result.lines);
        record.score = record.score.max(result.score);
        record.stars = record.stars.max(stars);
        if completed {
            let first = !record.completed;
            update.newly_completed = first;
            record.completed = true;
            if first || result.elapsed_ms < record.elapsed_time {
                record.elapsed_time = result.elapsed_ms;
            }
        }
        update.best_stars = record.stars;

        if completed {
            self.unlock_after(def, &mut update);
        }
        self.refresh_world(def.world());
        Ok(update)
    }

    fn unlock_after(&mut self, def: &LevelDefinition, update: &mut ProgressUpdate) {
        let next = def.id + 1;
        if let Some(r) = self.levels.get_mut(&next) {
            if !r.unlocked {
                r.unlocked = true;
                update.unlocked_levels.push(next);
                log::info!("level {} unlocked", next);
            }
        }

        if !def.is_world_finale() {
            return;
        }
        let world = def.world();
        if let Some(w) = self.worlds.get_mut(&(world + 1)) {
            if !w.unlocked {
                w.unlocked = true;
                update.unlocked_worlds.push(world + 1);
                log::info!("world {} unlocked", world + 1);
            }
        }
        if let Some(bonus) = Bonus::for_world(world) {
            if self.bonuses.insert(bonus) {
                update.unlocked_bonuses.push(bonus);
                log::info!("bonus {} unlocked", bonus.as_str());
            }
        }
    }

    fn refresh_world(&mut self, world: u32) {
        let mut agg = WorldRecord {
            unlocked: self.worlds.get(&world).is_some_and(|w| w.unlocked),
            ..WorldRecord::default()
        };
        for r in self
            .levels
            .iter()
            .filter(|&(&id, _)| world_of(id) == world)
            .map(|(_, r)| r)
        {
            agg.total_levels += 1;
            agg.levels_completed += r.completed as u32;
            agg.best_score = agg.best_score.max(r.score);
            agg.total_stars += r.stars as u32;
        }
        self.worlds.insert(world, agg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn finish(tracker: &mut ProgressionTracker, level: u32) -> ProgressUpdate {
        let def = season::level(level).unwrap();
        tracker
            .record_attempt(
                level,
                LevelResult {
                    lines: def.target_lines,
                    score: 1_000,
                    elapsed_ms: def.star_time_ms,
                },
            )
            .unwrap()
    }

    #[test]
    fn fresh_profile_has_only_level_one() {
        let t = ProgressionTracker::new();
        assert!(t.is_unlocked(1));
        assert!(!t.is_unlocked(2));
        assert!(t.is_world_unlocked(1));
        assert!(!t.is_world_unlocked(2));
        assert_eq!(t.world(1).unwrap().total_levels, 5);
    }

    #[test]
    fn stars_follow_time_and_line_thresholds() {
        let def = season::level(1).unwrap();
        // Threshold 90s, target 5 lines.
        assert_eq!(compute_stars(def, 5, 60_000), 3);
        assert_eq!(compute_stars(def, 5, 80_000), 2);
        assert_eq!(compute_stars(def, 5, 95_000), 1);
        assert_eq!(compute_stars(def, 8, 95_000), 2);
        assert_eq!(compute_stars(def, 4, 10_000), 0);
    }

    #[test]
    fn completing_unlocks_the_next_level_only() {
        let mut t = ProgressionTracker::new();
        let update = finish(&mut t, 1);
        assert!(update.completed && update.newly_completed);
        assert_eq!(update.unlocked_levels, vec![2]);
        assert!(t.is_unlocked(2));
        assert!(!t.is_unlocked(3));
        assert_eq!(
            update.unlock_events(),
            vec![GameEvent::LevelUnlocked { level: 2 }]
        );
    }

    #[test]
    fn locked_and_unknown_levels_are_refused() {
        let mut t = ProgressionTracker::new();
        let result = LevelResult::default();
        assert_eq!(
            t.record_attempt(3, result),
            Err(ProgressError::LevelLocked(3))
        );
        assert_eq!(
            t.record_attempt(99, result),
            Err(ProgressError::UnknownLevel(99))
        );
    }

    #[test]
    fn failed_attempt_keeps_best_results() {
        let mut t = ProgressionTracker::new();
        finish(&mut t, 1);
        let before = *t.record(1).unwrap();
        let update = t
            .record_attempt(
                1,
                LevelResult {
                    lines: 2,
                    score: 10,
                    elapsed_ms: 5_000,
                },
            )
            .unwrap();
        assert!(!update.completed);
        assert_eq!(update.best_stars, before.stars);
        assert_eq!(*t.record(1).unwrap(), before);
    }

    #[test]
    fn world_finale_unlocks_world_and_bonus() {
        let mut t = ProgressionTracker::new();
        for level in 1..=4 {
            finish(&mut t, level);
        }
        let update = finish(&mut t, 5);
        assert_eq!(update.unlocked_levels, vec![6]);
        assert_eq!(update.unlocked_worlds, vec![2]);
        assert_eq!(update.unlocked_bonuses, vec![Bonus::ExtendedGrace]);
        assert!(t.is_world_unlocked(2));
        assert_eq!(t.world(1).unwrap().levels_completed, 5);
        assert_eq!(t.world(1).unwrap().best_score, 1_000);
    }

    #[test]
    fn final_level_unlocks_endless() {
        let mut t = ProgressionTracker::new();
        for level in 1..=LEVEL_COUNT {
            finish(&mut t, level);
        }
        assert!(t.has_bonus(Bonus::EndlessMode));
        assert_eq!(t.bonuses().count(), 4);
        assert_eq!(t.total_stars(), LEVEL_COUNT);
    }

    #[test]
    fn save_and_load_round_trip() {
        let mut store = MemoryStore::new();
        let mut t = ProgressionTracker::new();
        finish(&mut t, 1);
        finish(&mut t, 2);
        t.save(&mut store);

        let loaded = ProgressionTracker::load(&store);
        assert_eq!(loaded, t);
    }

    #[test]
    fn persisted_form_uses_camel_case_pairs() {
        let mut t = ProgressionTracker::new();
        finish(&mut t, 1);
        let json = serde_json::to_value(t.snapshot()).unwrap();
        assert_eq!(json["levelRecords"][0][0], 1);
        assert_eq!(json["levelRecords"][0][1]["linesCleared"], 5);
        assert_eq!(json["levelRecords"][0][1]["completed"], true);
        assert_eq!(json["worldRecords"][0][1]["levelsCompleted"], 1);
        assert!(json["unlockedBonuses"].as_array().unwrap().is_empty());
    }

    #[test]
    fn corrupt_or_inconsistent_saves_fall_back() {
        let mut store = MemoryStore::new();
        store.set(PROGRESS_KEY, "not json").unwrap();
        assert_eq!(ProgressionTracker::load(&store), ProgressionTracker::new());

        // Level 3 unlocked without level 2 completed.
        let mut snap = ProgressionTracker::new().snapshot();
        snap.level_records[2].1.unlocked = true;
        store
            .set(PROGRESS_KEY, &serde_json::to_string(&snap).unwrap())
            .unwrap();
        assert_eq!(ProgressionTracker::load(&store), ProgressionTracker::new());
    }

    #[test]
    fn saved_bonuses_must_be_earned() {
        let mut store = MemoryStore::new();
        store
            .set(
                PROGRESS_KEY,
                r#"{"levelRecords":[],"worldRecords":[],"unlockedBonuses":["EndlessMode","SlowTide"]}"#,
            )
            .unwrap();
        let loaded = ProgressionTracker::load(&store);
        assert!(!loaded.has_bonus(Bonus::EndlessMode));
        assert!(!loaded.has_bonus(Bonus::SlowTide));
        assert_eq!(loaded, ProgressionTracker::new());

        // World 1 done earns its own bonus and nothing further.
        let mut t = ProgressionTracker::new();
        for level in 1..=LEVELS_PER_WORLD {
            finish(&mut t, level);
        }
        let mut snap = t.snapshot();
        assert!(ProgressionTracker::from_snapshot(snap.clone()).is_ok());
        snap.unlocked_bonuses.push(Bonus::ScoreBoost);
        assert!(matches!(
            ProgressionTracker::from_snapshot(snap),
            Err(ProgressError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn instant_best_time_is_kept() {
        let mut t = ProgressionTracker::new();
        let def = season::level(1).unwrap();
        let mut attempt = LevelResult {
            lines: def.target_lines,
            score: 100,
            elapsed_ms: 0,
        };
        t.record_attempt(1, attempt).unwrap();
        assert_eq!(t.record(1).unwrap().elapsed_time, 0);

        attempt.elapsed_ms = 30_000;
        let update = t.record_attempt(1, attempt).unwrap();
        assert!(!update.newly_completed);
        assert_eq!(t.record(1).unwrap().elapsed_time, 0);
    }
}
