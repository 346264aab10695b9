//! Seasonal director - drives the active level's weather, wildlife and mechanics
//!
//! The director owns every time-bounded runtime instance spawned from the
//! level table. Durations and lifespans are accumulated-time counters advanced
//! by [`SeasonalDirector::tick`], and every random roll comes from one seeded
//! RNG, so a level replays exactly from a seed and a tick sequence.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use floodline_core::SimpleRng;

use crate::levels::{self, hazard_effect, LevelDefinition, MechanicTemplate, Trigger};
use crate::pressure::EnvironmentalPressure;
use crate::types::{
    GameEvent, HazardKind, ModifierMap, WildlifeBehavior, WildlifeKind, BOARD_HEIGHT, BOARD_WIDTH,
};

/// Downward acceleration for hopping wildlife, cells/s²
const HOP_GRAVITY: f64 = 9.0;

/// Fraction of a hazard's duration spent ramping in, and again ramping out
const HAZARD_RAMP: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SeasonError {
    #[error("no level with id {0}")]
    UnknownLevel(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    pub max_hazards: usize,
    pub max_wildlife: usize,
    /// Playfield size wildlife moves across, in cells
    pub field_width: f64,
    pub field_height: f64,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            max_hazards: 3,
            max_wildlife: 6,
            field_width: BOARD_WIDTH as f64,
            field_height: BOARD_HEIGHT as f64,
        }
    }
}

/// Counters mechanic triggers are evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MechanicContext {
    pub elapsed_ms: u64,
    pub lines: u32,
    pub score: u64,
}

/// A running weather event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveHazard {
    pub id: u32,
    pub kind: HazardKind,
    pub started_ms: u64,
    pub ends_ms: u64,
    pub peak_intensity: f64,
    /// Peak scaled by the ramp-in/ramp-out envelope
    pub intensity: f64,
}

impl ActiveHazard {
    fn envelope(&self, now_ms: u64) -> f64 {
        let span = self.ends_ms.saturating_sub(self.started_ms).max(1) as f64;
        let t = (now_ms.saturating_sub(self.started_ms) as f64 / span).clamp(0.0, 1.0);
        let ramp = (t / HAZARD_RAMP).min((1.0 - t) / HAZARD_RAMP).min(1.0);
        0.5 + 0.5 * ramp
    }
}

/// A creature crossing the playfield
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveWildlife {
    pub id: u32,
    pub kind: WildlifeKind,
    pub behavior: WildlifeBehavior,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub age_ms: u64,
    pub lifespan_ms: u64,
}

impl ActiveWildlife {
    fn advance(&mut self, dt_ms: u32, floor: f64) {
        let dt = dt_ms as f64 / 1000.0;
        self.age_ms = self.age_ms.saturating_add(dt_ms as u64);
        self.x += self.vx * dt;
        match self.behavior {
            WildlifeBehavior::Drift => {}
            WildlifeBehavior::Glide => self.y += self.vy * dt,
            WildlifeBehavior::Hop => {
                self.vy += HOP_GRAVITY * dt;
                self.y += self.vy * dt;
                if self.y >= floor {
                    self.y = floor;
                    self.vy = -self.vy.abs() * 0.8;
                }
            }
        }
    }

    fn is_gone(&self, width: f64, height: f64) -> bool {
        self.age_ms >= self.lifespan_ms
            || self.x < -1.0
            || self.x > width + 1.0
            || self.y > height + 1.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct MechanicState {
    active: bool,
    /// Deactivation time for chance-triggered mechanics
    until_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SeasonalDirector {
    config: DirectorConfig,
    level: &'static LevelDefinition,
    clock_ms: u64,
    seed: u32,
    rng: SimpleRng,
    next_id: u32,
    hazards: Vec<ActiveHazard>,
    wildlife: Vec<ActiveWildlife>,
    mechanics: Vec<MechanicState>,
    events: Vec<GameEvent>,
}

impl SeasonalDirector {
    /// Director parked on the first level; call [`set_level`](Self::set_level) to enter one
    pub fn new(config: DirectorConfig, seed: u32) -> Self {
        let level = &levels::levels()[0];
        Self {
            config,
            level,
            clock_ms: 0,
            seed,
            rng: SimpleRng::new(seed),
            next_id: 1,
            hazards: Vec::new(),
            wildlife: Vec::new(),
            mechanics: vec![MechanicState::default(); level.mechanics.len()],
            events: Vec::new(),
        }
    }

    /// Switch to level `id`, resetting all runtime state and the pressure gauge
    ///
    /// The RNG is reseeded from the director seed and the level id.
    pub fn set_level(
        &mut self,
        id: u32,
        pressure: &mut EnvironmentalPressure,
    ) -> Result<&'static LevelDefinition, SeasonError> {
        let level = levels::level(id).ok_or(SeasonError::UnknownLevel(id))?;

        self.level = level;
        self.clock_ms = 0;
        // Each level gets its own stream so a restart replays the same weather.
        self.rng = SimpleRng::new(self.seed ^ id.wrapping_mul(0x9E37_79B9));
        self.next_id = 1;
        self.hazards.clear();
        self.wildlife.clear();
        self.mechanics = vec![MechanicState::default(); level.mechanics.len()];
        self.events.clear();

        pressure.configure(level.rise_rate, level.grace_override_ms);

        log::info!(
            "entering level {} \"{}\" ({})",
            level.id,
            level.name,
            level.season.as_str()
        );
        self.events.push(GameEvent::LevelEntered {
            level: level.id,
            name: level.name,
            season: level.season,
        });

        self.update_mechanics(0, &MechanicContext::default());
        Ok(level)
    }

    pub fn current_level(&self) -> &'static LevelDefinition {
        self.level
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn active_hazards(&self) -> &[ActiveHazard] {
        &self.hazards
    }

    pub fn active_wildlife(&self) -> &[ActiveWildlife] {
        &self.wildlife
    }

    /// Names of mechanics currently in force
    pub fn active_mechanics(&self) -> Vec<&'static str> {
        self.level
            .mechanics
            .iter()
            .zip(&self.mechanics)
            .filter(|(_, state)| state.active)
            .map(|(m, _)| m.name)
            .collect()
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance hazards, wildlife and mechanic triggers by `dt_ms`
    pub fn tick(&mut self, dt_ms: u32, ctx: &MechanicContext) {
        self.clock_ms = self.clock_ms.saturating_add(dt_ms as u64);
        self.expire_hazards();
        self.spawn_hazards(dt_ms);
        self.advance_wildlife(dt_ms);
        self.spawn_wildlife(dt_ms);
        self.update_mechanics(dt_ms, ctx);
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn expire_hazards(&mut self) {
        let now = self.clock_ms;
        let mut ended = Vec::new();
        self.hazards.retain(|h| {
            if now >= h.ends_ms {
                ended.push((h.id, h.kind));
                false
            } else {
                true
            }
        });
        for (id, kind) in ended {
            log::debug!("hazard {} ({}) ended", id, kind.as_str());
            self.events.push(GameEvent::HazardEnded { id, kind });
        }

        for h in &mut self.hazards {
            h.intensity = h.peak_intensity * h.envelope(now);
        }
    }

    fn spawn_hazards(&mut self, dt_ms: u32) {
        for template in self.level.hazards {
            if self.hazards.len() >= self.config.max_hazards {
                break;
            }
            if self.hazards.iter().any(|h| h.kind == template.kind) {
                continue;
            }
            if !self.rng.chance(per_tick(template.frequency_per_minute, dt_ms)) {
                continue;
            }

            let id = self.alloc_id();
            let mut hazard = ActiveHazard {
                id,
                kind: template.kind,
                started_ms: self.clock_ms,
                ends_ms: self.clock_ms.saturating_add(template.duration_ms),
                peak_intensity: template.intensity.clamp(0.0, 1.0),
                intensity: 0.0,
            };
            hazard.intensity = hazard.peak_intensity * hazard.envelope(self.clock_ms);
            log::debug!("hazard {} ({}) spawned", id, template.kind.as_str());
            self.events.push(GameEvent::HazardSpawned {
                id,
                kind: template.kind,
                intensity: hazard.peak_intensity,
            });
            self.hazards.push(hazard);
        }
    }

    fn advance_wildlife(&mut self, dt_ms: u32) {
        let (w, h) = (self.config.field_width, self.config.field_height);
        let mut gone = Vec::new();
        self.wildlife.retain_mut(|c| {
            c.advance(dt_ms, h);
            if c.is_gone(w, h) {
                gone.push((c.id, c.kind));
                false
            } else {
                true
            }
        });
        for (id, kind) in gone {
            self.events.push(GameEvent::WildlifeDespawned { id, kind });
        }
    }

    fn spawn_wildlife(&mut self, dt_ms: u32) {
        for template in self.level.wildlife {
            if self.wildlife.len() >= self.config.max_wildlife {
                break;
            }
            if !self.rng.chance(per_tick(template.spawn_rate_per_minute, dt_ms)) {
                continue;
            }

            let from_left = self.rng.chance(0.5);
            let (x, vx) = if from_left {
                (0.0, template.speed)
            } else {
                (self.config.field_width, -template.speed)
            };
            let y = self.rng.next_between(0.0, self.config.field_height * 0.6);
            let vy = match template.behavior {
                WildlifeBehavior::Drift => 0.0,
                WildlifeBehavior::Hop => -template.speed * 1.5,
                WildlifeBehavior::Glide => template.speed * 0.25,
            };

            let id = self.alloc_id();
            self.wildlife.push(ActiveWildlife {
                id,
                kind: template.kind,
                behavior: template.behavior,
                x,
                y,
                vx,
                vy,
                age_ms: 0,
                lifespan_ms: template.lifespan_ms,
            });
            self.events.push(GameEvent::WildlifeSpawned {
                id,
                kind: template.kind,
            });
        }
    }

    fn update_mechanics(&mut self, dt_ms: u32, ctx: &MechanicContext) {
        let now = self.clock_ms;
        let level = self.level;
        for (template, state) in level.mechanics.iter().zip(self.mechanics.iter_mut()) {
            let was_active = state.active;
            state.active = match template.trigger {
                Trigger::Always => true,
                Trigger::AfterMs(ms) => ctx.elapsed_ms >= ms,
                Trigger::LinesAtLeast(n) => ctx.lines >= n,
                Trigger::ScoreAtLeast(s) => ctx.score >= s,
                Trigger::Chance {
                    per_minute,
                    duration_ms,
                } => match state.until_ms {
                    Some(until) if now < until => true,
                    Some(_) => {
                        state.until_ms = None;
                        false
                    }
                    None => {
                        if self.rng.chance(per_tick(per_minute, dt_ms)) {
                            state.until_ms = Some(now.saturating_add(duration_ms));
                            true
                        } else {
                            false
                        }
                    }
                },
            };

            if state.active && !was_active {
                log::debug!("mechanic {} activated", template.name);
                self.events.push(GameEvent::MechanicActivated {
                    name: template.name,
                });
            } else if !state.active && was_active {
                log::debug!("mechanic {} deactivated", template.name);
                self.events.push(GameEvent::MechanicDeactivated {
                    name: template.name,
                });
            }
        }
    }

    /// Fold active hazard effects, then active mechanic effects, into one map
    ///
    /// Later writes win for the same key.
    pub fn seasonal_piece_modifiers(&self) -> ModifierMap {
        let mut map = ModifierMap::new();
        for h in &self.hazards {
            let (key, value) = hazard_effect(h.kind, h.intensity);
            map.set(key, value);
        }
        let level = self.level;
        let active = level
            .mechanics
            .iter()
            .zip(&self.mechanics)
            .filter(|(_, s)| s.active)
            .map(|(m, _)| m);
        for mechanic in active {
            apply_mechanic(&mut map, mechanic);
        }
        map
    }
}

fn apply_mechanic(map: &mut ModifierMap, mechanic: &MechanicTemplate) {
    for &(key, value) in mechanic.effects {
        map.set(key, value);
    }
}

/// Per-tick probability for a per-minute rate, clamped to 1
pub fn per_tick(rate_per_minute: f64, dt_ms: u32) -> f64 {
    if !rate_per_minute.is_finite() || rate_per_minute <= 0.0 {
        return 0.0;
    }
    (rate_per_minute * dt_ms as f64 / 60_000.0).min(1.0)
}
