//! Environmental pressure - the rising flood gauge
//!
//! The gauge runs through three phases. During **Grace** the level is held at
//! its starting value until the grace period has elapsed (or an external
//! expiry signal arrives, whichever comes first). While **Rising** it climbs at
//! the effective rate, which is recomputed every tick from the base rate and
//! the active seasonal modifiers. Reaching the maximum enters **Critical**.
//! Cleared lines push the level back down in Grace and Rising.

use serde::{Deserialize, Serialize};

use crate::types::{
    GameEvent, ModifierKey, ModifierMap, DEFAULT_GRACE_MS, PRESSURE_LOWER_PER_LINE, PRESSURE_MAX,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureConfig {
    pub max_level: f64,
    /// Gauge units removed per cleared line
    pub lower_per_line: f64,
    /// Grace period for levels that set none
    pub default_grace_ms: u64,
}

impl Default for PressureConfig {
    fn default() -> Self {
        Self {
            max_level: PRESSURE_MAX,
            lower_per_line: PRESSURE_LOWER_PER_LINE,
            default_grace_ms: DEFAULT_GRACE_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PressurePhase {
    Grace,
    Rising,
    Critical,
}

impl PressurePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PressurePhase::Grace => "grace",
            PressurePhase::Rising => "rising",
            PressurePhase::Critical => "critical",
        }
    }
}

/// Snapshot of the gauge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentalState {
    pub level: f64,
    pub max_level: f64,
    /// Gauge units per second before modifiers
    pub base_rise_rate: f64,
    /// Rate applied on the last tick
    pub effective_rise_rate: f64,
    pub phase: PressurePhase,
    pub grace_elapsed_ms: u64,
    pub grace_period_ms: u64,
}

impl EnvironmentalState {
    /// Level as a fraction of the maximum
    pub fn fill_ratio(&self) -> f64 {
        if self.max_level <= 0.0 {
            return 1.0;
        }
        (self.level / self.max_level).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct EnvironmentalPressure {
    config: PressureConfig,
    level: f64,
    base_rate: f64,
    effective_rate: f64,
    phase: PressurePhase,
    grace_elapsed_ms: u64,
    grace_period_ms: u64,
    events: Vec<GameEvent>,
}

impl EnvironmentalPressure {
    pub fn new(config: PressureConfig) -> Self {
        Self {
            grace_period_ms: config.default_grace_ms,
            config,
            level: 0.0,
            base_rate: 0.0,
            effective_rate: 0.0,
            phase: PressurePhase::Grace,
            grace_elapsed_ms: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &PressureConfig {
        &self.config
    }

    /// Reset for a level start: empty gauge, fresh grace period
    pub fn configure(&mut self, rise_rate: f64, grace_override: Option<u64>) {
        self.level = 0.0;
        self.base_rate = sanitize_rate(rise_rate);
        self.effective_rate = self.base_rate;
        self.phase = PressurePhase::Grace;
        self.grace_elapsed_ms = 0;
        self.grace_period_ms = grace_override.unwrap_or(self.config.default_grace_ms);
        self.events.clear();
    }

    /// Change the base rate without resetting anything else
    pub fn set_base_rise_rate(&mut self, rise_rate: f64) {
        self.base_rate = sanitize_rate(rise_rate);
    }

    /// `base * WaterRiseMultiplier + WaterRiseBonus`, never negative
    pub fn effective_rate_for(&self, modifiers: &ModifierMap) -> f64 {
        let rate = self.base_rate * modifiers.get(ModifierKey::WaterRiseMultiplier)
            + modifiers.get(ModifierKey::WaterRiseBonus);
        sanitize_rate(rate)
    }

    /// Advance the gauge by `dt_ms`
    pub fn tick(&mut self, dt_ms: u32, modifiers: &ModifierMap) {
        self.effective_rate = self.effective_rate_for(modifiers);

        match self.phase {
            PressurePhase::Grace => {
                self.grace_elapsed_ms = self.grace_elapsed_ms.saturating_add(dt_ms as u64);
                if self.grace_elapsed_ms >= self.grace_period_ms {
                    let overflow = self.grace_elapsed_ms - self.grace_period_ms;
                    self.end_grace();
                    self.rise(overflow);
                }
            }
            PressurePhase::Rising => self.rise(dt_ms as u64),
            PressurePhase::Critical => {}
        }
    }

    fn rise(&mut self, ms: u64) {
        let rise = self.effective_rate * ms as f64 / 1000.0;
        self.level = (self.level + rise).min(self.config.max_level);
        if self.level >= self.config.max_level {
            self.level = self.config.max_level;
            self.phase = PressurePhase::Critical;
            log::debug!("pressure reached critical");
            self.events.push(GameEvent::PressureCritical);
        }
    }

    /// External grace expiry; ends grace early if it is still running
    pub fn grace_timer_expired(&mut self) {
        if self.phase == PressurePhase::Grace {
            self.end_grace();
        }
    }

    fn end_grace(&mut self) {
        self.phase = PressurePhase::Rising;
        log::debug!("grace ended after {}ms", self.grace_elapsed_ms);
        self.events.push(GameEvent::GraceEnded);
    }

    /// Lower the gauge for `lines` cleared rows; returns the amount removed
    ///
    /// No effect once Critical.
    pub fn lower_for_lines(&mut self, lines: u32) -> f64 {
        if lines == 0 || self.phase == PressurePhase::Critical {
            return 0.0;
        }
        let requested = (lines as f64 * self.config.lower_per_line).max(0.0);
        let new_level = (self.level - requested).clamp(0.0, self.config.max_level);
        let amount = self.level - new_level;
        self.level = new_level;
        if amount > 0.0 {
            self.events.push(GameEvent::PressureLowered {
                amount,
                level: self.level,
            });
        }
        amount
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn phase(&self) -> PressurePhase {
        self.phase
    }

    pub fn is_critical(&self) -> bool {
        self.phase == PressurePhase::Critical
    }

    pub fn state(&self) -> EnvironmentalState {
        EnvironmentalState {
            level: self.level,
            max_level: self.config.max_level,
            base_rise_rate: self.base_rate,
            effective_rise_rate: self.effective_rate,
            phase: self.phase,
            grace_elapsed_ms: self.grace_elapsed_ms,
            grace_period_ms: self.grace_period_ms,
        }
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for EnvironmentalPressure {
    fn default() -> Self {
        Self::new(PressureConfig::default())
    }
}

fn sanitize_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(rate: f64) -> EnvironmentalPressure {
        let mut p = EnvironmentalPressure::default();
        p.configure(rate, Some(0));
        p.tick(0, &ModifierMap::new());
        assert_eq!(p.phase(), PressurePhase::Rising);
        p.take_events();
        p
    }

    #[test]
    fn grace_holds_level_until_period_elapses() {
        let mut p = EnvironmentalPressure::default();
        p.configure(0.5, Some(1_000));
        let none = ModifierMap::new();
        p.tick(999, &none);
        assert_eq!(p.phase(), PressurePhase::Grace);
        assert_eq!(p.level(), 0.0);
        p.tick(1, &none);
        assert_eq!(p.phase(), PressurePhase::Rising);
        assert_eq!(p.take_events(), vec![GameEvent::GraceEnded]);
    }

    #[test]
    fn external_signal_ends_grace_once() {
        let mut p = EnvironmentalPressure::default();
        p.configure(0.1, None);
        p.grace_timer_expired();
        p.grace_timer_expired();
        assert_eq!(p.phase(), PressurePhase::Rising);
        assert_eq!(p.take_events(), vec![GameEvent::GraceEnded]);
    }

    #[test]
    fn rises_at_rate_per_second_and_goes_critical_once() {
        let mut p = rising(0.25);
        let none = ModifierMap::new();
        p.tick(1_000, &none);
        assert!((p.level() - 0.25).abs() < 1e-9);
        for _ in 0..10 {
            p.tick(1_000, &none);
        }
        assert_eq!(p.level(), 1.0);
        assert!(p.is_critical());
        assert_eq!(p.take_events(), vec![GameEvent::PressureCritical]);
    }

    #[test]
    fn modifiers_scale_and_offset_the_rate() {
        let p = rising(0.1);
        let mut m = ModifierMap::new();
        m.set(ModifierKey::WaterRiseMultiplier, 2.0);
        m.set(ModifierKey::WaterRiseBonus, 0.05);
        assert!((p.effective_rate_for(&m) - 0.25).abs() < 1e-9);

        m.set(ModifierKey::WaterRiseBonus, -1.0);
        assert_eq!(p.effective_rate_for(&m), 0.0);
    }

    #[test]
    fn lowering_clamps_at_zero() {
        let mut p = rising(0.15);
        p.tick(1_000, &ModifierMap::new());
        let removed = p.lower_for_lines(4);
        assert!((removed - 0.15).abs() < 1e-9);
        assert_eq!(p.level(), 0.0);
        assert_eq!(p.lower_for_lines(1), 0.0);
        assert_eq!(p.take_events().len(), 1);
    }

    #[test]
    fn configure_resets_state() {
        let mut p = rising(1.0);
        p.tick(2_000, &ModifierMap::new());
        assert!(p.is_critical());
        p.configure(0.2, Some(5_000));
        let s = p.state();
        assert_eq!(s.level, 0.0);
        assert_eq!(s.phase, PressurePhase::Grace);
        assert_eq!(s.grace_period_ms, 5_000);
        assert_eq!(s.base_rise_rate, 0.2);
    }

    #[test]
    fn grace_overflow_counts_toward_rising() {
        let mut p = EnvironmentalPressure::default();
        p.configure(0.1, Some(1_000));
        p.tick(2_000, &ModifierMap::new());
        assert_eq!(p.phase(), PressurePhase::Rising);
        assert!((p.level() - 0.1).abs() < 1e-9);
        assert_eq!(p.take_events(), vec![GameEvent::GraceEnded]);
    }

    #[test]
    fn negative_lowering_never_raises_the_gauge() {
        let mut p = EnvironmentalPressure::new(PressureConfig {
            lower_per_line: -0.5,
            ..PressureConfig::default()
        });
        p.configure(0.2, Some(0));
        p.tick(1_000, &ModifierMap::new());
        let before = p.level();
        assert_eq!(p.lower_for_lines(2), 0.0);
        assert_eq!(p.level(), before);
        assert!(p.level() <= p.config().max_level);
    }
}
