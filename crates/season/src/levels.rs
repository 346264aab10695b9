//! Campaign level table
//!
//! Twenty levels in four worlds of five, one world per season. Every entry is
//! a `'static` record; runtime state (active hazards, wildlife, mechanics)
//! lives in the [`SeasonalDirector`](crate::SeasonalDirector).

use crate::types::{
    HazardKind, ModifierKey, Season, WildlifeBehavior, WildlifeKind, LEVELS_PER_WORLD,
};

/// Total campaign levels
pub const LEVEL_COUNT: u32 = 20;

/// Total campaign worlds
pub const WORLD_COUNT: u32 = 4;

/// When a mechanic modifier is in force
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// From level start to level end
    Always,
    /// Once play time reaches the given milliseconds
    AfterMs(u64),
    /// Once the level's cleared lines reach the count
    LinesAtLeast(u32),
    /// Once the score reaches the value
    ScoreAtLeast(u64),
    /// Random activation rolled each tick while inactive, lasting `duration_ms`
    Chance { per_minute: f64, duration_ms: u64 },
}

/// Weather that can roll in during a level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardTemplate {
    pub kind: HazardKind,
    /// Expected spawns per minute while none of this kind is active
    pub frequency_per_minute: f64,
    pub duration_ms: u64,
    /// Peak intensity in [0, 1]
    pub intensity: f64,
}

/// Creatures that can cross the field during a level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WildlifeTemplate {
    pub kind: WildlifeKind,
    pub spawn_rate_per_minute: f64,
    pub behavior: WildlifeBehavior,
    pub lifespan_ms: u64,
    /// Horizontal speed in cells per second
    pub speed: f64,
}

/// A named rule change with an optional trigger
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MechanicTemplate {
    pub name: &'static str,
    pub trigger: Trigger,
    pub effects: &'static [(ModifierKey, f64)],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelDefinition {
    /// 1-based, campaign order
    pub id: u32,
    pub name: &'static str,
    pub season: Season,
    pub target_lines: u32,
    /// Gravity interval at difficulty level 1
    pub base_drop_interval_ms: u32,
    /// Flood gauge units per second
    pub rise_rate: f64,
    /// Replaces the default grace period
    pub grace_override_ms: Option<u64>,
    /// Finishing under this earns the time star
    pub star_time_ms: u64,
    pub hazards: &'static [HazardTemplate],
    pub wildlife: &'static [WildlifeTemplate],
    pub mechanics: &'static [MechanicTemplate],
}

impl LevelDefinition {
    pub fn world(&self) -> u32 {
        self.season.world()
    }

    /// Whether this is the final level of its world
    pub fn is_world_finale(&self) -> bool {
        self.id % LEVELS_PER_WORLD == 0
    }
}

/// Modifier a hazard applies at the given intensity
pub fn hazard_effect(kind: HazardKind, intensity: f64) -> (ModifierKey, f64) {
    let i = intensity.clamp(0.0, 1.0);
    match kind {
        HazardKind::Rainstorm => (ModifierKey::WaterRiseBonus, 0.02 * i),
        HazardKind::Heatwave => (ModifierKey::DropSpeedMultiplier, 1.0 + 0.5 * i),
        HazardKind::Windstorm => (ModifierKey::InputDelayMs, 100.0 * i),
        HazardKind::Blizzard => (ModifierKey::InputDelayMs, 200.0 * i),
    }
}

// Hazards

const SPRING_SHOWERS: &[HazardTemplate] = &[HazardTemplate {
    kind: HazardKind::Rainstorm,
    frequency_per_minute: 0.5,
    duration_ms: 15_000,
    intensity: 0.4,
}];

const SPRING_STORMS: &[HazardTemplate] = &[HazardTemplate {
    kind: HazardKind::Rainstorm,
    frequency_per_minute: 1.0,
    duration_ms: 20_000,
    intensity: 0.7,
}];

const SUMMER_HEAT: &[HazardTemplate] = &[HazardTemplate {
    kind: HazardKind::Heatwave,
    frequency_per_minute: 0.75,
    duration_ms: 20_000,
    intensity: 0.5,
}];

const SUMMER_SCORCH: &[HazardTemplate] = &[
    HazardTemplate {
        kind: HazardKind::Heatwave,
        frequency_per_minute: 1.0,
        duration_ms: 25_000,
        intensity: 0.8,
    },
    HazardTemplate {
        kind: HazardKind::Rainstorm,
        frequency_per_minute: 0.5,
        duration_ms: 10_000,
        intensity: 0.6,
    },
];

const AUTUMN_WIND: &[HazardTemplate] = &[
    HazardTemplate {
        kind: HazardKind::Windstorm,
        frequency_per_minute: 1.0,
        duration_ms: 15_000,
        intensity: 0.6,
    },
    HazardTemplate {
        kind: HazardKind::Rainstorm,
        frequency_per_minute: 0.75,
        duration_ms: 20_000,
        intensity: 0.6,
    },
];

const WINTER_SNOW: &[HazardTemplate] = &[HazardTemplate {
    kind: HazardKind::Blizzard,
    frequency_per_minute: 1.0,
    duration_ms: 20_000,
    intensity: 0.6,
}];

const WINTER_WHITEOUT: &[HazardTemplate] = &[
    HazardTemplate {
        kind: HazardKind::Blizzard,
        frequency_per_minute: 1.5,
        duration_ms: 25_000,
        intensity: 0.9,
    },
    HazardTemplate {
        kind: HazardKind::Windstorm,
        frequency_per_minute: 1.0,
        duration_ms: 15_000,
        intensity: 0.7,
    },
];

// Wildlife

const FROG: WildlifeTemplate = WildlifeTemplate {
    kind: WildlifeKind::Frog,
    spawn_rate_per_minute: 2.0,
    behavior: WildlifeBehavior::Hop,
    lifespan_ms: 12_000,
    speed: 1.5,
};

const FIRST_FROGS: &[WildlifeTemplate] = &[FROG];

const SPRING_CRITTERS: &[WildlifeTemplate] = &[
    FROG,
    WildlifeTemplate {
        kind: WildlifeKind::Duck,
        spawn_rate_per_minute: 1.0,
        behavior: WildlifeBehavior::Drift,
        lifespan_ms: 15_000,
        speed: 0.8,
    },
];

const SUMMER_CRITTERS: &[WildlifeTemplate] = &[
    WildlifeTemplate {
        kind: WildlifeKind::Dragonfly,
        spawn_rate_per_minute: 3.0,
        behavior: WildlifeBehavior::Glide,
        lifespan_ms: 8_000,
        speed: 3.0,
    },
    WildlifeTemplate {
        kind: WildlifeKind::Salmon,
        spawn_rate_per_minute: 1.0,
        behavior: WildlifeBehavior::Hop,
        lifespan_ms: 10_000,
        speed: 2.0,
    },
];

const AUTUMN_CRITTERS: &[WildlifeTemplate] = &[
    WildlifeTemplate {
        kind: WildlifeKind::Crow,
        spawn_rate_per_minute: 2.0,
        behavior: WildlifeBehavior::Glide,
        lifespan_ms: 10_000,
        speed: 2.5,
    },
    WildlifeTemplate {
        kind: WildlifeKind::Goose,
        spawn_rate_per_minute: 1.0,
        behavior: WildlifeBehavior::Drift,
        lifespan_ms: 14_000,
        speed: 1.2,
    },
];

const WINTER_CRITTERS: &[WildlifeTemplate] = &[
    WildlifeTemplate {
        kind: WildlifeKind::Hare,
        spawn_rate_per_minute: 1.5,
        behavior: WildlifeBehavior::Hop,
        lifespan_ms: 10_000,
        speed: 2.5,
    },
    WildlifeTemplate {
        kind: WildlifeKind::Owl,
        spawn_rate_per_minute: 0.5,
        behavior: WildlifeBehavior::Glide,
        lifespan_ms: 16_000,
        speed: 1.0,
    },
];

// Mechanics

const APRIL_SHOWERS: MechanicTemplate = MechanicTemplate {
    name: "April Showers",
    trigger: Trigger::Chance {
        per_minute: 1.0,
        duration_ms: 20_000,
    },
    effects: &[(ModifierKey::WaterRiseMultiplier, 1.5)],
};

const LONG_DAYS: MechanicTemplate = MechanicTemplate {
    name: "Long Days",
    trigger: Trigger::Always,
    effects: &[(ModifierKey::ScoreMultiplier, 1.1)],
};

const HEAT_SHIMMER: MechanicTemplate = MechanicTemplate {
    name: "Heat Shimmer",
    trigger: Trigger::AfterMs(60_000),
    effects: &[(ModifierKey::DropSpeedMultiplier, 1.15)],
};

const HARVEST: MechanicTemplate = MechanicTemplate {
    name: "Harvest",
    trigger: Trigger::LinesAtLeast(10),
    effects: &[(ModifierKey::ScoreMultiplier, 1.25)],
};

const GUSTS: MechanicTemplate = MechanicTemplate {
    name: "Gusts",
    trigger: Trigger::Chance {
        per_minute: 1.5,
        duration_ms: 10_000,
    },
    effects: &[(ModifierKey::InputDelayMs, 60.0)],
};

const FROSTBITE: MechanicTemplate = MechanicTemplate {
    name: "Frostbite",
    trigger: Trigger::Always,
    effects: &[(ModifierKey::InputDelayMs, 40.0)],
};

const THIN_ICE: MechanicTemplate = MechanicTemplate {
    name: "Thin Ice",
    trigger: Trigger::ScoreAtLeast(5_000),
    effects: &[(ModifierKey::DropSpeedMultiplier, 1.25)],
};

const THAW: MechanicTemplate = MechanicTemplate {
    name: "Thaw",
    trigger: Trigger::LinesAtLeast(30),
    effects: &[
        (ModifierKey::WaterRiseMultiplier, 0.5),
        (ModifierKey::ScoreMultiplier, 1.5),
    ],
};

static LEVELS: [LevelDefinition; LEVEL_COUNT as usize] = [
    // Spring
    LevelDefinition {
        id: 1,
        name: "First Thaw",
        season: Season::Spring,
        target_lines: 5,
        base_drop_interval_ms: 1000,
        rise_rate: 0.004,
        grace_override_ms: Some(20_000),
        star_time_ms: 90_000,
        hazards: &[],
        wildlife: FIRST_FROGS,
        mechanics: &[],
    },
    LevelDefinition {
        id: 2,
        name: "Meltwater",
        season: Season::Spring,
        target_lines: 8,
        base_drop_interval_ms: 960,
        rise_rate: 0.005,
        grace_override_ms: Some(15_000),
        star_time_ms: 120_000,
        hazards: SPRING_SHOWERS,
        wildlife: SPRING_CRITTERS,
        mechanics: &[],
    },
    LevelDefinition {
        id: 3,
        name: "Budding Banks",
        season: Season::Spring,
        target_lines: 10,
        base_drop_interval_ms: 930,
        rise_rate: 0.006,
        grace_override_ms: None,
        star_time_ms: 150_000,
        hazards: SPRING_SHOWERS,
        wildlife: SPRING_CRITTERS,
        mechanics: &[APRIL_SHOWERS],
    },
    LevelDefinition {
        id: 4,
        name: "Swollen Creek",
        season: Season::Spring,
        target_lines: 12,
        base_drop_interval_ms: 900,
        rise_rate: 0.007,
        grace_override_ms: None,
        star_time_ms: 180_000,
        hazards: SPRING_STORMS,
        wildlife: SPRING_CRITTERS,
        mechanics: &[APRIL_SHOWERS],
    },
    LevelDefinition {
        id: 5,
        name: "Spring Flood",
        season: Season::Spring,
        target_lines: 15,
        base_drop_interval_ms: 870,
        rise_rate: 0.008,
        grace_override_ms: None,
        star_time_ms: 210_000,
        hazards: SPRING_STORMS,
        wildlife: SPRING_CRITTERS,
        mechanics: &[APRIL_SHOWERS],
    },
    // Summer
    LevelDefinition {
        id: 6,
        name: "Still Pond",
        season: Season::Summer,
        target_lines: 15,
        base_drop_interval_ms: 850,
        rise_rate: 0.009,
        grace_override_ms: None,
        star_time_ms: 200_000,
        hazards: SUMMER_HEAT,
        wildlife: SUMMER_CRITTERS,
        mechanics: &[LONG_DAYS],
    },
    LevelDefinition {
        id: 7,
        name: "Lazy River",
        season: Season::Summer,
        target_lines: 17,
        base_drop_interval_ms: 830,
        rise_rate: 0.010,
        grace_override_ms: None,
        star_time_ms: 220_000,
        hazards: SUMMER_HEAT,
        wildlife: SUMMER_CRITTERS,
        mechanics: &[LONG_DAYS],
    },
    LevelDefinition {
        id: 8,
        name: "Dog Days",
        season: Season::Summer,
        target_lines: 19,
        base_drop_interval_ms: 800,
        rise_rate: 0.011,
        grace_override_ms: None,
        star_time_ms: 240_000,
        hazards: SUMMER_HEAT,
        wildlife: SUMMER_CRITTERS,
        mechanics: &[LONG_DAYS, HEAT_SHIMMER],
    },
    LevelDefinition {
        id: 9,
        name: "Monsoon Edge",
        season: Season::Summer,
        target_lines: 21,
        base_drop_interval_ms: 780,
        rise_rate: 0.012,
        grace_override_ms: None,
        star_time_ms: 270_000,
        hazards: SUMMER_SCORCH,
        wildlife: SUMMER_CRITTERS,
        mechanics: &[LONG_DAYS, HEAT_SHIMMER],
    },
    LevelDefinition {
        id: 10,
        name: "High Summer",
        season: Season::Summer,
        target_lines: 24,
        base_drop_interval_ms: 760,
        rise_rate: 0.013,
        grace_override_ms: None,
        star_time_ms: 300_000,
        hazards: SUMMER_SCORCH,
        wildlife: SUMMER_CRITTERS,
        mechanics: &[LONG_DAYS, HEAT_SHIMMER],
    },
    // Autumn
    LevelDefinition {
        id: 11,
        name: "Falling Leaves",
        season: Season::Autumn,
        target_lines: 20,
        base_drop_interval_ms: 750,
        rise_rate: 0.014,
        grace_override_ms: None,
        star_time_ms: 240_000,
        hazards: AUTUMN_WIND,
        wildlife: AUTUMN_CRITTERS,
        mechanics: &[HARVEST],
    },
    LevelDefinition {
        id: 12,
        name: "Cider Mill",
        season: Season::Autumn,
        target_lines: 22,
        base_drop_interval_ms: 720,
        rise_rate: 0.015,
        grace_override_ms: None,
        star_time_ms: 260_000,
        hazards: AUTUMN_WIND,
        wildlife: AUTUMN_CRITTERS,
        mechanics: &[HARVEST],
    },
    LevelDefinition {
        id: 13,
        name: "Gale Warning",
        season: Season::Autumn,
        target_lines: 25,
        base_drop_interval_ms: 700,
        rise_rate: 0.016,
        grace_override_ms: None,
        star_time_ms: 290_000,
        hazards: AUTUMN_WIND,
        wildlife: AUTUMN_CRITTERS,
        mechanics: &[HARVEST, GUSTS],
    },
    LevelDefinition {
        id: 14,
        name: "Migration",
        season: Season::Autumn,
        target_lines: 27,
        base_drop_interval_ms: 680,
        rise_rate: 0.017,
        grace_override_ms: None,
        star_time_ms: 310_000,
        hazards: AUTUMN_WIND,
        wildlife: AUTUMN_CRITTERS,
        mechanics: &[HARVEST, GUSTS],
    },
    LevelDefinition {
        id: 15,
        name: "Equinox Tide",
        season: Season::Autumn,
        target_lines: 30,
        base_drop_interval_ms: 660,
        rise_rate: 0.018,
        grace_override_ms: None,
        star_time_ms: 340_000,
        hazards: AUTUMN_WIND,
        wildlife: AUTUMN_CRITTERS,
        mechanics: &[HARVEST, GUSTS],
    },
    // Winter
    LevelDefinition {
        id: 16,
        name: "First Frost",
        season: Season::Winter,
        target_lines: 25,
        base_drop_interval_ms: 660,
        rise_rate: 0.019,
        grace_override_ms: None,
        star_time_ms: 300_000,
        hazards: WINTER_SNOW,
        wildlife: WINTER_CRITTERS,
        mechanics: &[FROSTBITE],
    },
    LevelDefinition {
        id: 17,
        name: "Frozen Marsh",
        season: Season::Winter,
        target_lines: 28,
        base_drop_interval_ms: 640,
        rise_rate: 0.020,
        grace_override_ms: None,
        star_time_ms: 330_000,
        hazards: WINTER_SNOW,
        wildlife: WINTER_CRITTERS,
        mechanics: &[FROSTBITE],
    },
    LevelDefinition {
        id: 18,
        name: "Ice Jam",
        season: Season::Winter,
        target_lines: 32,
        base_drop_interval_ms: 620,
        rise_rate: 0.022,
        grace_override_ms: None,
        star_time_ms: 370_000,
        hazards: WINTER_WHITEOUT,
        wildlife: WINTER_CRITTERS,
        mechanics: &[FROSTBITE, THIN_ICE],
    },
    LevelDefinition {
        id: 19,
        name: "Long Night",
        season: Season::Winter,
        target_lines: 36,
        base_drop_interval_ms: 610,
        rise_rate: 0.023,
        grace_override_ms: None,
        star_time_ms: 400_000,
        hazards: WINTER_WHITEOUT,
        wildlife: WINTER_CRITTERS,
        mechanics: &[FROSTBITE, THIN_ICE],
    },
    LevelDefinition {
        id: 20,
        name: "Deep Winter",
        season: Season::Winter,
        target_lines: 40,
        base_drop_interval_ms: 600,
        rise_rate: 0.025,
        grace_override_ms: None,
        star_time_ms: 450_000,
        hazards: WINTER_WHITEOUT,
        wildlife: WINTER_CRITTERS,
        mechanics: &[FROSTBITE, THIN_ICE, THAW],
    },
];

/// The whole campaign in order
pub fn levels() -> &'static [LevelDefinition] {
    &LEVELS
}

/// Look up a level by its 1-based id
pub fn level(id: u32) -> Option<&'static LevelDefinition> {
    id.checked_sub(1).and_then(|i| LEVELS.get(i as usize))
}

/// The hardest level, used as the base for endless play
pub fn final_level() -> &'static LevelDefinition {
    &LEVELS[LEVELS.len() - 1]
}

/// Levels belonging to a 1-based world number
pub fn levels_in_world(world: u32) -> impl Iterator<Item = &'static LevelDefinition> {
    LEVELS.iter().filter(move |l| l.world() == world)
}
