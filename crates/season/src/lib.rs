//! Seasonal layer: the flood gauge, the campaign level table and the director
//! that runs each level's weather, wildlife and rule changes.

pub use floodline_types as types;

pub mod director;
pub mod levels;
pub mod pressure;

pub use director::{
    per_tick, ActiveHazard, ActiveWildlife, DirectorConfig, MechanicContext, SeasonError,
    SeasonalDirector,
};
pub use levels::{
    final_level, hazard_effect, level, levels, levels_in_world, HazardTemplate, LevelDefinition,
    MechanicTemplate, Trigger, WildlifeTemplate, LEVEL_COUNT, WORLD_COUNT,
};
pub use pressure::{EnvironmentalPressure, EnvironmentalState, PressureConfig, PressurePhase};
