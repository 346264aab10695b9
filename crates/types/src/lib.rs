//! Core types module - shared data structures and constants
//!
//! This module defines the vocabulary shared by every Floodline crate. All types
//! are plain data with no external dependencies, so they can be used by the
//! simulation core, the seasonal layer, persistence and any presentation layer.
//!
//! # Board Dimensions
//!
//! - **Width**: 10 columns (indexed 0-9)
//! - **Height**: 20 rows (indexed 0-19, top to bottom)
//! - **Spawn**: pieces spawn horizontally centered on row 0
//!
//! # Timing Constants
//!
//! All timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Reference fixed timestep (~60 FPS) |
//! | `BASE_DROP_MS` | 1000 | Gravity interval at level 1 |
//! | `DROP_INTERVAL_FLOOR_MS` | 100 | Fastest gravity interval |
//! | `DEFAULT_GRACE_MS` | 10000 | Flood grace period when a level sets none |
//!
//! # Examples
//!
//! ```
//! use floodline_types::{GameAction, PieceKind, Rotation, BOARD_HEIGHT, BOARD_WIDTH};
//!
//! let piece = PieceKind::from_str("t").unwrap();
//! assert_eq!(piece, PieceKind::T);
//! assert_eq!(piece.color_id(), 3);
//!
//! assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
//! assert_eq!(GameAction::from_str("hardDrop"), Some(GameAction::HardDrop));
//!
//! assert_eq!(BOARD_WIDTH, 10);
//! assert_eq!(BOARD_HEIGHT, 20);
//! ```

use std::collections::BTreeMap;

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Board height in cells (20 rows)
pub const BOARD_HEIGHT: u8 = 20;

/// Reference fixed timestep in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Gravity interval at level 1 (1000ms = 1 row per second)
pub const BASE_DROP_MS: u32 = 1000;

/// Per-level geometric decay applied to the gravity interval
pub const DROP_DECAY_RATE: f64 = 0.85;

/// Gravity interval never drops below this
pub const DROP_INTERVAL_FLOOR_MS: u32 = 100;

/// Lines needed to advance one level
pub const LINES_PER_LEVEL: u32 = 10;

/// Level a fresh session starts on
pub const STARTING_LEVEL: u32 = 1;

/// Line clear base points, indexed by simultaneous lines cleared (0-4)
///
/// The final entry (4 lines) also earns a bonus of half its base value.
pub const LINE_SCORES: [u32; 5] = [0, 100, 300, 500, 800];

/// Points per row descended by a soft drop
pub const SOFT_DROP_POINTS: u32 = 1;

/// Points per row descended by a hard drop
pub const HARD_DROP_POINTS: u32 = 2;

/// Upper bound of the flood gauge
pub const PRESSURE_MAX: f64 = 1.0;

/// Flood gauge drop per cleared line
pub const PRESSURE_LOWER_PER_LINE: f64 = 0.10;

/// Grace period used when a level does not override it
pub const DEFAULT_GRACE_MS: u64 = 10_000;

/// Maximum width/height of any piece shape matrix
pub const MAX_SHAPE_DIM: u8 = 4;

/// Levels per world in the campaign table
pub const LEVELS_PER_WORLD: u32 = 5;

/// Maximum entries kept in the historical score list
pub const SCORE_HISTORY_CAPACITY: usize = 100;

/// A cell on the game board
///
/// - `0`: empty
/// - anything else: the color id of the piece that was placed there
pub type Cell = u8;

/// Color id of an empty cell
pub const EMPTY_CELL: Cell = 0;

/// The seven tetromino piece kinds
///
/// Each kind has a fixed color id used when it is merged into the board:
/// I=1, O=2, T=3, S=4, Z=5, J=6, L=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    /// All kinds in catalog order
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Parse piece kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use floodline_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("O"), Some(PieceKind::O));
    /// assert_eq!(PieceKind::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "o" => Some(PieceKind::O),
            "t" => Some(PieceKind::T),
            "s" => Some(PieceKind::S),
            "z" => Some(PieceKind::Z),
            "j" => Some(PieceKind::J),
            "l" => Some(PieceKind::L),
            _ => None,
        }
    }

    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::O => "o",
            PieceKind::T => "t",
            PieceKind::S => "s",
            PieceKind::Z => "z",
            PieceKind::J => "j",
            PieceKind::L => "l",
        }
    }

    /// Color id written into the board for this kind
    pub fn color_id(&self) -> Cell {
        match self {
            PieceKind::I => 1,
            PieceKind::O => 2,
            PieceKind::T => 3,
            PieceKind::S => 4,
            PieceKind::Z => 5,
            PieceKind::J => 6,
            PieceKind::L => 7,
        }
    }

    /// Reverse of [`PieceKind::color_id`]
    pub fn from_color_id(id: Cell) -> Option<Self> {
        PieceKind::ALL.iter().copied().find(|k| k.color_id() == id)
    }
}

/// Rotation states
///
/// The cycle goes North → East → South → West → North.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    North,
    East,
    South,
    West,
}

impl Rotation {
    /// Rotate clockwise (90°)
    ///
    /// ```
    /// use floodline_types::Rotation;
    ///
    /// assert_eq!(Rotation::West.rotate_cw(), Rotation::North);
    /// ```
    pub fn rotate_cw(&self) -> Self {
        match self {
            Rotation::North => Rotation::East,
            Rotation::East => Rotation::South,
            Rotation::South => Rotation::West,
            Rotation::West => Rotation::North,
        }
    }

    /// Rotate counter-clockwise (-90°)
    pub fn rotate_ccw(&self) -> Self {
        match self {
            Rotation::North => Rotation::West,
            Rotation::West => Rotation::South,
            Rotation::South => Rotation::East,
            Rotation::East => Rotation::North,
        }
    }

    /// Index into per-rotation tables (North = 0 ... West = 3)
    pub fn index(&self) -> usize {
        match self {
            Rotation::North => 0,
            Rotation::East => 1,
            Rotation::South => 2,
            Rotation::West => 3,
        }
    }

    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            Rotation::North => "north",
            Rotation::East => "east",
            Rotation::South => "south",
            Rotation::West => "west",
        }
    }
}

/// Discrete commands a presentation layer can submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Move piece one cell left
    MoveLeft,
    /// Move piece one cell right
    MoveRight,
    /// Drop piece one cell down (with soft drop scoring)
    SoftDrop,
    /// Instantly drop piece to lowest valid position
    HardDrop,
    /// Rotate piece 90° clockwise
    RotateCw,
    /// Rotate piece 90° counter-clockwise
    RotateCcw,
    /// Toggle pause state
    Pause,
    /// Restart the session
    Restart,
}

impl GameAction {
    /// Parse action from its camelCase name (case-insensitive)
    ///
    /// ```
    /// use floodline_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("moveLeft"), Some(GameAction::MoveLeft));
    /// assert_eq!(GameAction::from_str("hold"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(GameAction::MoveLeft),
            "moveright" => Some(GameAction::MoveRight),
            "softdrop" => Some(GameAction::SoftDrop),
            "harddrop" => Some(GameAction::HardDrop),
            "rotatecw" => Some(GameAction::RotateCw),
            "rotateccw" => Some(GameAction::RotateCcw),
            "pause" => Some(GameAction::Pause),
            "restart" => Some(GameAction::Restart),
            _ => None,
        }
    }

    /// Convert to camelCase name
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::MoveLeft => "moveLeft",
            GameAction::MoveRight => "moveRight",
            GameAction::SoftDrop => "softDrop",
            GameAction::HardDrop => "hardDrop",
            GameAction::RotateCw => "rotateCw",
            GameAction::RotateCcw => "rotateCcw",
            GameAction::Pause => "pause",
            GameAction::Restart => "restart",
        }
    }

    /// Whether the action moves or rotates the falling piece
    ///
    /// Only these are subject to the seasonal input delay.
    pub fn is_piece_input(&self) -> bool {
        !matches!(self, GameAction::Pause | GameAction::Restart)
    }
}

/// Campaign worlds, one per season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    /// 1-based world number
    pub fn world(&self) -> u32 {
        match self {
            Season::Spring => 1,
            Season::Summer => 2,
            Season::Autumn => 3,
            Season::Winter => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }
}

/// Weather hazards that can roll in during a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HazardKind {
    /// Raises the flood rate
    Rainstorm,
    /// Speeds up gravity
    Heatwave,
    /// Delays piece input
    Windstorm,
    /// Delays piece input heavily
    Blizzard,
}

impl HazardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HazardKind::Rainstorm => "rainstorm",
            HazardKind::Heatwave => "heatwave",
            HazardKind::Windstorm => "windstorm",
            HazardKind::Blizzard => "blizzard",
        }
    }
}

/// Ambient creatures crossing the playfield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildlifeKind {
    Frog,
    Duck,
    Dragonfly,
    Salmon,
    Crow,
    Goose,
    Hare,
    Owl,
}

impl WildlifeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WildlifeKind::Frog => "frog",
            WildlifeKind::Duck => "duck",
            WildlifeKind::Dragonfly => "dragonfly",
            WildlifeKind::Salmon => "salmon",
            WildlifeKind::Crow => "crow",
            WildlifeKind::Goose => "goose",
            WildlifeKind::Hare => "hare",
            WildlifeKind::Owl => "owl",
        }
    }
}

/// How a creature moves once spawned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildlifeBehavior {
    /// Constant horizontal velocity
    Drift,
    /// Ballistic arcs under gravity, bouncing off the floor
    Hop,
    /// Slow constant descent with horizontal drift
    Glide,
}

/// Gameplay parameters a seasonal modifier can touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModifierKey {
    /// Gravity speed factor (2.0 halves the drop interval)
    DropSpeedMultiplier,
    /// Milliseconds piece inputs are held before they apply
    InputDelayMs,
    /// Factor applied to line clear points
    ScoreMultiplier,
    /// Factor applied to the base flood rise rate
    WaterRiseMultiplier,
    /// Added to the flood rise rate (gauge units per second)
    WaterRiseBonus,
}

impl ModifierKey {
    /// Value the key has when no modifier sets it
    pub fn neutral(&self) -> f64 {
        match self {
            ModifierKey::DropSpeedMultiplier
            | ModifierKey::ScoreMultiplier
            | ModifierKey::WaterRiseMultiplier => 1.0,
            ModifierKey::InputDelayMs | ModifierKey::WaterRiseBonus => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModifierKey::DropSpeedMultiplier => "dropSpeedMultiplier",
            ModifierKey::InputDelayMs => "inputDelayMs",
            ModifierKey::ScoreMultiplier => "scoreMultiplier",
            ModifierKey::WaterRiseMultiplier => "waterRiseMultiplier",
            ModifierKey::WaterRiseBonus => "waterRiseBonus",
        }
    }
}

/// Folded view of every active seasonal effect
///
/// Later inserts win for the same key. Absent keys read as their neutral value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifierMap {
    values: BTreeMap<ModifierKey, f64>,
}

impl ModifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: ModifierKey, value: f64) {
        self.values.insert(key, value);
    }

    /// Value for `key`, or its neutral value when unset
    pub fn get(&self, key: ModifierKey) -> f64 {
        self.values.get(&key).copied().unwrap_or_else(|| key.neutral())
    }

    pub fn contains(&self, key: ModifierKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModifierKey, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn drop_speed_multiplier(&self) -> f64 {
        self.get(ModifierKey::DropSpeedMultiplier)
    }

    pub fn input_delay_ms(&self) -> u64 {
        self.get(ModifierKey::InputDelayMs).max(0.0) as u64
    }

    pub fn score_multiplier(&self) -> f64 {
        self.get(ModifierKey::ScoreMultiplier)
    }
}

/// Why a session or level ended without completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// A new piece could not spawn
    BlockedSpawn,
    /// The flood gauge reached its maximum
    Flooded,
    /// Ended by an external state update
    Aborted,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::BlockedSpawn => "blocked_spawn",
            FailureReason::Flooded => "flooded",
            FailureReason::Aborted => "aborted",
        }
    }
}

/// Notification emitted by the simulation
///
/// Events are buffered by each component during a tick and fanned out to
/// subscribers synchronously, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PieceSpawned {
        kind: Option<PieceKind>,
    },
    PiecePlaced {
        cells: u32,
    },
    /// Rows are the pre-clear indices, top to bottom
    LinesCleared {
        count: u32,
        rows: Vec<usize>,
        points: u64,
    },
    StateChanged,
    GameOver {
        reason: FailureReason,
    },
    GraceEnded,
    PressureLowered {
        amount: f64,
        level: f64,
    },
    PressureCritical,
    HazardSpawned {
        id: u32,
        kind: HazardKind,
        intensity: f64,
    },
    HazardEnded {
        id: u32,
        kind: HazardKind,
    },
    WildlifeSpawned {
        id: u32,
        kind: WildlifeKind,
    },
    WildlifeDespawned {
        id: u32,
        kind: WildlifeKind,
    },
    MechanicActivated {
        name: &'static str,
    },
    MechanicDeactivated {
        name: &'static str,
    },
    /// Narrative hook fired when a level starts
    LevelEntered {
        level: u32,
        name: &'static str,
        season: Season,
    },
    LevelCompleted {
        level: u32,
        stars: u8,
        score: u64,
        elapsed_ms: u64,
    },
    LevelFailed {
        level: u32,
        reason: FailureReason,
    },
    LevelUnlocked {
        level: u32,
    },
    WorldUnlocked {
        world: u32,
    },
    BonusUnlocked {
        name: &'static str,
    },
}

impl GameEvent {
    /// Short stable name, used for logging and filtering
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::PieceSpawned { .. } => "piece_spawned",
            GameEvent::PiecePlaced { .. } => "piece_placed",
            GameEvent::LinesCleared { .. } => "lines_cleared",
            GameEvent::StateChanged => "state_changed",
            GameEvent::GameOver { .. } => "game_over",
            GameEvent::GraceEnded => "grace_ended",
            GameEvent::PressureLowered { .. } => "pressure_lowered",
            GameEvent::PressureCritical => "pressure_critical",
            GameEvent::HazardSpawned { .. } => "hazard_spawned",
            GameEvent::HazardEnded { .. } => "hazard_ended",
            GameEvent::WildlifeSpawned { .. } => "wildlife_spawned",
            GameEvent::WildlifeDespawned { .. } => "wildlife_despawned",
            GameEvent::MechanicActivated { .. } => "mechanic_activated",
            GameEvent::MechanicDeactivated { .. } => "mechanic_deactivated",
            GameEvent::LevelEntered { .. } => "level_entered",
            GameEvent::LevelCompleted { .. } => "level_completed",
            GameEvent::LevelFailed { .. } => "level_failed",
            GameEvent::LevelUnlocked { .. } => "level_unlocked",
            GameEvent::WorldUnlocked { .. } => "world_unlocked",
            GameEvent::BonusUnlocked { .. } => "bonus_unlocked",
        }
    }
}
