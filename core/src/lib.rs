#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Soul Collector engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation layers to react to deterministically. Systems consume event
//! streams, query immutable snapshots, and respond exclusively with new
//! command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Soul Collector.";

/// Phase of the play session, mirroring the menus a presentation layer shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// No board is active; the grid is empty.
    Menu,
    /// The player may move and the turret may fire.
    Playing,
    /// Simulation time is frozen and player input is ignored.
    Paused,
    /// A projectile landed on the player.
    GameOver,
    /// Every collectable was picked up.
    GameWon,
}

impl SessionPhase {
    /// Reports whether the phase ends the session.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::GameWon)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Builds a fresh board and places collectables, obstacles and the player.
    NewGame,
    /// Discards the board and returns to the menu phase.
    ClearGrid,
    /// Freezes or resumes the session.
    SetPaused {
        /// Whether the session should be paused.
        paused: bool,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the player advance a single step in the given direction.
    MovePlayer {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Toggles the gate that keeps player movement and firing exclusive.
    SuspendInput {
        /// Whether player input should be ignored.
        suspended: bool,
    },
    /// Reveals a target marker above the provided tile.
    ShowMarker {
        /// Tile the turret intends to hit.
        target: Coordinate,
    },
    /// Announces that a projectile left the turret.
    LaunchProjectile {
        /// Tile the projectile is travelling towards.
        target: Coordinate,
    },
    /// Resolves a projectile arrival: player death check first, then damage.
    ResolveImpact {
        /// Tile the projectile landed on.
        target: Coordinate,
        /// Health removed from the tile.
        damage: u32,
    },
    /// Removes a tile from the board. Absent tiles are ignored.
    DiscardTile {
        /// Tile to remove.
        coordinate: Coordinate,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a new board was generated and the session is playing.
    SessionStarted {
        /// Cell the player spawned on.
        player: Coordinate,
        /// Number of collectables placed on the board.
        collectables: u32,
    },
    /// Reports that a new board could not be generated.
    SessionRejected {
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that the board was discarded.
    GridCleared,
    /// Announces that the session was paused or resumed.
    PauseChanged {
        /// Whether the session is now paused.
        paused: bool,
    },
    /// Confirms that the player moved between two cells.
    PlayerMoved {
        /// Cell the player occupied before moving.
        from: Coordinate,
        /// Cell the player occupies after moving.
        to: Coordinate,
    },
    /// Reports that a movement request was refused.
    PlayerMoveRejected {
        /// Direction of the refused step.
        direction: Direction,
        /// Specific reason the step was refused.
        reason: MoveRejection,
    },
    /// Confirms that the player picked up a collectable.
    CollectablePicked {
        /// Cell the collectable occupied.
        coordinate: Coordinate,
    },
    /// Reports the latest score for the score bar.
    ScoreChanged {
        /// Collectables picked up so far.
        current: u32,
        /// Collectables required to win.
        goal: u32,
    },
    /// Announces a change of the player input gate.
    InputSuspensionChanged {
        /// Whether player input is now ignored.
        suspended: bool,
    },
    /// A target marker became visible.
    MarkerShown {
        /// Tile under the marker.
        target: Coordinate,
    },
    /// A target marker was removed.
    MarkerHidden {
        /// Tile under the marker.
        target: Coordinate,
    },
    /// A projectile left the turret.
    ProjectileLaunched {
        /// Tile the projectile is travelling towards.
        target: Coordinate,
    },
    /// A tile lost health without being destroyed.
    TileDamaged {
        /// Tile that was hit.
        coordinate: Coordinate,
        /// Remaining health of the tile.
        health: Health,
    },
    /// A tile reached zero health and no longer supports the player.
    TileDestroyed {
        /// Tile that was destroyed.
        coordinate: Coordinate,
    },
    /// A tile was physically removed from the board.
    TileRemoved {
        /// Tile that was removed.
        coordinate: Coordinate,
    },
    /// Presentation should shake the camera.
    CameraShakeRequested,
    /// A projectile landed on the player and the session ended.
    GameOver {
        /// Cell the projectile landed on.
        impact: Coordinate,
    },
    /// Every collectable was picked up and the session ended.
    GameWon {
        /// Final score.
        score: u32,
    },
    /// A mutating command referenced a coordinate outside the board.
    CommandRejected {
        /// Offending coordinate.
        coordinate: Coordinate,
    },
}

/// Reasons a player movement request may be refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveRejection {
    /// The session is not in the playing phase.
    NotPlaying,
    /// A firing sequence currently owns control.
    InputSuspended,
    /// The destination is out of bounds or has no live tile.
    Untraversable,
}

/// Cardinal movement directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward increasing `z`.
    North,
    /// Movement toward increasing `x`.
    East,
    /// Movement toward decreasing `z`.
    South,
    /// Movement toward decreasing `x`.
    West,
}

impl Direction {
    /// All directions in a fixed order.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Unit offset applied to a coordinate when stepping in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }
}

/// Location of a single board cell. Ordered by `x`, then `z`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    x: i32,
    z: i32,
}

impl Coordinate {
    /// Creates a new board coordinate.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Depth of the cell.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Neighbouring coordinate one step away in `direction`.
    ///
    /// Saturates at the edges of the `i32` range so callers never overflow.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dz) = direction.offset();
        Self {
            x: self.x.saturating_add(dx),
            z: self.z.saturating_add(dz),
        }
    }
}

/// Health carried by a tile.
///
/// `Invulnerable` orders above every damageable value, so a sort by health
/// always ranks protected tiles last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Health {
    /// Damageable health points.
    Points(u32),
    /// The tile cannot be damaged.
    Invulnerable,
}

impl Health {
    /// Remaining damageable points, or `None` for invulnerable tiles.
    #[must_use]
    pub const fn points(self) -> Option<u32> {
        match self {
            Self::Points(points) => Some(points),
            Self::Invulnerable => None,
        }
    }

    /// Reports whether the tile can never be damaged.
    #[must_use]
    pub const fn is_invulnerable(self) -> bool {
        matches!(self, Self::Invulnerable)
    }
}

/// Immutable representation of a single tile used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSnapshot {
    /// Cell the tile occupies.
    pub coordinate: Coordinate,
    /// Health the tile has left.
    pub health: Health,
    /// Whether the tile has been destroyed but not yet removed.
    pub destroyed: bool,
}

impl TileSnapshot {
    /// Reports whether the turret may pick this tile as a target.
    #[must_use]
    pub const fn is_targetable(&self) -> bool {
        !self.destroyed && !self.health.is_invulnerable()
    }
}

/// Read-only snapshot describing every tile on the board.
#[derive(Clone, Debug, Default)]
pub struct TileView {
    snapshots: Vec<TileSnapshot>,
}

impl TileView {
    /// Creates a new tile view, ordering snapshots by coordinate.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.coordinate);
        Self { snapshots }
    }

    /// Iterator over the captured tiles in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of tiles captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TileSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of the player used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerSnapshot {
    /// Cell the player stands on.
    pub coordinate: Coordinate,
    /// Direction the player faces.
    pub facing: Direction,
    /// Whether the player survived so far.
    pub alive: bool,
}

/// Ordering algorithm the target selector uses to rank tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    /// Adjacent exchange passes that stop once a pass makes no swap.
    ExchangeSort,
    /// Sequential insertion into the sorted prefix.
    #[default]
    InsertionSort,
}

/// Reasons a new board could not be populated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum PlacementError {
    /// More entities were requested than traversable cells exist.
    #[error("cannot place {required} entities on {available} traversable cells")]
    InsufficientSpace {
        /// Collectables, obstacles and the player combined.
        required: u32,
        /// Traversable cells on the freshly generated board.
        available: u32,
    },
}

/// Reasons a configuration is refused before a session starts.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The board must have at least one cell.
    #[error("grid size must be at least 1")]
    ZeroGridSize,
    /// The board side does not fit the signed coordinate space.
    #[error("grid size {0} exceeds the coordinate range")]
    GridTooLarge(u32),
    /// The board holds more cells than a session may allocate.
    #[error("board of {cells} cells exceeds the limit of {limit}")]
    TooManyCells {
        /// Cells the configured board would hold.
        cells: u64,
        /// Largest accepted number of cells.
        limit: u64,
    },
    /// Tiles need at least one health point.
    #[error("max tile health must be at least 1")]
    ZeroMaxTileHealth,
    /// The turret needs at least one step between volleys.
    #[error("steps per shot must be at least 1")]
    ZeroStepsPerShot,
    /// Hits must remove health.
    #[error("damage per hit must be at least 1")]
    ZeroDamage,
    /// Projectiles must make progress every tick.
    #[error("projectile speed must be a positive finite number, got {0}")]
    InvalidProjectileSpeed(f32),
}

/// Tunables of the turret and its projectile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TurretConfig {
    /// World-space position of the barrel, cells are one unit apart.
    pub position: [f32; 3],
    /// Delay before each target marker is revealed.
    pub reveal_interval_ms: u64,
    /// Delay before each projectile launch.
    pub launch_interval_ms: u64,
    /// Fraction of the flight covered per second.
    pub projectile_speed: f32,
    /// Apex height of the projectile arc.
    pub arc_height: f32,
}

impl TurretConfig {
    /// Delay before each target marker is revealed.
    #[must_use]
    pub const fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_interval_ms)
    }

    /// Delay before each projectile launch.
    #[must_use]
    pub const fn launch_interval(&self) -> Duration {
        Duration::from_millis(self.launch_interval_ms)
    }
}

impl Default for TurretConfig {
    fn default() -> Self {
        Self {
            position: [2.0, 1.0, -2.0],
            reveal_interval_ms: 400,
            launch_interval_ms: 250,
            projectile_speed: 1.0,
            arc_height: 3.0,
        }
    }
}

/// Session configuration, fixed once a game starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Width and depth of the square board.
    pub grid_size: u32,
    /// Collectables placed on the board; also the winning score.
    pub collectables: u32,
    /// Tiles removed before play starts.
    pub obstacles: u32,
    /// Upper bound of the random starting tile health.
    pub max_tile_health: u32,
    /// Player steps between two volleys.
    pub steps_per_shot: u32,
    /// Upper bound of targets per volley.
    pub shots_per_round: u32,
    /// Algorithm used to rank targets.
    pub sort_strategy: SortStrategy,
    /// Health removed by each projectile.
    pub damage_per_hit: u32,
    /// Seed of the board generator.
    pub seed: u64,
    /// Removes the tile the player steps off, as the board collapses behind them.
    pub collapse_on_leave: bool,
    /// Turret tunables.
    pub turret: TurretConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 5,
            collectables: 5,
            obstacles: 3,
            max_tile_health: 3,
            steps_per_shot: 3,
            shots_per_round: 3,
            sort_strategy: SortStrategy::default(),
            damage_per_hit: 1,
            seed: 0x5eed_c011_ec70_0001,
            collapse_on_leave: false,
            turret: TurretConfig::default(),
        }
    }
}

impl GameConfig {
    /// Largest board, in cells, a session will generate.
    pub const MAX_CELLS: u64 = 1 << 20;

    /// Checks the configuration for values the simulation cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::ZeroGridSize);
        }
        if i32::try_from(self.grid_size).is_err() {
            return Err(ConfigError::GridTooLarge(self.grid_size));
        }
        if self.cell_count() > Self::MAX_CELLS {
            return Err(ConfigError::TooManyCells {
                cells: self.cell_count(),
                limit: Self::MAX_CELLS,
            });
        }
        if self.max_tile_health == 0 {
            return Err(ConfigError::ZeroMaxTileHealth);
        }
        if self.steps_per_shot == 0 {
            return Err(ConfigError::ZeroStepsPerShot);
        }
        if self.damage_per_hit == 0 {
            return Err(ConfigError::ZeroDamage);
        }
        let speed = self.turret.projectile_speed;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ConfigError::InvalidProjectileSpeed(speed));
        }
        Ok(())
    }

    /// Number of cells on the board.
    #[must_use]
    pub fn cell_count(&self) -> u64 {
        u64::from(self.grid_size) * u64::from(self.grid_size)
    }
}
