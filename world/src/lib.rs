#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state management for Soul Collector.
//!
//! The [`World`] owns every tile, the player, the collectables and the score.
//! It is mutated exclusively through [`apply`], which records the resulting
//! [`Event`] values, and read through the functions in [`query`].

mod placement;
mod random;
mod score;
mod tiles;

use std::collections::BTreeSet;

use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use soul_collector_core::{
    Command, ConfigError, Coordinate, Direction, Event, GameConfig, MoveRejection,
    PlacementError, SessionPhase, WELCOME_BANNER,
};

pub use random::{take_random, RandomSource};
pub use score::ScoreTracker;
pub use tiles::{DamageOutcome, TileEntity};

use tiles::TileRegistry;

/// Direction the player faces when a session starts.
const SPAWN_FACING: Direction = Direction::North;

#[derive(Clone, Copy, Debug)]
struct Player {
    coordinate: Coordinate,
    facing: Direction,
    alive: bool,
}

/// Represents the authoritative Soul Collector board state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: GameConfig,
    grid_size: i32,
    random: Box<dyn RandomSource>,
    tiles: TileRegistry,
    pending_removals: Vec<Coordinate>,
    collectables: BTreeSet<Coordinate>,
    obstacles: BTreeSet<Coordinate>,
    markers: BTreeSet<Coordinate>,
    player: Option<Player>,
    score: ScoreTracker,
    phase: SessionPhase,
    input_suspended: bool,
}

impl World {
    /// Creates an empty world whose boards are generated from `config.seed`.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        let random = Box::new(ChaCha8Rng::seed_from_u64(config.seed));
        Self::with_random_source(config, random)
    }

    /// Creates an empty world drawing board randomness from `random`.
    pub fn with_random_source(
        config: GameConfig,
        random: Box<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid_size =
            i32::try_from(config.grid_size).map_err(|_| ConfigError::GridTooLarge(config.grid_size))?;
        Ok(Self {
            banner: WELCOME_BANNER,
            grid_size,
            random,
            tiles: TileRegistry::new(),
            pending_removals: Vec::new(),
            collectables: BTreeSet::new(),
            obstacles: BTreeSet::new(),
            markers: BTreeSet::new(),
            player: None,
            score: ScoreTracker::new(config.collectables),
            phase: SessionPhase::Menu,
            input_suspended: false,
            config,
        })
    }

    fn is_out_of_bounds(&self, coordinate: Coordinate) -> bool {
        coordinate.x() < 0
            || coordinate.x() >= self.grid_size
            || coordinate.z() < 0
            || coordinate.z() >= self.grid_size
    }

    fn can_traverse(&self, coordinate: Coordinate) -> bool {
        !self.is_out_of_bounds(coordinate) && self.tiles.is_live(coordinate)
    }

    fn is_player_at(&self, coordinate: Coordinate) -> bool {
        self.player
            .is_some_and(|player| player.alive && player.coordinate == coordinate)
    }

    fn reject_out_of_bounds(&self, coordinate: Coordinate, out_events: &mut Vec<Event>) -> bool {
        if !self.is_out_of_bounds(coordinate) {
            return false;
        }
        warn!("rejected command for out-of-bounds cell {coordinate:?}");
        out_events.push(Event::CommandRejected { coordinate });
        true
    }

    /// Turret commands only act on a board that is being played.
    fn accepts_fire(&self, target: Coordinate, out_events: &mut Vec<Event>) -> bool {
        if self.phase != SessionPhase::Playing {
            debug!("turret command for {target:?} ignored in phase {:?}", self.phase);
            return false;
        }
        !self.reject_out_of_bounds(target, out_events)
    }

    fn set_input_suspended(&mut self, suspended: bool, out_events: &mut Vec<Event>) {
        if self.input_suspended == suspended {
            return;
        }
        self.input_suspended = suspended;
        out_events.push(Event::InputSuspensionChanged { suspended });
    }

    fn hide_all_markers(&mut self, out_events: &mut Vec<Event>) {
        for target in std::mem::take(&mut self.markers) {
            out_events.push(Event::MarkerHidden { target });
        }
    }

    fn remove_tile(&mut self, coordinate: Coordinate, out_events: &mut Vec<Event>) {
        if self.tiles.remove(coordinate) {
            out_events.push(Event::TileRemoved { coordinate });
        } else {
            debug!("discard of absent tile at {coordinate:?} ignored");
        }
    }

    fn flush_pending_removals(&mut self, out_events: &mut Vec<Event>) {
        for coordinate in std::mem::take(&mut self.pending_removals) {
            if self.tiles.remove(coordinate) {
                out_events.push(Event::TileRemoved { coordinate });
            }
        }
    }

    fn reset_board(&mut self) {
        self.tiles.clear();
        self.pending_removals.clear();
        self.collectables.clear();
        self.obstacles.clear();
        self.markers.clear();
        self.player = None;
        self.score = ScoreTracker::new(self.config.collectables);
    }

    fn clear_grid(&mut self, out_events: &mut Vec<Event>) {
        self.hide_all_markers(out_events);
        self.set_input_suspended(false, out_events);
        self.reset_board();
        self.phase = SessionPhase::Menu;
        out_events.push(Event::GridCleared);
    }

    fn generate_tiles(&mut self) {
        let max_health = self.config.max_tile_health;
        for x in 0..self.grid_size {
            for z in 0..self.grid_size {
                let health = self.random.random_int(1, max_health.saturating_add(1));
                self.tiles.insert(TileEntity::new(Coordinate::new(x, z), health));
            }
        }
    }

    /// Places collectables, obstacles and the player on the live tiles.
    ///
    /// Nothing is placed when the board is too small for every entity.
    fn place_objects(&mut self, collectables: u32, obstacles: u32) -> Result<Coordinate, PlacementError> {
        let candidates = self.tiles.live_coordinates();
        let placement =
            placement::place_objects(candidates, collectables, obstacles, &mut *self.random)?;

        for coordinate in placement.collectables {
            if let Some(tile) = self.tiles.get_mut(coordinate) {
                tile.make_invulnerable();
            }
            let _ = self.collectables.insert(coordinate);
        }

        for coordinate in placement.obstacles {
            let _ = self.tiles.remove(coordinate);
            let _ = self.obstacles.insert(coordinate);
        }

        self.player = Some(Player {
            coordinate: placement.player,
            facing: SPAWN_FACING,
            alive: true,
        });
        Ok(placement.player)
    }

    fn new_game(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != SessionPhase::Menu {
            self.clear_grid(out_events);
        }

        self.generate_tiles();
        let placed = self.place_objects(self.config.collectables, self.config.obstacles);
        let player = match placed {
            Ok(player) => player,
            Err(reason) => {
                warn!("new game rejected: {reason}");
                self.reset_board();
                out_events.push(Event::SessionRejected { reason });
                return;
            }
        };

        self.phase = SessionPhase::Playing;
        info!(
            "session started: {} tiles, {} collectables, player at {player:?}",
            self.tiles.len(),
            self.collectables.len()
        );
        out_events.push(Event::SessionStarted {
            player,
            collectables: self.config.collectables,
        });
        out_events.push(Event::ScoreChanged {
            current: self.score.current(),
            goal: self.score.goal(),
        });
        self.check_collected_all(out_events);
    }

    fn set_paused(&mut self, paused: bool, out_events: &mut Vec<Event>) {
        let next = match (self.phase, paused) {
            (SessionPhase::Playing, true) => SessionPhase::Paused,
            (SessionPhase::Paused, false) => SessionPhase::Playing,
            _ => return,
        };
        self.phase = next;
        out_events.push(Event::PauseChanged { paused });
    }

    fn move_player(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        let rejection = if self.phase != SessionPhase::Playing {
            Some(MoveRejection::NotPlaying)
        } else if self.input_suspended {
            Some(MoveRejection::InputSuspended)
        } else {
            None
        };
        if let Some(reason) = rejection {
            out_events.push(Event::PlayerMoveRejected { direction, reason });
            return;
        }

        let Some(player) = self.player else {
            out_events.push(Event::PlayerMoveRejected {
                direction,
                reason: MoveRejection::NotPlaying,
            });
            return;
        };

        let from = player.coordinate;
        let to = from.step(direction);
        if !self.can_traverse(to) {
            out_events.push(Event::PlayerMoveRejected {
                direction,
                reason: MoveRejection::Untraversable,
            });
            return;
        }

        self.player = Some(Player {
            coordinate: to,
            facing: direction,
            alive: player.alive,
        });
        out_events.push(Event::PlayerMoved { from, to });

        if self.collectables.remove(&to) {
            let current = self.score.increment();
            debug!("collectable picked at {to:?}, score {current}");
            out_events.push(Event::CollectablePicked { coordinate: to });
            out_events.push(Event::CameraShakeRequested);
            out_events.push(Event::ScoreChanged {
                current,
                goal: self.score.goal(),
            });
            self.check_collected_all(out_events);
        }
    }

    fn check_collected_all(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != SessionPhase::Playing || !self.score.is_complete() {
            return;
        }
        self.phase = SessionPhase::GameWon;
        self.hide_all_markers(out_events);
        self.set_input_suspended(false, out_events);
        info!("all {} collectables picked up", self.score.goal());
        out_events.push(Event::GameWon {
            score: self.score.current(),
        });
    }

    fn resolve_impact(&mut self, target: Coordinate, damage: u32, out_events: &mut Vec<Event>) {
        if self.markers.remove(&target) {
            out_events.push(Event::MarkerHidden { target });
        }

        if self.is_player_at(target) {
            if let Some(player) = self.player.as_mut() {
                player.alive = false;
            }
            self.phase = SessionPhase::GameOver;
            self.hide_all_markers(out_events);
            self.set_input_suspended(false, out_events);
            info!("player hit at {target:?}");
            out_events.push(Event::GameOver { impact: target });
        }

        match self.tiles.get_mut(target).map(|tile| tile.take_damage(damage)) {
            Some(DamageOutcome::Damaged { health }) => {
                out_events.push(Event::TileDamaged {
                    coordinate: target,
                    health,
                });
            }
            Some(DamageOutcome::Destroyed) => {
                self.pending_removals.push(target);
                out_events.push(Event::TileDestroyed { coordinate: target });
            }
            Some(DamageOutcome::Ignored) => {
                debug!("impact at {target:?} left the tile unchanged");
            }
            None => debug!("impact at {target:?} found no tile"),
        }
        out_events.push(Event::CameraShakeRequested);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Tiles destroyed by an earlier command are removed from the board before the
/// new command runs.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    world.flush_pending_removals(out_events);

    match command {
        Command::NewGame => world.new_game(out_events),
        Command::ClearGrid => world.clear_grid(out_events),
        Command::SetPaused { paused } => world.set_paused(paused, out_events),
        Command::Tick { dt } => {
            if world.phase == SessionPhase::Playing {
                out_events.push(Event::TimeAdvanced { dt });
            }
        }
        Command::MovePlayer { direction } => world.move_player(direction, out_events),
        Command::SuspendInput { suspended } => {
            if suspended && world.phase != SessionPhase::Playing {
                debug!("input suspension ignored outside of play");
                return;
            }
            world.set_input_suspended(suspended, out_events);
        }
        Command::ShowMarker { target } => {
            if !world.accepts_fire(target, out_events) {
                return;
            }
            if world.markers.insert(target) {
                out_events.push(Event::MarkerShown { target });
            }
        }
        Command::LaunchProjectile { target } => {
            if !world.accepts_fire(target, out_events) {
                return;
            }
            out_events.push(Event::ProjectileLaunched { target });
        }
        Command::ResolveImpact { target, damage } => {
            if !world.accepts_fire(target, out_events) {
                return;
            }
            world.resolve_impact(target, damage, out_events);
        }
        Command::DiscardTile { coordinate } => {
            if world.reject_out_of_bounds(coordinate, out_events) {
                return;
            }
            world.remove_tile(coordinate, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use soul_collector_core::{
        Coordinate, GameConfig, PlayerSnapshot, SessionPhase, TileSnapshot, TileView,
    };

    use super::{ScoreTracker, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Current session phase.
    #[must_use]
    pub fn phase(world: &World) -> SessionPhase {
        world.phase
    }

    /// Whether player movement is currently blocked by a firing sequence.
    #[must_use]
    pub fn input_suspended(world: &World) -> bool {
        world.input_suspended
    }

    /// Reports whether `coordinate` lies outside the square board.
    #[must_use]
    pub fn is_out_of_bounds(world: &World, coordinate: Coordinate) -> bool {
        world.is_out_of_bounds(coordinate)
    }

    /// Reports whether the player could stand on `coordinate`.
    #[must_use]
    pub fn can_traverse(world: &World, coordinate: Coordinate) -> bool {
        world.can_traverse(coordinate)
    }

    /// Reports whether a projectile landing on `coordinate` would hit the player.
    #[must_use]
    pub fn is_player_at(world: &World, coordinate: Coordinate) -> bool {
        world.is_player_at(coordinate)
    }

    /// Snapshot of the tile at `coordinate`, if one is on the board.
    #[must_use]
    pub fn tile(world: &World, coordinate: Coordinate) -> Option<TileSnapshot> {
        world.tiles.get(coordinate).map(|tile| tile.snapshot())
    }

    /// Number of tiles on the board, destroyed ones awaiting removal included.
    #[must_use]
    pub fn tile_count(world: &World) -> usize {
        world.tiles.len()
    }

    /// Captures a read-only view of every tile on the board.
    #[must_use]
    pub fn tile_view(world: &World) -> TileView {
        TileView::from_snapshots(world.tiles.iter().map(|tile| tile.snapshot()).collect())
    }

    /// Snapshot of the player, if a session is active.
    #[must_use]
    pub fn player(world: &World) -> Option<PlayerSnapshot> {
        world.player.map(|player| PlayerSnapshot {
            coordinate: player.coordinate,
            facing: player.facing,
            alive: player.alive,
        })
    }

    /// Collection progress of the session.
    #[must_use]
    pub fn score(world: &World) -> ScoreTracker {
        world.score
    }

    /// Whether every collectable was picked up.
    #[must_use]
    pub fn has_collected_all(world: &World) -> bool {
        world.phase == SessionPhase::GameWon
    }

    /// Whether a projectile hit the player.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.phase == SessionPhase::GameOver
    }

    /// Cells still holding a collectable, in coordinate order.
    #[must_use]
    pub fn collectables(world: &World) -> Vec<Coordinate> {
        world.collectables.iter().copied().collect()
    }

    /// Cells whose tile was removed to form an obstacle, in coordinate order.
    #[must_use]
    pub fn obstacles(world: &World) -> Vec<Coordinate> {
        world.obstacles.iter().copied().collect()
    }

    /// Cells currently under a visible target marker, in coordinate order.
    #[must_use]
    pub fn markers(world: &World) -> Vec<Coordinate> {
        world.markers.iter().copied().collect()
    }
}
