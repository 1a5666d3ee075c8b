#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game session facade wiring the world to the turn, targeting and firing systems.
//!
//! Each call applies one command and then pumps the commands the systems
//! queue in response until none remain.

use std::time::Duration;

use log::{debug, info};
use soul_collector_core::{
    Command, ConfigError, Coordinate, Direction, Event, GameConfig, PlacementError,
    SessionPhase, TileSnapshot,
};
use soul_collector_system_firing::{FiringConfig, FiringSequencer};
use soul_collector_system_target_selection::TargetSelector;
use soul_collector_system_turn_counter::TurnCounter;
use soul_collector_world::{self as world, query, World};
use thiserror::Error;

pub use soul_collector_system_firing::{LineOfSight, OpenSky};

/// Failures surfaced to the embedding application.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SessionError {
    /// The configuration was refused before the world was created.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The board could not hold every requested entity.
    #[error("cannot start a game: {0}")]
    Placement(#[from] PlacementError),
}

/// One player's game, from board generation to win or loss.
#[derive(Debug)]
pub struct Session<L = OpenSky> {
    world: World,
    selector: TargetSelector,
    counter: TurnCounter,
    sequencer: FiringSequencer,
    line_of_sight: L,
    volley: Vec<TileSnapshot>,
    events: Vec<Event>,
    volleys_fired: u32,
}

impl<L> Session<L>
where
    L: LineOfSight,
{
    /// Creates a session in the menu phase.
    pub fn new(config: GameConfig, line_of_sight: L) -> Result<Self, SessionError> {
        let firing = FiringConfig::from(&config);
        let selector = TargetSelector::new(config.sort_strategy);
        let counter = TurnCounter::new(config.steps_per_shot);
        let world = World::new(config)?;
        Ok(Self {
            world,
            selector,
            counter,
            sequencer: FiringSequencer::new(firing),
            line_of_sight,
            volley: Vec::new(),
            events: Vec::new(),
            volleys_fired: 0,
        })
    }

    /// Generates a fresh board and starts playing on it.
    ///
    /// Any running game is discarded first.
    pub fn new_game(&mut self) -> Result<(), SessionError> {
        let events = self.pump(Command::NewGame);
        let rejected = events.iter().find_map(|event| match event {
            Event::SessionRejected { reason } => Some(*reason),
            _ => None,
        });
        match rejected {
            Some(reason) => Err(SessionError::Placement(reason)),
            None => Ok(()),
        }
    }

    /// Empties the board and returns to the menu.
    pub fn clear_grid(&mut self) {
        let _ = self.pump(Command::ClearGrid);
    }

    /// Pauses or resumes play.
    pub fn set_paused(&mut self, paused: bool) {
        let _ = self.pump(Command::SetPaused { paused });
    }

    /// Attempts to move the player one cell, reporting whether it moved.
    ///
    /// A successful move counts as a step and may start a volley.
    pub fn move_player(&mut self, direction: Direction) -> bool {
        let events = self.pump(Command::MovePlayer { direction });
        events
            .iter()
            .any(|event| matches!(event, Event::PlayerMoved { .. }))
    }

    /// Counts a step that did not come from a player move.
    pub fn add_step(&mut self) {
        if !self.counter.add_step() {
            return;
        }
        let mut pending = Vec::new();
        self.fire_volley(&mut pending);
        let _ = self.pump_all(pending);
    }

    /// Advances the simulation clock.
    pub fn tick(&mut self, dt: Duration) {
        let _ = self.pump(Command::Tick { dt });
    }

    /// Reports whether the player could stand on `coordinate`.
    #[must_use]
    pub fn can_traverse(&self, coordinate: Coordinate) -> bool {
        query::can_traverse(&self.world, coordinate)
    }

    /// Reports whether `coordinate` lies outside the board.
    #[must_use]
    pub fn is_out_of_bounds(&self, coordinate: Coordinate) -> bool {
        query::is_out_of_bounds(&self.world, coordinate)
    }

    /// Whether every collectable was picked up.
    #[must_use]
    pub fn has_collected_all(&self) -> bool {
        query::has_collected_all(&self.world)
    }

    /// Whether a projectile hit the player.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        query::is_game_over(&self.world)
    }

    /// Current session phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        query::phase(&self.world)
    }

    /// Steps taken since the last volley and the steps between volleys.
    #[must_use]
    pub const fn turn_progress(&self) -> (u32, u32) {
        self.counter.progress()
    }

    /// Number of volleys started since the session was created.
    #[must_use]
    pub const fn volleys_fired(&self) -> u32 {
        self.volleys_fired
    }

    /// Read-only access to the board state.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Read-only access to the firing sequencer, for presentation.
    #[must_use]
    pub const fn sequencer(&self) -> &FiringSequencer {
        &self.sequencer
    }

    /// Takes every event recorded since the previous drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    fn pump(&mut self, command: Command) -> Vec<Event> {
        self.pump_all(vec![command])
    }

    fn pump_all(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut batch = Vec::new();
        let mut pending = commands;
        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            self.collapse_behind_player(&mut events);
            self.sequencer
                .handle(&events, &self.line_of_sight, &mut pending);
            if self.counter.handle(&events) > 0 {
                self.fire_volley(&mut pending);
            }
            batch.extend(events);
        }
        self.events.extend(batch.iter().cloned());
        batch
    }

    /// Removes the tiles the player just left when the board collapses behind them.
    fn collapse_behind_player(&mut self, events: &mut Vec<Event>) {
        if !query::config(&self.world).collapse_on_leave {
            return;
        }
        let left: Vec<Coordinate> = events
            .iter()
            .filter_map(|event| match event {
                Event::PlayerMoved { from, .. } => Some(*from),
                _ => None,
            })
            .collect();
        for coordinate in left {
            world::apply(
                &mut self.world,
                Command::DiscardTile { coordinate },
                events,
            );
        }
    }

    fn fire_volley(&mut self, out: &mut Vec<Command>) {
        if query::phase(&self.world) != SessionPhase::Playing {
            debug!("volley skipped outside of play");
            return;
        }
        let shots = query::config(&self.world).shots_per_round;
        let tiles = query::tile_view(&self.world);
        self.selector.select(&tiles, shots, &mut self.volley);
        if self.sequencer.start(&self.volley, out) {
            self.volleys_fired += 1;
            info!(
                "volley {} started with {} targets",
                self.volleys_fired,
                self.volley.len()
            );
        }
    }
}
