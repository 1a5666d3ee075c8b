//! Seeded headless play-through used by the command-line adapter.

use std::{fmt, time::Duration};

use anyhow::{bail, Context, Result};
use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use soul_collector_core::{Direction, Event, GameConfig, SessionPhase};
use soul_collector_session::{OpenSky, Session};
use soul_collector_world::query;

/// Stream of the player's random walk, kept apart from board generation.
const WALK_STREAM: u64 = 1;
/// Upper bound of ticks a single volley may take before the run is abandoned.
const MAX_TICKS_PER_VOLLEY: u32 = 100_000;

/// How the automated player behaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Plan {
    pub(crate) max_moves: u32,
    pub(crate) tick: Duration,
}

/// Outcome of an automated run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) banner: &'static str,
    pub(crate) phase: SessionPhase,
    pub(crate) score: u32,
    pub(crate) goal: u32,
    pub(crate) tiles_left: usize,
    pub(crate) tiles_destroyed: usize,
    pub(crate) volleys: u32,
    pub(crate) moves: u32,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.banner)?;
        writeln!(f, "phase:      {:?}", self.phase)?;
        writeln!(f, "score:      {}/{}", self.score, self.goal)?;
        writeln!(f, "tiles left: {}", self.tiles_left)?;
        writeln!(f, "destroyed:  {}", self.tiles_destroyed)?;
        writeln!(f, "volleys:    {}", self.volleys)?;
        write!(f, "moves:      {}", self.moves)
    }
}

/// Plays one game with a random walk until it ends or the move budget runs out.
pub(crate) fn run(config: GameConfig, plan: &Plan) -> Result<Summary> {
    if plan.tick.is_zero() {
        bail!("tick duration must be positive");
    }

    let mut walk = ChaCha8Rng::seed_from_u64(config.seed);
    walk.set_stream(WALK_STREAM);

    let mut session = Session::new(config, OpenSky).context("failed to create session")?;
    session.new_game().context("failed to start a game")?;

    let mut destroyed = 0;
    let mut moves = 0;
    while moves < plan.max_moves && !session.phase().is_terminal() {
        destroyed += settle(&mut session, plan.tick)?;
        if session.phase().is_terminal() {
            break;
        }

        let Some(direction) = choose_direction(&session, &mut walk) else {
            warn!("player has no traversable neighbour, stopping");
            break;
        };
        if !session.move_player(direction) {
            warn!("move {direction:?} refused, stopping");
            break;
        }
        moves += 1;
    }
    destroyed += settle(&mut session, plan.tick)?;

    let world = session.world();
    let score = query::score(world);
    let summary = Summary {
        banner: query::welcome_banner(world),
        phase: session.phase(),
        score: score.current(),
        goal: score.goal(),
        tiles_left: query::tile_view(world)
            .iter()
            .filter(|tile| !tile.destroyed)
            .count(),
        tiles_destroyed: destroyed,
        volleys: session.volleys_fired(),
        moves,
    };
    info!("run finished in phase {:?} after {moves} moves", summary.phase);
    Ok(summary)
}

/// Runs the pending volley to completion and returns how many tiles it destroyed.
///
/// Recorded events are drained as they are counted.
fn settle(session: &mut Session, tick: Duration) -> Result<usize> {
    let mut destroyed = count_destroyed(session);
    for _ in 0..MAX_TICKS_PER_VOLLEY {
        if !session.sequencer().is_active() {
            return Ok(destroyed);
        }
        session.tick(tick);
        destroyed += count_destroyed(session);
    }
    bail!("volley did not finish within {MAX_TICKS_PER_VOLLEY} ticks")
}

fn count_destroyed(session: &mut Session) -> usize {
    session
        .drain_events()
        .iter()
        .filter(|event| matches!(event, Event::TileDestroyed { .. }))
        .count()
}

fn choose_direction(session: &Session, walk: &mut ChaCha8Rng) -> Option<Direction> {
    let player = query::player(session.world())?.coordinate;
    let open: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|direction| session.can_traverse(player.step(*direction)))
        .collect();
    if open.is_empty() {
        return None;
    }
    Some(open[walk.gen_range(0..open.len())])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> Plan {
        Plan {
            max_moves: 60,
            tick: Duration::from_millis(16),
        }
    }

    #[test]
    fn runs_are_reproducible() {
        let first = run(GameConfig::default(), &plan()).expect("run completes");
        let second = run(GameConfig::default(), &plan()).expect("run completes");
        assert_eq!(first, second);
        assert!(first.moves <= 60);
        assert!(first.score <= first.goal);
    }

    #[test]
    fn volleys_follow_the_step_interval() {
        let config = GameConfig {
            seed: 8,
            ..GameConfig::default()
        };
        let steps_per_shot = config.steps_per_shot;
        let summary = run(config, &plan()).expect("run completes");
        assert!(summary.volleys <= summary.moves / steps_per_shot);
    }

    #[test]
    fn destroyed_and_remaining_tiles_cover_the_board() {
        let config = GameConfig::default();
        let board = config.cell_count() - u64::from(config.obstacles);
        let summary = run(config, &plan()).expect("run completes");
        assert_eq!(
            (summary.tiles_left + summary.tiles_destroyed) as u64,
            board
        );
    }

    #[test]
    fn zero_tick_is_refused() {
        let plan = Plan {
            max_moves: 1,
            tick: Duration::ZERO,
        };
        assert!(run(GameConfig::default(), &plan).is_err());
    }

    #[test]
    fn summary_lists_the_outcome() {
        let summary = Summary {
            banner: "banner",
            phase: SessionPhase::GameWon,
            score: 5,
            goal: 5,
            tiles_left: 12,
            tiles_destroyed: 4,
            volleys: 3,
            moves: 11,
        };
        let text = summary.to_string();
        assert!(text.starts_with("banner\n"));
        assert!(text.contains("GameWon"));
        assert!(text.contains("5/5"));
        assert!(text.contains("destroyed:  4"));
        assert!(text.ends_with("moves:      11"));
    }
}
