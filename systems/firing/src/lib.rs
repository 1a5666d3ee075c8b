#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that reveals turret targets and fires one projectile at a time.
//!
//! The sequencer is driven by [`Event::TimeAdvanced`] and never touches the
//! world directly. Every effect is queued as a [`Command`] for the caller to
//! apply.

use std::{collections::VecDeque, time::Duration};

use glam::Vec3;
use log::debug;
use soul_collector_core::{Command, Coordinate, Event, GameConfig, TileSnapshot};

/// Visibility test between the turret and a target cell.
pub trait LineOfSight {
    /// Reports whether nothing blocks the segment from `from` to `to`.
    fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool;
}

impl<F> LineOfSight for F
where
    F: Fn(Vec3, Vec3) -> bool,
{
    fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        self(from, to)
    }
}

/// Line of sight without any occluders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpenSky;

impl LineOfSight for OpenSky {
    fn has_line_of_sight(&self, _from: Vec3, _to: Vec3) -> bool {
        true
    }
}

/// World-space point of a board cell, cells are one unit apart on the ground plane.
#[must_use]
pub fn cell_center(coordinate: Coordinate) -> Vec3 {
    Vec3::new(coordinate.x() as f32, 0.0, coordinate.z() as f32)
}

/// Normalised height profile of the projectile arc, zero at both ends and one at the apex.
#[must_use]
pub fn arc_ease(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    4.0 * t * (1.0 - t)
}

/// Timing and ballistics of the turret.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FiringConfig {
    /// Barrel position in world space.
    pub turret: Vec3,
    /// Delay before each target marker is revealed.
    pub reveal_interval: Duration,
    /// Delay before each projectile launch.
    pub launch_interval: Duration,
    /// Fraction of the flight covered per second.
    pub projectile_speed: f32,
    /// Apex height of the projectile arc.
    pub arc_height: f32,
    /// Health removed by each impact.
    pub damage: u32,
}

impl From<&GameConfig> for FiringConfig {
    fn from(config: &GameConfig) -> Self {
        let turret = &config.turret;
        Self {
            turret: Vec3::from_array(turret.position),
            reveal_interval: turret.reveal_interval(),
            launch_interval: turret.launch_interval(),
            projectile_speed: turret.projectile_speed,
            arc_height: turret.arc_height,
            damage: config.damage_per_hit,
        }
    }
}

/// Externally visible progress of a firing sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SequencerStage {
    /// No volley is being processed.
    Idle,
    /// Targets are being aimed at and marked one by one.
    RevealingTargets,
    /// Marked targets are being fired on in order.
    Firing,
}

/// Projectile currently in the air.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Launch point.
    pub origin: Vec3,
    /// Cell the projectile lands on.
    pub target: Coordinate,
    /// Completed fraction of the flight in `[0, 1]`.
    pub t: f32,
    /// Interpolated position including the arc height.
    pub position: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Stage {
    Idle,
    Revealing { remaining: Duration },
    AwaitingLaunch { remaining: Duration },
    InFlight { target: Coordinate, t: f32 },
}

/// Drives one volley at a time from target reveal to the last impact.
#[derive(Debug)]
pub struct FiringSequencer {
    config: FiringConfig,
    stage: Stage,
    unrevealed: VecDeque<Coordinate>,
    confirmed: VecDeque<Coordinate>,
    aim: Option<Vec3>,
    carry: Duration,
}

impl FiringSequencer {
    /// Creates an idle sequencer.
    #[must_use]
    pub fn new(config: FiringConfig) -> Self {
        Self {
            config,
            stage: Stage::Idle,
            unrevealed: VecDeque::new(),
            confirmed: VecDeque::new(),
            aim: None,
            carry: Duration::ZERO,
        }
    }

    /// Timing and ballistics the sequencer runs with.
    #[must_use]
    pub const fn config(&self) -> &FiringConfig {
        &self.config
    }

    /// Begins processing `volley` in order.
    ///
    /// Input suspension is requested before any delay elapses. Returns `false`
    /// when a sequence is already running or the volley is empty.
    pub fn start(&mut self, volley: &[TileSnapshot], out: &mut Vec<Command>) -> bool {
        if self.is_active() {
            debug!("volley ignored while a firing sequence is active");
            return false;
        }
        if volley.is_empty() {
            return false;
        }

        self.unrevealed.clear();
        self.unrevealed
            .extend(volley.iter().map(|target| target.coordinate));
        self.confirmed.clear();
        self.carry = Duration::ZERO;
        self.stage = Stage::Revealing {
            remaining: self.config.reveal_interval,
        };
        out.push(Command::SuspendInput { suspended: true });
        true
    }

    /// Consumes world events, advancing the sequence and queuing commands.
    ///
    /// Board resets and player death abort the running sequence.
    ///
    /// Advancing stops after each impact so the world can answer it. Time left
    /// over at that point resumes on the next call, once the caller has applied
    /// the queued impact and passed its events back in.
    pub fn handle<L>(&mut self, events: &[Event], line_of_sight: &L, out: &mut Vec<Command>)
    where
        L: LineOfSight + ?Sized,
    {
        let mut resume = std::mem::take(&mut self.carry);
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    let dt = dt.saturating_add(std::mem::take(&mut resume));
                    self.advance(dt, line_of_sight, out);
                }
                Event::GridCleared | Event::SessionStarted { .. } | Event::GameOver { .. } => {
                    resume = Duration::ZERO;
                    self.abort();
                }
                _ => {}
            }
        }
        if !resume.is_zero() {
            self.advance(resume, line_of_sight, out);
        }
    }

    /// Reports whether a volley is being processed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    /// Current progress of the sequence.
    #[must_use]
    pub fn stage(&self) -> SequencerStage {
        match self.stage {
            Stage::Idle => SequencerStage::Idle,
            Stage::Revealing { .. } => SequencerStage::RevealingTargets,
            Stage::AwaitingLaunch { .. } | Stage::InFlight { .. } => SequencerStage::Firing,
        }
    }

    /// Unit vector from the turret towards the most recently aimed target.
    #[must_use]
    pub fn aim_direction(&self) -> Option<Vec3> {
        self.aim
    }

    /// Targets that passed the visibility check and were not fired on yet.
    #[must_use]
    pub fn queued_targets(&self) -> Vec<Coordinate> {
        self.confirmed.iter().copied().collect()
    }

    /// Snapshot of the projectile in flight, if any.
    #[must_use]
    pub fn projectile(&self) -> Option<ProjectileSnapshot> {
        let Stage::InFlight { target, t } = self.stage else {
            return None;
        };
        let origin = self.config.turret;
        let position = origin.lerp(cell_center(target), t)
            + Vec3::Y * (self.config.arc_height * arc_ease(t));
        Some(ProjectileSnapshot {
            origin,
            target,
            t,
            position,
        })
    }

    /// Drops the running sequence without emitting further commands.
    pub fn abort(&mut self) {
        if self.is_active() {
            debug!("firing sequence aborted");
        }
        self.stage = Stage::Idle;
        self.unrevealed.clear();
        self.confirmed.clear();
        self.aim = None;
        self.carry = Duration::ZERO;
    }

    fn advance<L>(&mut self, dt: Duration, line_of_sight: &L, out: &mut Vec<Command>)
    where
        L: LineOfSight + ?Sized,
    {
        let mut budget = dt;
        loop {
            match &mut self.stage {
                Stage::Idle => return,
                Stage::Revealing { remaining } => {
                    if budget < *remaining {
                        *remaining -= budget;
                        return;
                    }
                    budget -= *remaining;
                    self.reveal_next(line_of_sight, out);
                }
                Stage::AwaitingLaunch { remaining } => {
                    if budget < *remaining {
                        *remaining -= budget;
                        return;
                    }
                    budget -= *remaining;
                    self.launch_next(out);
                }
                Stage::InFlight { target, t } => {
                    if budget.is_zero() {
                        return;
                    }
                    let speed = self.config.projectile_speed;
                    let progressed = *t + speed * budget.as_secs_f32();
                    if progressed < 1.0 {
                        *t = progressed;
                        return;
                    }
                    let needed = Duration::try_from_secs_f32((1.0 - *t) / speed)
                        .unwrap_or(Duration::ZERO);
                    let target = *target;
                    self.land(target, out);
                    if self.is_active() {
                        self.carry = budget.saturating_sub(needed);
                    }
                    return;
                }
            }
        }
    }

    fn reveal_next<L>(&mut self, line_of_sight: &L, out: &mut Vec<Command>)
    where
        L: LineOfSight + ?Sized,
    {
        if let Some(target) = self.unrevealed.pop_front() {
            let turret = self.config.turret;
            let point = cell_center(target);
            self.aim = Some((point - turret).normalize_or_zero());
            if line_of_sight.has_line_of_sight(turret, point) {
                self.confirmed.push_back(target);
                out.push(Command::ShowMarker { target });
            } else {
                debug!("target {target:?} dropped, line of sight blocked");
            }
        }

        self.stage = if !self.unrevealed.is_empty() {
            Stage::Revealing {
                remaining: self.config.reveal_interval,
            }
        } else {
            self.next_launch_or_finish(out)
        };
    }

    fn launch_next(&mut self, out: &mut Vec<Command>) {
        let Some(target) = self.confirmed.pop_front() else {
            self.stage = self.next_launch_or_finish(out);
            return;
        };
        self.aim = Some((cell_center(target) - self.config.turret).normalize_or_zero());
        out.push(Command::LaunchProjectile { target });
        self.stage = Stage::InFlight { target, t: 0.0 };
    }

    fn land(&mut self, target: Coordinate, out: &mut Vec<Command>) {
        out.push(Command::ResolveImpact {
            target,
            damage: self.config.damage,
        });
        self.stage = self.next_launch_or_finish(out);
    }

    fn next_launch_or_finish(&mut self, out: &mut Vec<Command>) -> Stage {
        if self.confirmed.is_empty() {
            self.aim = None;
            out.push(Command::SuspendInput { suspended: false });
            return Stage::Idle;
        }
        Stage::AwaitingLaunch {
            remaining: self.config.launch_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use soul_collector_core::Health;

    use super::*;

    fn config() -> FiringConfig {
        FiringConfig {
            turret: Vec3::new(2.0, 1.0, -2.0),
            reveal_interval: Duration::from_millis(100),
            launch_interval: Duration::from_millis(50),
            projectile_speed: 2.0,
            arc_height: 3.0,
            damage: 1,
        }
    }

    fn target(x: i32, z: i32) -> TileSnapshot {
        TileSnapshot {
            coordinate: Coordinate::new(x, z),
            health: Health::Points(1),
            destroyed: false,
        }
    }

    fn tick(millis: u64) -> Event {
        Event::TimeAdvanced {
            dt: Duration::from_millis(millis),
        }
    }

    fn resume_until_idle(sequencer: &mut FiringSequencer, out: &mut Vec<Command>) {
        for _ in 0..16 {
            if !sequencer.is_active() {
                return;
            }
            sequencer.handle(&[], &OpenSky, out);
        }
        panic!("sequence still running");
    }

    #[test]
    fn empty_volley_is_not_started() {
        let mut sequencer = FiringSequencer::new(config());
        let mut out = Vec::new();
        assert!(!sequencer.start(&[], &mut out));
        assert!(out.is_empty());
        assert_eq!(sequencer.stage(), SequencerStage::Idle);
    }

    #[test]
    fn start_suspends_input_before_any_delay() {
        let mut sequencer = FiringSequencer::new(config());
        let mut out = Vec::new();
        assert!(sequencer.start(&[target(0, 0)], &mut out));
        assert_eq!(out, vec![Command::SuspendInput { suspended: true }]);
        assert_eq!(sequencer.stage(), SequencerStage::RevealingTargets);

        out.clear();
        assert!(!sequencer.start(&[target(1, 1)], &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn long_tick_stops_after_each_impact() {
        let mut sequencer = FiringSequencer::new(config());
        let mut out = Vec::new();
        let _ = sequencer.start(&[target(0, 0), target(1, 0)], &mut out);
        out.clear();

        sequencer.handle(&[tick(10_000)], &OpenSky, &mut out);
        assert_eq!(
            out,
            vec![
                Command::ShowMarker {
                    target: Coordinate::new(0, 0)
                },
                Command::ShowMarker {
                    target: Coordinate::new(1, 0)
                },
                Command::LaunchProjectile {
                    target: Coordinate::new(0, 0)
                },
                Command::ResolveImpact {
                    target: Coordinate::new(0, 0),
                    damage: 1,
                },
            ]
        );
        assert!(sequencer.is_active());

        out.clear();
        sequencer.handle(&[], &OpenSky, &mut out);
        assert_eq!(
            out,
            vec![
                Command::LaunchProjectile {
                    target: Coordinate::new(1, 0)
                },
                Command::ResolveImpact {
                    target: Coordinate::new(1, 0),
                    damage: 1,
                },
                Command::SuspendInput { suspended: false },
            ]
        );
        assert!(!sequencer.is_active());
        assert!(sequencer.aim_direction().is_none());
    }

    #[test]
    fn delays_are_respected_across_ticks() {
        let mut sequencer = FiringSequencer::new(config());
        let mut out = Vec::new();
        let _ = sequencer.start(&[target(3, 4)], &mut out);
        out.clear();

        sequencer.handle(&[tick(99)], &OpenSky, &mut out);
        assert!(out.is_empty());

        sequencer.handle(&[tick(1)], &OpenSky, &mut out);
        assert_eq!(
            out,
            vec![Command::ShowMarker {
                target: Coordinate::new(3, 4)
            }]
        );
        assert_eq!(sequencer.stage(), SequencerStage::Firing);
        let aim = sequencer.aim_direction().expect("aimed at target");
        assert!((aim.length() - 1.0).abs() < 1e-5);

        out.clear();
        sequencer.handle(&[tick(60)], &OpenSky, &mut out);
        assert_eq!(
            out,
            vec![Command::LaunchProjectile {
                target: Coordinate::new(3, 4)
            }]
        );

        // 10ms of the tick carried into the flight at two flights per second.
        let projectile = sequencer.projectile().expect("projectile in flight");
        assert!((projectile.t - 0.02).abs() < 1e-3);

        out.clear();
        sequencer.handle(&[tick(200)], &OpenSky, &mut out);
        assert!(out.is_empty());
        let projectile = sequencer.projectile().expect("projectile in flight");
        assert!((projectile.t - 0.42).abs() < 1e-3);
        assert!(projectile.position.y > 1.0);

        sequencer.handle(&[tick(300)], &OpenSky, &mut out);
        assert_eq!(
            out,
            vec![
                Command::ResolveImpact {
                    target: Coordinate::new(3, 4),
                    damage: 1,
                },
                Command::SuspendInput { suspended: false },
            ]
        );
        assert!(sequencer.projectile().is_none());
    }

    #[test]
    fn blocked_targets_are_dropped_without_reordering() {
        let mut sequencer = FiringSequencer::new(config());
        let mut out = Vec::new();
        let blocker = |_from: Vec3, to: Vec3| to != cell_center(Coordinate::new(1, 1));
        let _ = sequencer.start(&[target(2, 2), target(1, 1), target(0, 0)], &mut out);
        out.clear();

        sequencer.handle(&[tick(300)], &blocker, &mut out);
        assert_eq!(
            out,
            vec![
                Command::ShowMarker {
                    target: Coordinate::new(2, 2)
                },
                Command::ShowMarker {
                    target: Coordinate::new(0, 0)
                },
            ]
        );
        assert_eq!(
            sequencer.queued_targets(),
            vec![Coordinate::new(2, 2), Coordinate::new(0, 0)]
        );

        out.clear();
        sequencer.handle(&[tick(10_000)], &blocker, &mut out);
        resume_until_idle(&mut sequencer, &mut out);
        let fired: Vec<_> = out
            .iter()
            .filter_map(|command| match command {
                Command::LaunchProjectile { target } => Some(*target),
                _ => None,
            })
            .collect();
        assert_eq!(fired, vec![Coordinate::new(2, 2), Coordinate::new(0, 0)]);
    }

    #[test]
    fn fully_blocked_volley_releases_input() {
        let mut sequencer = FiringSequencer::new(config());
        let mut out = Vec::new();
        let wall = |_from: Vec3, _to: Vec3| false;
        let _ = sequencer.start(&[target(0, 0)], &mut out);
        out.clear();

        sequencer.handle(&[tick(100)], &wall, &mut out);
        assert_eq!(out, vec![Command::SuspendInput { suspended: false }]);
        assert!(!sequencer.is_active());
    }

    #[test]
    fn reset_events_abort_the_sequence() {
        let mut sequencer = FiringSequencer::new(config());
        let mut out = Vec::new();
        let _ = sequencer.start(&[target(0, 0)], &mut out);
        out.clear();

        sequencer.handle(
            &[
                Event::GameOver {
                    impact: Coordinate::new(0, 0),
                },
                tick(10_000),
            ],
            &OpenSky,
            &mut out,
        );
        assert!(out.is_empty());
        assert!(!sequencer.is_active());
    }

    #[test]
    fn death_after_an_impact_drops_the_remaining_time() {
        let mut sequencer = FiringSequencer::new(config());
        let mut out = Vec::new();
        let _ = sequencer.start(&[target(0, 0), target(1, 0)], &mut out);
        sequencer.handle(&[tick(10_000)], &OpenSky, &mut out);
        assert!(out.contains(&Command::ResolveImpact {
            target: Coordinate::new(0, 0),
            damage: 1,
        }));

        out.clear();
        sequencer.handle(
            &[Event::GameOver {
                impact: Coordinate::new(0, 0),
            }],
            &OpenSky,
            &mut out,
        );
        assert!(out.is_empty());
        assert!(!sequencer.is_active());

        let _ = sequencer.start(&[target(2, 2)], &mut out);
        out.clear();
        sequencer.handle(&[], &OpenSky, &mut out);
        assert!(out.is_empty(), "no time survives the abort");
    }

    #[test]
    fn arc_peaks_halfway() {
        assert_eq!(arc_ease(0.0), 0.0);
        assert_eq!(arc_ease(1.0), 0.0);
        assert!((arc_ease(0.5) - 1.0).abs() < f32::EPSILON);
        assert_eq!(arc_ease(2.0), 0.0);
    }

    #[test]
    fn config_follows_game_settings() {
        let game = GameConfig::default();
        let firing = FiringConfig::from(&game);
        assert_eq!(firing.turret, Vec3::new(2.0, 1.0, -2.0));
        assert_eq!(firing.reveal_interval, Duration::from_millis(400));
        assert_eq!(firing.launch_interval, Duration::from_millis(250));
        assert_eq!(firing.damage, 1);
    }
}
