#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Counts player steps and reports when the turret is due to fire.

use soul_collector_core::Event;

/// Step counter that triggers a volley every `steps_per_shot` moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnCounter {
    steps: u32,
    steps_per_shot: u32,
}

impl TurnCounter {
    /// Creates a counter with no steps recorded.
    ///
    /// A zero interval is treated as one so every step fires.
    #[must_use]
    pub const fn new(steps_per_shot: u32) -> Self {
        let steps_per_shot = if steps_per_shot == 0 { 1 } else { steps_per_shot };
        Self {
            steps: 0,
            steps_per_shot,
        }
    }

    /// Records one step and reports whether a volley is due.
    ///
    /// The counter wraps back to zero whenever it reports `true`.
    pub fn add_step(&mut self) -> bool {
        self.steps += 1;
        if self.steps >= self.steps_per_shot {
            self.steps = 0;
            return true;
        }
        false
    }

    /// Consumes world events and returns how many volleys became due.
    pub fn handle(&mut self, events: &[Event]) -> u32 {
        let mut due = 0;
        for event in events {
            match event {
                Event::PlayerMoved { .. } => {
                    if self.add_step() {
                        due += 1;
                    }
                }
                Event::SessionStarted { .. } | Event::GridCleared => self.reset(),
                _ => {}
            }
        }
        due
    }

    /// Steps recorded since the last volley and the interval, for progress display.
    #[must_use]
    pub const fn progress(&self) -> (u32, u32) {
        (self.steps, self.steps_per_shot)
    }

    /// Forgets every recorded step.
    pub fn reset(&mut self) {
        self.steps = 0;
    }
}
