//! Collection progress towards the winning score.

/// Counts collected items against the number required to win.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreTracker {
    current: u32,
    goal: u32,
}

impl ScoreTracker {
    /// Creates a tracker with no collections towards `goal`.
    #[must_use]
    pub const fn new(goal: u32) -> Self {
        Self { current: 0, goal }
    }

    /// Records one collected item and returns the new score.
    pub fn increment(&mut self) -> u32 {
        self.current = self.current.saturating_add(1);
        self.current
    }

    /// Items collected so far.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Items required to win.
    #[must_use]
    pub const fn goal(&self) -> u32 {
        self.goal
    }

    /// Whether the winning score was reached.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.current >= self.goal
    }
}
