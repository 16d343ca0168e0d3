use serde::{Deserialize, Serialize};

/// Accumulated simulation time of a world.
///
/// Only moves when told to. `dt` is trusted as given: negative steps wind the
/// clock back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldClock {
    elapsed: f64,
    updates: u64,
}

impl WorldClock {
    /// Create a clock reading `start`.
    pub fn new(start: f64) -> Self {
        Self {
            elapsed: start,
            updates: 0,
        }
    }

    /// Add `dt` to the running total. Returns the new total.
    pub fn advance(&mut self, dt: f64) -> f64 {
        self.elapsed += dt;
        self.updates += 1;
        self.elapsed
    }

    /// Total accumulated time.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of [`advance`](Self::advance) calls so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Jump to `elapsed`. Used when restoring a saved world.
    pub fn set(&mut self, elapsed: f64) {
        self.elapsed = elapsed;
    }
}
