use serde::{Deserialize, Serialize};

use crate::query::QuerySeed;

/// Configuration for a [`World`](crate::World).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Clock reading of a fresh world.
    pub start_time: f64,
    /// Table a multi-component query scans first.
    pub query_seed: QuerySeed,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            query_seed: QuerySeed::SmallestTable,
        }
    }
}

impl WorldConfig {
    /// Set the clock reading of a fresh world.
    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// Set the query seed strategy.
    pub fn with_query_seed(mut self, seed: QuerySeed) -> Self {
        self.query_seed = seed;
        self
    }
}
