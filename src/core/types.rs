//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Server ticks per wall-clock second
pub const TICKS_PER_SECOND: u64 = 20;

/// Wall-clock length of one tick in milliseconds
pub const MILLIS_PER_TICK: u64 = 1000 / TICKS_PER_SECOND;

/// Convert whole seconds to ticks
pub fn seconds_to_ticks(seconds: u64) -> Tick {
    seconds.saturating_mul(TICKS_PER_SECOND)
}

/// Wall-clock duration covered by a number of ticks
pub fn ticks_to_duration(ticks: Tick) -> Duration {
    Duration::from_millis(ticks.saturating_mul(MILLIS_PER_TICK))
}
