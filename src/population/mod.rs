//! Population control passes
//!
//! Sampling and reduction both run inside the mutation domain and share the
//! same enumeration strategy: every world is copied into a snapshot first,
//! and a world that cannot be enumerated is recorded as a `WorldFailure`
//! while the pass continues with the remaining worlds.

pub mod filter;
pub mod reducer;
pub mod sampler;
pub mod threshold;

pub use filter::FilterSet;
pub use reducer::{CleanupResult, Reducer};
pub use sampler::{SampleResult, Sampler};
pub use threshold::{BreachResponder, ThresholdDecision, ThresholdMonitor};

use serde::Serialize;

/// A world that could not be enumerated during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldFailure {
    pub world: String,
    pub reason: String,
}
