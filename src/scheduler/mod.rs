//! Recurring schedules for sampling and reduction

pub mod coordinator;
pub mod handle;

pub use coordinator::{CoordinatorStatus, HandleStatus, TimerCoordinator};
pub use handle::{ScheduleHandle, ScheduleKind, ScheduleState};
