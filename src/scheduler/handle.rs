//! Schedule handles
//!
//! A handle is one armed recurring execution. It is never re-pointed at a
//! new schedule: rescheduling cancels the old handle and creates a new one.
//!
//! ```text
//! Armed -> Fired -> Armed -> ... -> Cancelled
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    Reduction,
    Sampling,
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleKind::Reduction => f.write_str("reduction"),
            ScheduleKind::Sampling => f.write_str("sampling"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ScheduleState {
    Armed = 0,
    Fired = 1,
    Cancelled = 2,
}

impl ScheduleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ScheduleState::Armed,
            1 => ScheduleState::Fired,
            _ => ScheduleState::Cancelled,
        }
    }
}

pub struct ScheduleHandle {
    kind: ScheduleKind,
    generation: u64,
    state: AtomicU8,
    fire_count: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ScheduleHandle {
    pub(crate) fn new(kind: ScheduleKind, generation: u64) -> Self {
        Self {
            kind,
            generation,
            state: AtomicU8::new(ScheduleState::Armed as u8),
            fire_count: AtomicU64::new(0),
            task: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> ScheduleKind {
        self.kind
    }

    /// Unique per coordinator; never reused
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> ScheduleState {
        ScheduleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == ScheduleState::Cancelled
    }

    /// Number of times this handle dispatched its body
    pub fn fire_count(&self) -> u64 {
        self.fire_count.load(Ordering::SeqCst)
    }

    pub(crate) fn attach(&self, task: JoinHandle<()>) {
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_cancelled() {
            task.abort();
        } else {
            *slot = Some(task);
        }
    }

    /// Armed -> Fired. Fails if the handle was cancelled.
    pub(crate) fn mark_fired(&self) -> bool {
        let fired = self
            .state
            .compare_exchange(
                ScheduleState::Armed as u8,
                ScheduleState::Fired as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if fired {
            self.fire_count.fetch_add(1, Ordering::SeqCst);
        }
        fired
    }

    /// Fired -> Armed, when the next period begins
    pub(crate) fn rearm_after_fire(&self) {
        let _ = self.state.compare_exchange(
            ScheduleState::Fired as u8,
            ScheduleState::Armed as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Cancel and abort the timer task. Returns false if already cancelled.
    pub(crate) fn cancel(&self) -> bool {
        let previous = self.state.swap(ScheduleState::Cancelled as u8, Ordering::SeqCst);
        if previous == ScheduleState::Cancelled as u8 {
            return false;
        }
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.take() {
            task.abort();
        }
        true
    }
}

impl fmt::Debug for ScheduleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleHandle")
            .field("kind", &self.kind)
            .field("generation", &self.generation)
            .field("state", &self.state())
            .field("fire_count", &self.fire_count())
            .finish()
    }
}
