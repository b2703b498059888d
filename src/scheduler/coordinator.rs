//! TimerCoordinator - owns the reduction and sampling schedules
//!
//! Both schedules are Tokio timer tasks (the worker context). They never
//! touch world state: each firing submits a job to the mutation domain.
//!
//! All arming, cancelling and dispatching happens under one mutex, and a
//! firing only dispatches if its handle is still the current, uncancelled
//! handle for its schedule. That gives three guarantees:
//! - a firing racing a cancel either dispatched before the cancel or not at all
//! - there is never more than one live handle per schedule
//! - once `stop` returns, no further sample or reduction is dispatched
//!
//! Dispatch only enqueues onto the domain and never waits while holding the
//! lock. Because the domain runs jobs in FIFO order, the immediate reduction
//! of a breach always runs before anything the re-armed schedule dispatches.
//!
//! Outcomes never reach the sink from inside the lock. They are queued on an
//! unbounded channel and a single publisher task hands them to the sink in
//! the order they were queued, so a sink is free to call back into the
//! coordinator.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::core::config::Settings;
use crate::core::types::{ticks_to_duration, MILLIS_PER_TICK};
use crate::notify::{Outcome, OutcomeSink};
use crate::population::{BreachResponder, Reducer, Sampler, ThresholdMonitor};
use crate::scheduler::handle::{ScheduleHandle, ScheduleKind, ScheduleState};
use crate::simulation::domain::DomainHandle;

/// Shareable handle to the coordinator. Clones refer to the same schedules.
#[derive(Clone)]
pub struct TimerCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    domain: DomainHandle,
    outcomes: mpsc::UnboundedSender<Outcome>,
    monitor: ThresholdMonitor,
    state: Mutex<ScheduleTable>,
    samples_dispatched: AtomicU64,
    reductions_dispatched: AtomicU64,
}

#[derive(Default)]
struct ScheduleTable {
    running: bool,
    settings: Option<Arc<Settings>>,
    reduction: Option<Arc<ScheduleHandle>>,
    sampling: Option<Arc<ScheduleHandle>>,
    next_generation: u64,
}

impl ScheduleTable {
    fn slot(&self, kind: ScheduleKind) -> Option<&Arc<ScheduleHandle>> {
        match kind {
            ScheduleKind::Reduction => self.reduction.as_ref(),
            ScheduleKind::Sampling => self.sampling.as_ref(),
        }
    }

    fn is_current(&self, handle: &ScheduleHandle) -> bool {
        self.running
            && !handle.is_cancelled()
            && self
                .slot(handle.kind())
                .is_some_and(|current| current.generation() == handle.generation())
    }

    fn cancel_all(&mut self) {
        for handle in [self.reduction.take(), self.sampling.take()].into_iter().flatten() {
            handle.cancel();
        }
    }
}

/// Point-in-time view of one schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HandleStatus {
    pub generation: u64,
    pub state: ScheduleState,
    pub fire_count: u64,
}

impl From<&ScheduleHandle> for HandleStatus {
    fn from(handle: &ScheduleHandle) -> Self {
        Self {
            generation: handle.generation(),
            state: handle.state(),
            fire_count: handle.fire_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoordinatorStatus {
    pub running: bool,
    pub reduction: Option<HandleStatus>,
    pub sampling: Option<HandleStatus>,
    pub samples_dispatched: u64,
    pub reductions_dispatched: u64,
}

impl TimerCoordinator {
    /// Must be called from within a Tokio runtime.
    pub fn new(domain: DomainHandle, sink: Arc<dyn OutcomeSink>) -> Self {
        let (outcomes, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_publisher(rx, sink));
        Self {
            inner: Arc::new(Inner {
                domain,
                outcomes,
                monitor: ThresholdMonitor::new(),
                state: Mutex::new(ScheduleTable::default()),
                samples_dispatched: AtomicU64::new(0),
                reductions_dispatched: AtomicU64::new(0),
            }),
        }
    }

    /// Arm both schedules from `settings`, replacing any armed ones.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, settings: Arc<Settings>) {
        let mut table = self.inner.lock();
        table.running = true;
        self.inner.install(&mut table, settings);
    }

    /// Re-arm both schedules from `settings` if the coordinator is running.
    ///
    /// The check and the re-arm happen under one lock, so a concurrent `stop`
    /// either lands first (nothing is armed) or cancels the new handles.
    pub fn restart_if_running(&self, settings: Arc<Settings>) -> bool {
        let mut table = self.inner.lock();
        if !table.running {
            return false;
        }
        self.inner.install(&mut table, settings);
        true
    }

    /// Cancel both schedules. Safe to call repeatedly.
    pub fn stop(&self) {
        let mut table = self.inner.lock();
        if table.running {
            tracing::info!("Population schedules stopped");
        }
        table.running = false;
        table.cancel_all();
    }

    /// Cancel the reduction schedule and arm a fresh one from the base delay
    ///
    /// Returns the new handle, or None (with a warning) if not started.
    pub fn rearm_reduction(&self) -> Option<Arc<ScheduleHandle>> {
        self.inner.rearm(None, false)
    }

    /// Reduce immediately, then re-arm the reduction schedule
    pub fn reduce_now_and_rearm(&self) -> Option<Arc<ScheduleHandle>> {
        self.inner.rearm(None, true)
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    pub fn settings(&self) -> Option<Arc<Settings>> {
        self.inner.lock().settings.clone()
    }

    pub fn reduction_handle(&self) -> Option<Arc<ScheduleHandle>> {
        self.inner.lock().reduction.clone()
    }

    pub fn sampling_handle(&self) -> Option<Arc<ScheduleHandle>> {
        self.inner.lock().sampling.clone()
    }

    pub fn status(&self) -> CoordinatorStatus {
        let table = self.inner.lock();
        CoordinatorStatus {
            running: table.running,
            reduction: table.reduction.as_deref().map(HandleStatus::from),
            sampling: table.sampling.as_deref().map(HandleStatus::from),
            samples_dispatched: self.inner.samples_dispatched.load(Ordering::SeqCst),
            reductions_dispatched: self.inner.reductions_dispatched.load(Ordering::SeqCst),
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, ScheduleTable> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn install(self: &Arc<Self>, table: &mut ScheduleTable, settings: Arc<Settings>) {
        table.cancel_all();
        table.settings = Some(settings.clone());
        let sampling = self.arm(table, ScheduleKind::Sampling, &settings);
        let reduction = self.arm(table, ScheduleKind::Reduction, &settings);
        table.sampling = Some(sampling);
        table.reduction = Some(reduction);
        tracing::info!(settings = %settings.describe(), "Population schedules armed");
    }

    /// Queue an outcome for the publisher task
    fn publish(&self, outcome: Outcome) {
        if self.outcomes.send(outcome).is_err() {
            tracing::debug!("Outcome publisher gone, outcome dropped");
        }
    }

    fn arm(
        self: &Arc<Self>,
        table: &mut ScheduleTable,
        kind: ScheduleKind,
        settings: &Settings,
    ) -> Arc<ScheduleHandle> {
        table.next_generation += 1;
        let handle = Arc::new(ScheduleHandle::new(kind, table.next_generation));

        let (delay, period) = match kind {
            ScheduleKind::Reduction => (
                settings.reduction_delay_ticks,
                settings.reduction_interval_ticks,
            ),
            ScheduleKind::Sampling => (
                settings.sampling_delay_ticks,
                settings.sampling_interval_ticks,
            ),
        };
        let delay = ticks_to_duration(delay);
        let period = ticks_to_duration(period).max(Duration::from_millis(MILLIS_PER_TICK));

        let weak = Arc::downgrade(self);
        let task = match kind {
            ScheduleKind::Reduction => {
                tokio::spawn(run_reduction_schedule(weak, handle.clone(), delay, period))
            }
            ScheduleKind::Sampling => {
                tokio::spawn(run_sampling_schedule(weak, handle.clone(), delay, period))
            }
        };
        handle.attach(task);

        tracing::debug!(
            schedule = %kind,
            generation = handle.generation(),
            delay_ms = delay.as_millis() as u64,
            period_ms = period.as_millis() as u64,
            "Schedule armed"
        );
        handle
    }

    /// Cancel the reduction handle, optionally reduce immediately, then arm
    /// a new handle. `breach_source` must still be current if given.
    fn rearm(
        self: &Arc<Self>,
        breach_source: Option<(&ScheduleHandle, usize, usize)>,
        reduce_now: bool,
    ) -> Option<Arc<ScheduleHandle>> {
        let mut table = self.lock();
        if let Some((sampling, count, limit)) = breach_source {
            // Stopped or restarted while the sample was in flight
            if !table.is_current(sampling) {
                tracing::debug!(count, limit, "Stale breach ignored");
                return None;
            }
            self.publish(Outcome::ThresholdExceeded { count, limit });
        } else if !table.running {
            tracing::warn!("Reduction re-arm requested before the coordinator was started");
            return None;
        }
        let settings = table.settings.clone()?;

        if let Some(old) = table.reduction.take() {
            old.cancel();
        }
        if reduce_now {
            self.dispatch_reduction(&settings, false);
        }
        let handle = self.arm(&mut table, ScheduleKind::Reduction, &settings);
        table.reduction = Some(handle.clone());
        Some(handle)
    }

    /// A reduction tick. Returns false when the schedule should end.
    fn fire_reduction(&self, handle: &ScheduleHandle) -> bool {
        let table = self.lock();
        if !table.is_current(handle) || !handle.mark_fired() {
            return false;
        }
        let Some(settings) = table.settings.clone() else {
            return false;
        };
        let dispatched = self.dispatch_reduction(&settings, true);
        handle.rearm_after_fire();
        dispatched
    }

    /// Enqueue a reduction pass and publish its result when it completes.
    /// `announce` queues the pre-cleanup warning once the pass is enqueued.
    /// Called with the schedule lock held.
    fn dispatch_reduction(&self, settings: &Arc<Settings>, announce: bool) -> bool {
        let settings = settings.clone();
        let submitted = self
            .domain
            .submit(move |server| Reducer::new(&settings.filter).reduce(server));
        let result_rx = match submitted {
            Ok(rx) => rx,
            Err(e) => {
                tracing::warn!(error = %e, "Could not dispatch reduction");
                return false;
            }
        };
        self.reductions_dispatched.fetch_add(1, Ordering::SeqCst);
        if announce {
            self.publish(Outcome::CleanupImminent);
        }

        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            match result_rx.await {
                Ok(result) => {
                    for failure in &result.failures {
                        tracing::warn!(world = %failure.world, reason = %failure.reason, "World skipped during cleanup");
                    }
                    tracing::info!(removed = result.removed, "Entity cleanup complete");
                    let _ = outcomes.send(Outcome::CleanupDone {
                        removed: result.removed,
                        manual: false,
                    });
                }
                Err(_) => {
                    tracing::error!("Scheduled cleanup did not complete");
                    let _ = outcomes.send(Outcome::CleanupFailed {
                        removed: 0,
                        manual: false,
                    });
                }
            }
        });
        true
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let table = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        table.running = false;
        table.cancel_all();
    }
}

/// Hands a breach from the sampling schedule back to the coordinator
struct BreachResponse<'a> {
    inner: &'a Arc<Inner>,
    sampling: &'a ScheduleHandle,
}

impl BreachResponder for BreachResponse<'_> {
    fn respond_to_breach(&self, count: usize, limit: usize) {
        self.inner.rearm(Some((self.sampling, count, limit)), true);
    }
}

/// Hands queued outcomes to the sink. Ends once every sender is gone.
async fn run_publisher(mut rx: mpsc::UnboundedReceiver<Outcome>, sink: Arc<dyn OutcomeSink>) {
    while let Some(outcome) = rx.recv().await {
        sink.publish(outcome);
    }
}

fn ticker(delay: Duration, period: Duration) -> tokio::time::Interval {
    let mut ticker = interval_at(Instant::now() + delay, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn run_reduction_schedule(
    inner: Weak<Inner>,
    handle: Arc<ScheduleHandle>,
    delay: Duration,
    period: Duration,
) {
    let mut ticker = ticker(delay, period);
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        if !inner.fire_reduction(&handle) {
            break;
        }
    }
}

async fn run_sampling_schedule(
    inner: Weak<Inner>,
    handle: Arc<ScheduleHandle>,
    delay: Duration,
    period: Duration,
) {
    let mut ticker = ticker(delay, period);
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };

        let (result_rx, ceiling) = {
            let table = inner.lock();
            if !table.is_current(&handle) || !handle.mark_fired() {
                break;
            }
            let Some(settings) = table.settings.clone() else {
                break;
            };
            let ceiling = settings.population_ceiling;
            let submitted = inner
                .domain
                .submit(move |server| Sampler::new(&settings.filter).sample(server));
            match submitted {
                Ok(rx) => {
                    inner.samples_dispatched.fetch_add(1, Ordering::SeqCst);
                    (rx, ceiling)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Could not dispatch sample");
                    break;
                }
            }
        };

        let sample = match result_rx.await {
            Ok(sample) => sample,
            Err(_) => {
                tracing::error!("Sampling pass did not complete");
                handle.rearm_after_fire();
                continue;
            }
        };
        handle.rearm_after_fire();

        let responder = BreachResponse {
            inner: &inner,
            sampling: &handle,
        };
        inner.monitor.on_sample(&sample, ceiling, &responder);
    }
}
