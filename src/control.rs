//! PopulationControl - the facade the binary and command layer talk to
//!
//! Owns the current configuration snapshot and the coordinator. Manual
//! reductions go straight to the mutation domain, serialised with whatever
//! the schedules submit.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::core::config::{ConfigProvider, LoadedConfig, Settings};
use crate::core::error::{ClearlagError, Result};
use crate::core::types::TICKS_PER_SECOND;
use crate::notify::{MessageCatalog, Outcome, OutcomeSink};
use crate::population::{Reducer, Sampler, WorldFailure};
use crate::scheduler::{CoordinatorStatus, ScheduleHandle, TimerCoordinator};
use crate::simulation::domain::DomainHandle;

pub struct PopulationControl {
    domain: DomainHandle,
    coordinator: TimerCoordinator,
    provider: Arc<dyn ConfigProvider>,
    sink: Arc<dyn OutcomeSink>,
    settings: RwLock<Arc<Settings>>,
    messages: RwLock<Arc<MessageCatalog>>,
    /// Serialises start and reload so the coordinator always runs the
    /// snapshot held in `settings`
    transition: Mutex<()>,
    manual_passes: AtomicU64,
}

/// Snapshot returned by `clearlag status`
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub running: bool,
    pub cleanup_interval_seconds: u64,
    pub cleanup_delay_seconds: u64,
    pub sampling_interval_seconds: u64,
    pub population_ceiling: usize,
    pub categories: Vec<String>,
    pub filtered_population: usize,
    pub total_population: usize,
    pub failed_worlds: Vec<WorldFailure>,
    pub manual_passes: u64,
    pub schedules: CoordinatorStatus,
}

impl StatusReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} | {} of {} entities match the filter (ceiling {}) | cleanup every {}s, sampling every {}s",
            if self.running { "running" } else { "stopped" },
            self.filtered_population,
            self.total_population,
            self.population_ceiling,
            self.cleanup_interval_seconds,
            self.sampling_interval_seconds,
        )
    }
}

impl PopulationControl {
    /// Load the initial snapshot from `provider`. Schedules stay unarmed until `start`.
    pub fn new(
        domain: DomainHandle,
        provider: Arc<dyn ConfigProvider>,
        sink: Arc<dyn OutcomeSink>,
    ) -> Self {
        let LoadedConfig { settings, messages } = provider.load();
        sink.messages_reloaded(&messages);
        tracing::info!(settings = %settings.describe(), "Configuration loaded");

        Self {
            coordinator: TimerCoordinator::new(domain.clone(), sink.clone()),
            domain,
            provider,
            sink,
            settings: RwLock::new(Arc::new(settings)),
            messages: RwLock::new(Arc::new(messages)),
            transition: Mutex::new(()),
            manual_passes: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages(&self) -> Arc<MessageCatalog> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn coordinator(&self) -> &TimerCoordinator {
        &self.coordinator
    }

    fn transition(&self) -> MutexGuard<'_, ()> {
        self.transition.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn start(&self) {
        let _transition = self.transition();
        self.coordinator.start(self.settings());
    }

    pub fn stop(&self) {
        self.coordinator.stop();
    }

    pub fn is_running(&self) -> bool {
        self.coordinator.is_running()
    }

    /// Re-read configuration and swap it in. A running coordinator is
    /// restarted on the new cadences.
    pub fn reload(&self) -> Arc<Settings> {
        let _transition = self.transition();
        let LoadedConfig { settings, messages } = self.provider.load();
        let settings = Arc::new(settings);

        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings.clone();
        *self.messages.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(messages.clone());
        self.sink.messages_reloaded(&messages);

        self.coordinator.restart_if_running(settings.clone());
        tracing::info!(settings = %settings.describe(), "Configuration reloaded");
        settings
    }

    pub fn rearm_reduction(&self) -> Result<Arc<ScheduleHandle>> {
        self.coordinator
            .rearm_reduction()
            .ok_or(ClearlagError::NotStarted)
    }

    /// Run one reduction pass now, outside the schedules
    ///
    /// The outcome is for the invoker only. A pass that could not reach the
    /// mutation domain, or skipped a world, is reported as failed; anything
    /// already removed stays removed.
    pub async fn manual_cleanup(&self) -> Outcome {
        self.manual_passes.fetch_add(1, Ordering::SeqCst);
        let settings = self.settings();
        let pass = self
            .domain
            .run(move |server| Reducer::new(&settings.filter).reduce(server))
            .await;

        match pass {
            Ok(result) if !result.is_partial() => {
                tracing::info!(removed = result.removed, "Manual cleanup complete");
                Outcome::CleanupDone {
                    removed: result.removed,
                    manual: true,
                }
            }
            Ok(result) => {
                for failure in &result.failures {
                    tracing::warn!(world = %failure.world, reason = %failure.reason, "World skipped during manual cleanup");
                }
                Outcome::CleanupFailed {
                    removed: result.removed,
                    manual: true,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Manual cleanup failed");
                Outcome::CleanupFailed {
                    removed: 0,
                    manual: true,
                }
            }
        }
    }

    pub async fn status(&self) -> Result<StatusReport> {
        let settings = self.settings();
        let filter = settings.clone();
        let (sample, total_population) = self
            .domain
            .run(move |server| {
                (
                    Sampler::new(&filter.filter).sample(server),
                    server.entity_count(),
                )
            })
            .await?;

        Ok(StatusReport {
            running: self.coordinator.is_running(),
            cleanup_interval_seconds: settings.reduction_interval_ticks / TICKS_PER_SECOND,
            cleanup_delay_seconds: settings.reduction_delay_ticks / TICKS_PER_SECOND,
            sampling_interval_seconds: settings.sampling_interval_ticks / TICKS_PER_SECOND,
            population_ceiling: settings.population_ceiling,
            categories: settings
                .filter
                .sorted()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            filtered_population: sample.count,
            total_population,
            failed_worlds: sample.failures,
            manual_passes: self.manual_passes.load(Ordering::SeqCst),
            schedules: self.coordinator.status(),
        })
    }
}
