//! The mutation domain
//!
//! A single Tokio task owns the `Server` and is the only place world state
//! is read or written. Other contexts submit closures through a
//! `DomainHandle`; jobs run one at a time in submission order and their
//! results come back over a oneshot channel. An optional game loop steps the
//! simulation between jobs at a fixed period.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::core::error::{ClearlagError, Result};
use crate::ecs::world::Server;

type Job = Box<dyn FnOnce(&mut Server) + Send + 'static>;

enum DomainMessage {
    Job(Job),
    Shutdown,
}

/// Cloneable submission handle for the mutation domain
#[derive(Clone)]
pub struct DomainHandle {
    tx: mpsc::UnboundedSender<DomainMessage>,
}

impl DomainHandle {
    /// Enqueue a job without waiting for it. Never blocks.
    pub fn submit<R, F>(&self, job: F) -> Result<oneshot::Receiver<R>>
    where
        F: FnOnce(&mut Server) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::new(move |server| {
            // The submitter may have stopped waiting
            let _ = result_tx.send(job(server));
        });
        self.tx
            .send(DomainMessage::Job(job))
            .map_err(|_| ClearlagError::DomainClosed)?;
        Ok(result_rx)
    }

    /// Run a job on the mutation domain and wait for its result
    pub async fn run<R, F>(&self, job: F) -> Result<R>
    where
        F: FnOnce(&mut Server) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit(job)?
            .await
            .map_err(|_| ClearlagError::DomainClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

struct GameLoop {
    ticker: Interval,
    step: Box<dyn FnMut(&mut Server) + Send + 'static>,
}

/// Owner of the mutation domain task
pub struct MutationDomain {
    handle: DomainHandle,
    join: JoinHandle<Server>,
}

impl MutationDomain {
    /// Spawn a domain that only runs submitted jobs
    pub fn spawn(server: Server) -> Self {
        Self::spawn_inner(server, None)
    }

    /// Spawn a domain that also steps the simulation every `period`
    pub fn spawn_with_game_loop<F>(server: Server, period: Duration, step: F) -> Self
    where
        F: FnMut(&mut Server) + Send + 'static,
    {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self::spawn_inner(
            server,
            Some(GameLoop {
                ticker,
                step: Box::new(step),
            }),
        )
    }

    fn spawn_inner(server: Server, game_loop: Option<GameLoop>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let join = tokio::spawn(run_domain(server, rx, game_loop));
        Self {
            handle: DomainHandle { tx },
            join,
        }
    }

    pub fn handle(&self) -> DomainHandle {
        self.handle.clone()
    }

    /// Stop after the already-queued jobs and return the server
    pub async fn shutdown(self) -> Result<Server> {
        // Fails only if the task already ended, which join reports below
        let _ = self.handle.tx.send(DomainMessage::Shutdown);
        self.join.await.map_err(|e| {
            tracing::error!(error = %e, "Mutation domain task failed");
            ClearlagError::DomainClosed
        })
    }
}

async fn run_domain(
    mut server: Server,
    mut rx: mpsc::UnboundedReceiver<DomainMessage>,
    mut game_loop: Option<GameLoop>,
) -> Server {
    tracing::debug!("Mutation domain started");
    loop {
        let message = match game_loop.as_mut() {
            Some(game_loop) => {
                tokio::select! {
                    biased;
                    message = rx.recv() => message,
                    _ = game_loop.ticker.tick() => {
                        (game_loop.step)(&mut server);
                        continue;
                    }
                }
            }
            None => rx.recv().await,
        };

        match message {
            Some(DomainMessage::Job(job)) => {
                // A panicking job drops its result sender; the submitter sees DomainClosed
                if catch_unwind(AssertUnwindSafe(|| job(&mut server))).is_err() {
                    tracing::error!("Job panicked inside the mutation domain");
                }
            }
            Some(DomainMessage::Shutdown) | None => break,
        }
    }
    tracing::debug!("Mutation domain stopped");
    server
}
