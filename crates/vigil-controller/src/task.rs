//! Background monitor task
//!
//! Handles:
//! - Polling every signal on a fixed period
//! - Scheduled flushes of the event log to storage
//! - Flush and status requests from the console
//! - A final flush on shutdown
//!
//! The task owns the [`EventMonitor`]; everything else talks to it through a
//! [`MonitorHandle`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use vigil_eventlog::{
    Clock, EventMonitor, EventRecord, EventStorage, FlushResult, PersistenceCoordinator,
};

use crate::config::ControllerConfig;
use crate::error::{ControllerError, ControllerResult};
use crate::signals::SignalBoard;

/// Depth of the request queue between handle and task
const REQUEST_QUEUE_DEPTH: usize = 16;

/// Timing and flush policy of the monitor task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub flush_interval: Option<Duration>,
    pub clear_after_flush: bool,
}

impl MonitorSettings {
    /// Settings for a validated `config`
    pub fn from_config(config: &ControllerConfig) -> ControllerResult<Self> {
        config.validate()?;
        let settings = Self {
            poll_interval: config.poll_interval(),
            flush_interval: config.flush_interval(),
            clear_after_flush: config.clear_after_flush,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Timer periods must be non-zero
    pub fn validate(&self) -> ControllerResult<()> {
        if self.poll_interval.is_zero() {
            return Err(ControllerError::Config("poll interval must be non-zero".into()));
        }
        if self.flush_interval.is_some_and(|period| period.is_zero()) {
            return Err(ControllerError::Config("flush interval must be non-zero".into()));
        }
        Ok(())
    }
}

/// Snapshot of the running monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorStatus {
    /// Records currently held in the log
    pub events: usize,
    /// Log capacity
    pub capacity: usize,
    /// Most recent record, if any
    pub newest: Option<EventRecord>,
    /// Signal levels as last set on the board
    pub signals: Vec<(String, bool)>,
}

enum TaskRequest {
    Flush(oneshot::Sender<FlushResult>),
    Status(oneshot::Sender<MonitorStatus>),
}

/// Client side of a running [`MonitorTask`]
pub struct MonitorHandle {
    requests: mpsc::Sender<TaskRequest>,
    shutdown_tx: broadcast::Sender<()>,
    join: JoinHandle<FlushResult>,
}

impl MonitorHandle {
    /// Flush the log now
    pub async fn flush(&self) -> ControllerResult<FlushResult> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(TaskRequest::Flush(tx))
            .await
            .map_err(|_| ControllerError::TaskStopped)?;
        rx.await.map_err(|_| ControllerError::TaskStopped)
    }

    /// Current log occupancy and signal levels
    pub async fn status(&self) -> ControllerResult<MonitorStatus> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(TaskRequest::Status(tx))
            .await
            .map_err(|_| ControllerError::TaskStopped)?;
        rx.await.map_err(|_| ControllerError::TaskStopped)
    }

    /// Stop the task and wait for its final flush
    pub async fn shutdown(self) -> ControllerResult<FlushResult> {
        let _ = self.shutdown_tx.send(());
        self.join.await.map_err(|_| ControllerError::TaskStopped)
    }
}

/// Background task driving an [`EventMonitor`]
///
/// Flushes run inline on the task, so storage writes block its worker thread
/// for their duration. Appends cannot interleave with a flush.
pub struct MonitorTask<C: Clock, S> {
    monitor: EventMonitor<C>,
    board: Arc<SignalBoard>,
    storage: Arc<S>,
    coordinator: PersistenceCoordinator,
    settings: MonitorSettings,
    requests: mpsc::Receiver<TaskRequest>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl<C, S> MonitorTask<C, S>
where
    C: Clock + Send + 'static,
    S: EventStorage + Send + Sync + 'static,
{
    /// Spawn the task on the current runtime
    ///
    /// Fails without spawning when `settings` carries a zero period.
    pub fn spawn(
        monitor: EventMonitor<C>,
        board: Arc<SignalBoard>,
        storage: Arc<S>,
        coordinator: PersistenceCoordinator,
        settings: MonitorSettings,
    ) -> ControllerResult<MonitorHandle> {
        settings.validate()?;

        let (requests_tx, requests) = mpsc::channel(REQUEST_QUEUE_DEPTH);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = Self {
            monitor,
            board,
            storage,
            coordinator,
            settings,
            requests,
            shutdown_rx,
        };

        let join = tokio::spawn(async move { task.run().await });

        Ok(MonitorHandle {
            requests: requests_tx,
            shutdown_tx,
            join,
        })
    }

    /// Run the monitor loop until shutdown, then flush once more
    async fn run(mut self) -> FlushResult {
        info!(
            poll_ms = self.settings.poll_interval.as_millis() as u64,
            flush_secs = self.settings.flush_interval.map(|d| d.as_secs()),
            capacity = self.monitor.log().capacity(),
            "Monitor task started"
        );

        let mut poll = tokio::time::interval(self.settings.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Scheduled flushes start one full period after startup
        let mut flush_timer = self.settings.flush_interval.map(|period| {
            let mut timer = tokio::time::interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer
        });

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("Monitor task shutting down");
                    break;
                }
                _ = poll.tick() => {
                    self.monitor.tick(self.board.as_ref());
                }
                _ = next_tick(&mut flush_timer) => {
                    debug!("Scheduled flush");
                    self.flush();
                }
                Some(request) = self.requests.recv() => {
                    self.handle(request);
                }
            }
        }

        self.flush()
    }

    fn handle(&mut self, request: TaskRequest) {
        match request {
            TaskRequest::Flush(reply) => {
                let result = self.flush();
                if reply.send(result).is_err() {
                    debug!("Flush requester went away");
                }
            }
            TaskRequest::Status(reply) => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn flush(&mut self) -> FlushResult {
        let result = self
            .monitor
            .flush(&self.coordinator, self.storage.as_ref());

        if self.settings.clear_after_flush {
            if result.is_complete() && result.written() > 0 {
                self.monitor.log_mut().clear();
                debug!(cleared = result.written(), "Event log cleared after flush");
            } else if !result.is_complete() {
                warn!(
                    failed = result.failed(),
                    "Keeping event log after incomplete flush"
                );
            }
        }

        result
    }

    fn status(&self) -> MonitorStatus {
        let log = self.monitor.log();
        MonitorStatus {
            events: log.size(),
            capacity: log.capacity(),
            newest: log.iter().last().cloned(),
            signals: self.board.snapshot(),
        }
    }
}

/// Wait for the next tick, or forever when no timer is configured
async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
