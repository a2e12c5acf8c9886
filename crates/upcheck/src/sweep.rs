use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::batch::{run_batch, CancelFlag};
use crate::prober::Probe;
use crate::store::ResultStore;
use crate::types::SweepRun;
use crate::DEFAULT_CONCURRENCY;

/// Sweep controller configuration
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// When false, the controller never starts its interval timer
    pub enabled: bool,

    /// When false, the process constructs the controller but does not
    /// start the interval loop; sweeps must be triggered manually
    pub auto_start: bool,

    pub interval: Duration,
    pub concurrency: usize,

    /// Records older than this are due for a re-check
    pub stale_threshold: Duration,

    /// Sweep every tracked URL instead of only the stale ones
    pub check_all: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_start: true,
            interval: Duration::from_secs(60),
            concurrency: DEFAULT_CONCURRENCY,
            stale_threshold: Duration::from_secs(300),
            check_all: false,
        }
    }
}

/// Outcome of a manual sweep trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started,
    AlreadyRunning,
}

/// Resets the running guard on every exit path
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Recurring sweep controller
///
/// Drives the batch scheduler over the store's tracked URLs on an
/// interval. At most one sweep is ever in flight: the guard flag is
/// checked and set atomically, and a tick that lands while a sweep is
/// running is a logged no-op, never queued.
pub struct SweepController {
    probe: Arc<dyn Probe>,
    store: Arc<dyn ResultStore>,
    config: SweepConfig,
    running: AtomicBool,
    last_run: Mutex<Option<SweepRun>>,
    cancel: CancelFlag,
}

impl SweepController {
    pub fn new(
        probe: Arc<dyn Probe>,
        store: Arc<dyn ResultStore>,
        config: SweepConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            probe,
            store,
            config,
            running: AtomicBool::new(false),
            last_run: Mutex::new(None),
            cancel: CancelFlag::new(),
        })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Most recent sweep, running or finished
    pub fn last_run(&self) -> Option<SweepRun> {
        self.last_run.lock().ok().and_then(|guard| guard.clone())
    }

    /// Stop dispatching new probes; in-flight probes finish under their
    /// own timeout and the interval loop winds down
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Spawn the interval loop
    ///
    /// Returns `None` when the controller is disabled. The first tick is
    /// consumed immediately so the loop waits a full interval before its
    /// first sweep.
    pub fn start(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            info!("sweep timer disabled by configuration");
            return None;
        }

        Some(tokio::spawn(async move {
            let period = self.config.interval.max(Duration::from_millis(1));
            let mut timer = interval(period);
            timer.tick().await;

            loop {
                timer.tick().await;
                if self.cancel.is_cancelled() {
                    debug!("sweep timer stopping after shutdown");
                    break;
                }
                self.run_once().await;
            }
        }))
    }

    /// Start a sweep without waiting for it to finish
    ///
    /// No-op when a sweep is already in flight.
    pub fn trigger(self: Arc<Self>) -> TriggerOutcome {
        if self.is_running() {
            info!("sweep trigger ignored, a sweep is already in flight");
            return TriggerOutcome::AlreadyRunning;
        }

        tokio::spawn(async move {
            self.run_once().await;
        });
        TriggerOutcome::Started
    }

    /// Run one guarded sweep to completion
    ///
    /// Returns `None` when another sweep holds the guard.
    pub async fn run_once(&self) -> Option<SweepRun> {
        // Check-and-set must be atomic: a manual trigger can race a
        // timer tick.
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("sweep tick skipped, previous sweep still running");
            return None;
        }
        let _guard = RunningGuard(&self.running);

        let run = self.sweep().await;
        if let Ok(mut last) = self.last_run.lock() {
            *last = Some(run.clone());
        }

        info!(
            total = run.total,
            succeeded = run.succeeded,
            failed = run.failed,
            cancelled = run.cancelled,
            "sweep finished"
        );
        Some(run)
    }

    async fn sweep(&self) -> SweepRun {
        let targets = if self.config.check_all {
            self.store.list_all().await
        } else {
            self.store.list_stale(self.config.stale_threshold).await
        };

        let targets = match targets {
            Ok(targets) => targets,
            Err(error) => {
                warn!("sweep aborted, could not list targets: {error:#}");
                let mut run = SweepRun::begin(0);
                run.error = Some(error.to_string());
                run.finish(false);
                return run;
            }
        };

        let mut run = SweepRun::begin(targets.len());
        debug!("sweep starting over {} targets", run.total);

        let (mut rx, driver) = run_batch(
            self.probe.clone(),
            targets,
            self.config.concurrency,
            self.cancel.clone(),
        );

        while let Some((tracked, result)) = rx.recv().await {
            run.tally(&result);
            if let Err(error) = self.store.record(tracked.id, result).await {
                // A store failure marks the run, but the sweep still
                // drains so the remaining URLs get probed and counted.
                warn!("failed to record result for {}: {error:#}", tracked.url);
                run.error.get_or_insert(error.to_string());
            }
        }

        let cancelled = match driver.await {
            Ok(summary) => summary.cancelled,
            Err(error) => {
                warn!("batch driver panicked: {error}");
                run.error.get_or_insert(error.to_string());
                false
            }
        };

        run.finish(cancelled);
        run
    }
}
