use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::prober::{Probe, ProbeOptions};
use crate::types::{ProbeResult, TrackedUrl};

/// Cooperative cancellation signal shared between a batch and its caller
///
/// Cancelling stops new dispatch only; probes already in flight finish
/// under their own timeout.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Final accounting for one batch
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Number of URLs handed to the batch
    pub total: usize,

    /// Number of probes actually dispatched (== total unless cancelled)
    pub dispatched: usize,

    /// Number of probes that produced a result
    pub completed: usize,

    pub succeeded: usize,
    pub failed: usize,

    /// Set when cancellation stopped dispatch before the queue drained
    pub cancelled: bool,
}

/// Fan a collection of URLs out to the probe executor under a concurrency
/// cap.
///
/// Pairs are emitted on the returned channel in completion order, as soon
/// as each probe resolves; the join handle yields the batch summary once
/// every dispatched probe has finished. A slot frees the moment its probe
/// resolves, so slow URLs only ever hold up their own slot.
pub fn run_batch(
    probe: Arc<dyn Probe>,
    urls: Vec<TrackedUrl>,
    concurrency: usize,
    cancel: CancelFlag,
) -> (
    mpsc::Receiver<(TrackedUrl, ProbeResult)>,
    JoinHandle<BatchSummary>,
) {
    let concurrency = concurrency.max(1);
    let (tx, rx) = mpsc::channel(concurrency);

    let driver = tokio::spawn(async move {
        let total = urls.len();
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut tasks = Vec::with_capacity(total);

        for tracked in urls {
            if cancel.is_cancelled() {
                debug!("batch cancelled with {} of {total} dispatched", tasks.len());
                break;
            }

            // Waiting on a permit is what bounds the pool: dispatch
            // resumes the instant a running probe releases its slot.
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            if cancel.is_cancelled() {
                debug!("batch cancelled with {} of {total} dispatched", tasks.len());
                break;
            }

            let probe = probe.clone();
            let tx = tx.clone();
            tasks.push(tokio::spawn(async move {
                let options = ProbeOptions::from_tracked(&tracked);
                let result = probe.probe(&tracked.url, &options).await;
                let succeeded = result.is_accessible();

                // The receiver may already be gone; the probe result is
                // still counted in the summary.
                let _ = tx.send((tracked, result)).await;
                drop(permit);
                succeeded
            }));
        }
        drop(tx);

        let dispatched = tasks.len();
        let mut summary = BatchSummary {
            total,
            dispatched,
            cancelled: dispatched < total,
            ..BatchSummary::default()
        };

        for outcome in join_all(tasks).await {
            match outcome {
                Ok(succeeded) => {
                    summary.completed += 1;
                    if succeeded {
                        summary.succeeded += 1;
                    } else {
                        summary.failed += 1;
                    }
                }
                Err(error) => warn!("probe task panicked: {error}"),
            }
        }

        summary
    });

    (rx, driver)
}
