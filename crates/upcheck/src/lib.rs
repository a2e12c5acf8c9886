//! Upcheck - URL availability probing engine
//!
//! This library provides the building blocks for checking whether tracked
//! URLs are reachable: a probe executor, a bounded-concurrency batch
//! scheduler, a result store contract, and a recurring sweep controller.

pub mod batch;
pub mod prober;
pub mod store;
pub mod sweep;
pub mod types;
pub mod validation;

// Re-export main types
pub use batch::{run_batch, BatchSummary, CancelFlag};
pub use prober::{Probe, ProbeOptions, Prober, ProberConfig};
pub use store::{MemoryStore, ResultStore};
pub use sweep::{SweepConfig, SweepController, TriggerOutcome};
pub use types::{CheckRecord, ProbeResult, ProbeStatus, SweepRun, TrackedUrl};

/// Re-export common error types
pub use anyhow;

/// Upcheck result type using anyhow for error handling
pub type Result<T> = anyhow::Result<T>;

/// Default per-probe timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default number of probes in flight during a batch
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Redirect chains are cut off after this many hops
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
