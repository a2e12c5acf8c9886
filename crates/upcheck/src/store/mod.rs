//! Result aggregation and tracked-URL ownership
//!
//! The store is the only shared mutable resource in the system; every
//! reader and writer goes through the [`ResultStore`] contract, never
//! through records directly. Implementations are storage-agnostic: the
//! in-memory store here is the reference, the service ships a libsql one.

pub mod memory;

pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::types::{CheckRecord, ProbeResult, TrackedUrl};

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Register a URL for availability checking
    async fn register(&self, tracked: TrackedUrl) -> Result<()>;

    /// Remove a tracked URL and its check record
    async fn remove(&self, id: Uuid) -> Result<()>;

    /// All tracked URLs
    async fn list_all(&self) -> Result<Vec<TrackedUrl>>;

    /// Upsert the check record for a tracked URL
    ///
    /// Last-write-wins ordered by `checked_at`; an equal timestamp is
    /// resolved in favor of the arriving write.
    async fn record(&self, id: Uuid, result: ProbeResult) -> Result<()>;

    /// Latest known record for a tracked URL; never triggers a probe
    async fn get_status(&self, id: Uuid) -> Result<Option<CheckRecord>>;

    /// Tracked URLs whose record is missing or older than the threshold
    ///
    /// Recomputed from current store state on every call.
    async fn list_stale(&self, older_than: Duration) -> Result<Vec<TrackedUrl>>;
}
