use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use super::ResultStore;
use crate::types::{CheckRecord, ProbeResult, TrackedUrl};

/// In-memory result store
///
/// Locks are held only for the map operation itself, never across an
/// await point.
#[derive(Default)]
pub struct MemoryStore {
    urls: RwLock<HashMap<Uuid, TrackedUrl>>,
    records: RwLock<HashMap<Uuid, CheckRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn register(&self, tracked: TrackedUrl) -> Result<()> {
        let mut urls = self.urls.write().map_err(|_| anyhow!("url map poisoned"))?;
        urls.insert(tracked.id, tracked);
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        let mut urls = self.urls.write().map_err(|_| anyhow!("url map poisoned"))?;
        urls.remove(&id);
        drop(urls);

        let mut records = self.records.write().map_err(|_| anyhow!("record map poisoned"))?;
        records.remove(&id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<TrackedUrl>> {
        let urls = self.urls.read().map_err(|_| anyhow!("url map poisoned"))?;
        Ok(urls.values().cloned().collect())
    }

    async fn record(&self, id: Uuid, result: ProbeResult) -> Result<()> {
        let mut records = self.records.write().map_err(|_| anyhow!("record map poisoned"))?;

        let stale = records
            .get(&id)
            .map(|existing| existing.result.checked_at > result.checked_at)
            .unwrap_or(false);
        if !stale {
            records.insert(id, CheckRecord { tracked_url_id: id, result });
        }
        Ok(())
    }

    async fn get_status(&self, id: Uuid) -> Result<Option<CheckRecord>> {
        let records = self.records.read().map_err(|_| anyhow!("record map poisoned"))?;
        Ok(records.get(&id).cloned())
    }

    async fn list_stale(&self, older_than: Duration) -> Result<Vec<TrackedUrl>> {
        let threshold = SystemTime::now()
            .checked_sub(older_than)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let records = self.records.read().map_err(|_| anyhow!("record map poisoned"))?;
        let urls = self.urls.read().map_err(|_| anyhow!("url map poisoned"))?;

        Ok(urls
            .values()
            .filter(|tracked| match records.get(&tracked.id) {
                Some(record) => record.result.checked_at < threshold,
                None => true,
            })
            .cloned()
            .collect())
    }
}
