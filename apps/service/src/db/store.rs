use std::time::{Duration, SystemTime};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use libsql::{params, Row};
use uuid::Uuid;

use upcheck::{CheckRecord, ProbeResult, ProbeStatus, ResultStore, TrackedUrl};

use crate::pool::{LibsqlManager, LibsqlPool};

/// libsql-backed result store
pub struct LibsqlStore {
    pool: LibsqlPool,
}

impl LibsqlStore {
    pub fn new(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool
    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>> {
        Ok(self.pool.get().await?)
    }

    fn tracked_from_row(row: &Row) -> Result<TrackedUrl> {
        let uuid_str: String = row.get(0)?;
        let headers_json: String = row.get(2)?;
        let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
        let created_at: i64 = row.get(4)?;

        Ok(TrackedUrl {
            id: Uuid::parse_str(&uuid_str)?,
            url: row.get(1)?,
            headers: if headers.is_empty() { None } else { Some(headers) },
            timeout_ms: row.get::<Option<i64>>(3)?.map(|v| v as u64),
            created_at: ProbeResult::millis_to_timestamp(created_at),
        })
    }
}

#[async_trait]
impl ResultStore for LibsqlStore {
    async fn register(&self, tracked: TrackedUrl) -> Result<()> {
        let conn = self.get_conn().await?;
        let headers_json =
            serde_json::to_string(&tracked.headers.clone().unwrap_or_default())?;

        conn.execute(
            "INSERT INTO tracked_urls (uuid, url, headers, timeout_ms, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                tracked.id.to_string(),
                tracked.url.clone(),
                headers_json,
                tracked.timeout_ms.map(|v| v as i64),
                ProbeResult::timestamp_to_millis(tracked.created_at)
            ],
        )
        .await?;
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        let conn = self.get_conn().await?;

        // Delete the record first; foreign_keys enforcement is off by
        // default on fresh connections, so the cascade is done by hand.
        conn.execute(
            "DELETE FROM check_records WHERE tracked_url_uuid = ?",
            params![id.to_string()],
        )
        .await?;
        conn.execute("DELETE FROM tracked_urls WHERE uuid = ?", params![id.to_string()])
            .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<TrackedUrl>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare("SELECT uuid, url, headers, timeout_ms, created_at FROM tracked_urls")
            .await?;

        let mut rows = stmt.query(()).await?;
        let mut urls = Vec::new();
        while let Some(row) = rows.next().await? {
            urls.push(Self::tracked_from_row(&row)?);
        }

        Ok(urls)
    }

    async fn record(&self, id: Uuid, result: ProbeResult) -> Result<()> {
        let conn = self.get_conn().await?;

        // Last-write-wins by checked_at: the upsert only applies when the
        // arriving result is at least as new as the stored one.
        conn.execute(
            "INSERT INTO check_records (tracked_url_uuid, status, response_time_ms, http_status, error_message, checked_at_ms)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(tracked_url_uuid) DO UPDATE SET
                status = excluded.status,
                response_time_ms = excluded.response_time_ms,
                http_status = excluded.http_status,
                error_message = excluded.error_message,
                checked_at_ms = excluded.checked_at_ms
             WHERE excluded.checked_at_ms >= check_records.checked_at_ms",
            params![
                id.to_string(),
                result.status.to_string(),
                result.response_time_ms as i64,
                result.http_status.map(|v| v as i64),
                result.error.clone(),
                ProbeResult::timestamp_to_millis(result.checked_at)
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_status(&self, id: Uuid) -> Result<Option<CheckRecord>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(
                "SELECT status, response_time_ms, http_status, error_message, checked_at_ms
                 FROM check_records WHERE tracked_url_uuid = ?",
            )
            .await?;

        let mut rows = stmt.query(params![id.to_string()]).await?;

        if let Some(row) = rows.next().await? {
            let status_str: String = row.get(0)?;
            let status = match status_str.as_str() {
                "accessible" => ProbeStatus::Accessible,
                "inaccessible" => ProbeStatus::Inaccessible,
                other => return Err(anyhow!("unknown probe status in store: {other}")),
            };
            let checked_at: i64 = row.get(4)?;

            Ok(Some(CheckRecord {
                tracked_url_id: id,
                result: ProbeResult {
                    status,
                    response_time_ms: row.get::<i64>(1)? as u64,
                    http_status: row.get::<Option<i64>>(2)?.map(|v| v as u16),
                    error: row.get(3)?,
                    checked_at: ProbeResult::millis_to_timestamp(checked_at),
                },
            }))
        } else {
            Ok(None)
        }
    }

    async fn list_stale(&self, older_than: Duration) -> Result<Vec<TrackedUrl>> {
        let threshold = SystemTime::now()
            .checked_sub(older_than)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let threshold_ms = ProbeResult::timestamp_to_millis(threshold);

        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(
                "SELECT t.uuid, t.url, t.headers, t.timeout_ms, t.created_at
                 FROM tracked_urls t
                 LEFT JOIN check_records c ON c.tracked_url_uuid = t.uuid
                 WHERE c.checked_at_ms IS NULL OR c.checked_at_ms < ?",
            )
            .await?;

        let mut rows = stmt.query(params![threshold_ms]).await?;
        let mut urls = Vec::new();
        while let Some(row) = rows.next().await? {
            urls.push(Self::tracked_from_row(&row)?);
        }

        Ok(urls)
    }
}
