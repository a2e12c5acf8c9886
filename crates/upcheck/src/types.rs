use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Outcome classification of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Accessible,
    Inaccessible,
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeStatus::Accessible => write!(f, "accessible"),
            ProbeStatus::Inaccessible => write!(f, "inaccessible"),
        }
    }
}

/// Result of a single reachability probe
///
/// Immutable once produced; every probe execution yields exactly one of
/// these, whatever the transport did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Outcome classification
    pub status: ProbeStatus,

    /// Time from request dispatch to outcome determination, in milliseconds
    pub response_time_ms: u64,

    /// HTTP status code, when a response was received
    pub http_status: Option<u16>,

    /// Human-readable failure cause ("HTTP 404", "timeout", ...)
    pub error: Option<String>,

    /// Timestamp when the probe was performed
    pub checked_at: SystemTime,
}

impl ProbeResult {
    /// Create an accessible result
    pub fn accessible(response_time_ms: u64, http_status: u16) -> Self {
        Self {
            status: ProbeStatus::Accessible,
            response_time_ms,
            http_status: Some(http_status),
            error: None,
            checked_at: SystemTime::now(),
        }
    }

    /// Create an inaccessible result carrying an HTTP status code
    pub fn inaccessible_status(response_time_ms: u64, http_status: u16) -> Self {
        Self {
            status: ProbeStatus::Inaccessible,
            response_time_ms,
            http_status: Some(http_status),
            error: Some(format!("HTTP {http_status}")),
            checked_at: SystemTime::now(),
        }
    }

    /// Create an inaccessible result for a transport-level failure
    pub fn inaccessible(response_time_ms: u64, error: String) -> Self {
        Self {
            status: ProbeStatus::Inaccessible,
            response_time_ms,
            http_status: None,
            error: Some(error),
            checked_at: SystemTime::now(),
        }
    }

    pub fn is_accessible(&self) -> bool {
        self.status == ProbeStatus::Accessible
    }

    /// Convert SystemTime to Unix milliseconds
    pub fn timestamp_to_millis(time: SystemTime) -> i64 {
        time.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
    }

    /// Convert Unix milliseconds to SystemTime
    pub fn millis_to_timestamp(millis: i64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(millis.max(0) as u64)
    }
}

/// A URL registered for availability checking
///
/// Owned by the result store: created when an entry is registered and
/// removed when the entry is deleted upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedUrl {
    pub id: Uuid,
    pub url: String,

    /// Extra request headers sent with every probe of this URL
    pub headers: Option<Vec<(String, String)>>,

    /// Per-URL probe timeout override in milliseconds
    pub timeout_ms: Option<u64>,

    pub created_at: SystemTime,
}

impl TrackedUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            headers: None,
            timeout_ms: None,
            created_at: SystemTime::now(),
        }
    }
}

/// Latest probe result bound to a tracked URL
///
/// Replaced wholesale on every completed probe; never partially updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRecord {
    pub tracked_url_id: Uuid,
    pub result: ProbeResult,
}

/// Bookkeeping for one pass over the tracked URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRun {
    pub started_at: SystemTime,
    pub finished_at: Option<SystemTime>,
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,

    /// First store failure encountered, if any; the run still finishes
    pub error: Option<String>,
}

impl SweepRun {
    /// Start a new run over `total` targets
    pub fn begin(total: usize) -> Self {
        Self {
            started_at: SystemTime::now(),
            finished_at: None,
            total,
            completed: 0,
            succeeded: 0,
            failed: 0,
            cancelled: false,
            error: None,
        }
    }

    /// Count one emitted probe result
    pub fn tally(&mut self, result: &ProbeResult) {
        self.completed += 1;
        if result.is_accessible() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Close the run; idempotent on `finished_at`
    pub fn finish(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
        self.finished_at = Some(SystemTime::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_result_builders() {
        let ok = ProbeResult::accessible(42, 200);
        assert_eq!(ok.status, ProbeStatus::Accessible);
        assert_eq!(ok.http_status, Some(200));
        assert!(ok.error.is_none());

        let not_found = ProbeResult::inaccessible_status(10, 404);
        assert_eq!(not_found.status, ProbeStatus::Inaccessible);
        assert_eq!(not_found.error.as_deref(), Some("HTTP 404"));

        let timed_out = ProbeResult::inaccessible(5000, "timeout".to_string());
        assert_eq!(timed_out.http_status, None);
        assert_eq!(timed_out.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_millis_roundtrip() {
        let now = SystemTime::now();
        let millis = ProbeResult::timestamp_to_millis(now);
        let back = ProbeResult::millis_to_timestamp(millis);
        let drift = now.duration_since(back).unwrap_or_default();
        assert!(drift < Duration::from_millis(1));
    }

    #[test]
    fn test_sweep_run_tally() {
        let mut run = SweepRun::begin(3);
        run.tally(&ProbeResult::accessible(1, 200));
        run.tally(&ProbeResult::inaccessible_status(1, 500));
        run.tally(&ProbeResult::inaccessible(1, "timeout".to_string()));
        run.finish(false);

        assert_eq!(run.completed, 3);
        assert_eq!(run.succeeded, 1);
        assert_eq!(run.failed, 2);
        assert!(run.finished_at.is_some());
        assert!(!run.cancelled);
    }
}
