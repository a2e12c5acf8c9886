use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use upcheck::{MemoryStore, Prober, ProberConfig, ResultStore, SweepConfig, SweepController};

/// Shared state behind every route: one prober, one store, one sweep
/// controller.
pub struct AppState {
    pub prober: Arc<Prober>,
    pub store: Arc<dyn ResultStore>,
    pub sweeps: Arc<SweepController>,
}

impl AppState {
    /// Build the server's state from compile-time environment overrides
    pub fn from_env() -> Result<Self> {
        let prober = Arc::new(Prober::new(ProberConfig::default())?);
        let store: Arc<dyn ResultStore> = Arc::new(MemoryStore::new());

        let sweep_config = SweepConfig {
            auto_start: option_env!("UPCHECK_SWEEP_AUTOSTART")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            interval: Duration::from_millis(parse_env(
                option_env!("UPCHECK_SWEEP_INTERVAL_MS"),
                60_000,
            )),
            concurrency: parse_env(
                option_env!("UPCHECK_SWEEP_CONCURRENCY"),
                upcheck::DEFAULT_CONCURRENCY as u64,
            ) as usize,
            stale_threshold: Duration::from_millis(parse_env(
                option_env!("UPCHECK_SWEEP_STALE_THRESHOLD_MS"),
                300_000,
            )),
            ..SweepConfig::default()
        };

        let sweeps = SweepController::new(prober.clone(), store.clone(), sweep_config);
        Ok(Self { prober, store, sweeps })
    }
}

fn parse_env(value: Option<&str>, default: u64) -> u64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
