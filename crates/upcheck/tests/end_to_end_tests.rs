//! End-to-end tests wiring the prober, batch scheduler, store, and sweep
//! controller together against local servers.

mod support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use upcheck::{
    run_batch, CancelFlag, MemoryStore, ProbeStatus, Prober, ProberConfig, ResultStore,
    SweepConfig, SweepController, TrackedUrl,
};

use support::{spawn_server, Behavior};

fn tracked(addr: std::net::SocketAddr, timeout_ms: u64) -> TrackedUrl {
    let mut url = TrackedUrl::new(format!("http://{addr}/"));
    url.timeout_ms = Some(timeout_ms);
    url
}

#[tokio::test]
async fn test_mixed_batch_is_bounded_by_per_probe_timeouts() {
    let _ = tracing_subscriber::fmt::try_init();

    let ok = spawn_server(Behavior::Status(200)).await;
    let broken = spawn_server(Behavior::Status(500)).await;
    let hanging = spawn_server(Behavior::Hang).await;

    let prober = Arc::new(Prober::new(ProberConfig::default()).unwrap());
    let targets = vec![tracked(ok, 100), tracked(broken, 100), tracked(hanging, 100)];

    let start = Instant::now();
    let (mut rx, driver) = run_batch(prober, targets, 2, CancelFlag::new());

    let mut results = Vec::new();
    while let Some((_url, result)) = rx.recv().await {
        results.push(result);
    }
    let summary = driver.await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(results.len(), 3, "every URL yields exactly one result");
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 2);

    let errors: Vec<&str> =
        results.iter().filter_map(|r| r.error.as_deref()).collect();
    assert!(errors.contains(&"HTTP 500"));
    assert!(errors.contains(&"timeout"));

    // Worst case is ceil(3/2) * 100ms of probing; leave generous headroom
    // for scheduling noise.
    assert!(
        elapsed < Duration::from_secs(1),
        "batch took {elapsed:?}, the hanging URL must only cost its own timeout"
    );
}

#[tokio::test]
async fn test_sweep_over_live_servers_updates_store() {
    let ok = spawn_server(Behavior::Status(200)).await;
    let missing = spawn_server(Behavior::Status(404)).await;

    let store = Arc::new(MemoryStore::new());
    let ok_url = tracked(ok, 1_000);
    let missing_url = tracked(missing, 1_000);
    let (ok_id, missing_id) = (ok_url.id, missing_url.id);

    store.register(ok_url).await.unwrap();
    store.register(missing_url).await.unwrap();

    let prober = Arc::new(Prober::new(ProberConfig::default()).unwrap());
    let controller = SweepController::new(
        prober,
        store.clone(),
        SweepConfig { check_all: true, concurrency: 2, ..SweepConfig::default() },
    );

    let run = controller.run_once().await.expect("sweep should run");

    assert_eq!(run.total, 2);
    assert_eq!(run.succeeded, 1);
    assert_eq!(run.failed, 1);

    let ok_record = store.get_status(ok_id).await.unwrap().expect("record for ok URL");
    assert_eq!(ok_record.result.status, ProbeStatus::Accessible);

    let missing_record =
        store.get_status(missing_id).await.unwrap().expect("record for 404 URL");
    assert_eq!(missing_record.result.status, ProbeStatus::Inaccessible);
    assert_eq!(missing_record.result.error.as_deref(), Some("HTTP 404"));
}
