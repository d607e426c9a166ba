/// End-to-end tests for the engine
///
/// These drive the real HTTP checker against local mock servers and verify:
/// - statistics after a number of ticks (healthy, mixed, unreachable)
/// - startup rejection of bad settings
/// - prompt, complete drain on cancellation
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{Engine, EngineError, EngineSettings, millis};
use crate::monitoring::{Checker, Measurement, MetricsStore, StatsSnapshot};

const TICK: Duration = Duration::from_millis(100);

fn settings(endpoints: Vec<String>) -> EngineSettings {
    EngineSettings {
        endpoints,
        check_interval: TICK,
        report_interval: TICK,
        timeout: Duration::from_secs(2),
        max_endpoints: 16,
    }
}

/// Poll the store until `endpoint` has at least `checks` checks
async fn wait_for_checks(store: &MetricsStore, endpoint: &str, checks: u64) -> StatsSnapshot {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let snapshot = store.snapshot(endpoint);
        if snapshot.total_checks >= checks {
            return snapshot;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {checks} checks on {endpoint}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Run the engine in the background, returning its handle and the store
fn spawn_engine(
    engine: Engine,
    cancel: &CancellationToken,
) -> (tokio::task::JoinHandle<()>, Arc<MetricsStore>) {
    let store = engine.store();
    let cancel = cancel.clone();
    let handle = tokio::spawn(async move { engine.run(&cancel).await });
    (handle, store)
}

async fn drain(handle: tokio::task::JoinHandle<()>, cancel: &CancellationToken) {
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("engine did not drain in time")
        .expect("engine task failed");
}

#[tokio::test]
async fn test_all_healthy_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(10)))
        .mount(&server)
        .await;
    let url = format!("{}/", server.uri());

    let cancel = CancellationToken::new();
    let engine = Engine::new(settings(vec![url.clone()])).unwrap();
    let (handle, store) = spawn_engine(engine, &cancel);

    wait_for_checks(&store, &url, 3).await;
    drain(handle, &cancel).await;

    let snapshot = store.snapshot(&url);
    assert!(snapshot.total_checks >= 3);
    assert_eq!(snapshot.successful_checks, snapshot.total_checks);
    assert_eq!(snapshot.responded_checks, snapshot.total_checks);

    let average = snapshot.average_response_time().unwrap();
    assert!(average >= Duration::from_millis(10), "average was {average:?}");
    assert!(average < Duration::from_secs(1), "average was {average:?}");
}

#[tokio::test]
async fn test_failing_then_recovering_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(2)
        .mount(&server)
        .await;
    let url = format!("{}/", server.uri());

    let cancel = CancellationToken::new();
    let engine = Engine::new(settings(vec![url.clone()])).unwrap();
    let (handle, store) = spawn_engine(engine, &cancel);

    wait_for_checks(&store, &url, 3).await;
    drain(handle, &cancel).await;

    let snapshot = store.snapshot(&url);
    assert!(snapshot.total_checks >= 3);
    // exactly the first two checks failed
    assert_eq!(snapshot.successful_checks, snapshot.total_checks - 2);
    // failed responses still contribute latency
    assert_eq!(snapshot.responded_checks, snapshot.total_checks);
    assert!(snapshot.average_response_time().is_some());
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let url = "http://127.0.0.1:1/".to_string();

    let cancel = CancellationToken::new();
    let engine = Engine::new(settings(vec![url.clone()])).unwrap();
    let (handle, store) = spawn_engine(engine, &cancel);

    wait_for_checks(&store, &url, 3).await;
    drain(handle, &cancel).await;

    let snapshot = store.snapshot(&url);
    assert!(snapshot.total_checks >= 3);
    assert_eq!(snapshot.successful_checks, 0);
    assert_eq!(snapshot.responded_checks, 0);
    assert_eq!(snapshot.total_response_time, Duration::ZERO);
    assert_eq!(snapshot.average_response_time(), None);
}

#[tokio::test]
async fn test_endpoints_are_checked_independently() {
    let healthy = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(204)).mount(&healthy).await;
    let healthy_url = format!("{}/", healthy.uri());
    let down_url = "http://127.0.0.1:1/".to_string();

    let cancel = CancellationToken::new();
    let engine = Engine::new(settings(vec![healthy_url.clone(), down_url.clone()])).unwrap();
    let (handle, store) = spawn_engine(engine, &cancel);

    wait_for_checks(&store, &healthy_url, 2).await;
    wait_for_checks(&store, &down_url, 2).await;
    drain(handle, &cancel).await;

    let up = store.snapshot(&healthy_url);
    assert_eq!(up.successful_checks, up.total_checks);

    let down = store.snapshot(&down_url);
    assert_eq!(down.successful_checks, 0);
}

#[test]
fn test_zero_endpoints_fail_fast() {
    let result = Engine::new(settings(vec![]));
    assert!(matches!(result, Err(EngineError::NoEndpoints)));
}

#[test]
fn test_too_many_endpoints_fail_fast() {
    let endpoints = (0..17).map(|i| format!("http://host-{i}.example/")).collect();
    let result = Engine::new(settings(endpoints));
    assert!(matches!(result, Err(EngineError::TooManyEndpoints { count: 17, max: 16 })));
}

#[test]
fn test_zero_durations_fail_fast() {
    let endpoints = vec!["http://example.com/".to_string()];

    let zero_interval =
        EngineSettings { check_interval: Duration::ZERO, ..settings(endpoints.clone()) };
    let result = Engine::new(zero_interval);
    assert!(matches!(result, Err(EngineError::ZeroDuration("check interval"))));

    let result = Engine::new(EngineSettings { timeout: Duration::ZERO, ..settings(endpoints) });
    assert!(matches!(result, Err(EngineError::ZeroDuration("timeout"))));
}

#[test]
fn test_interval_millis_saturate() {
    assert_eq!(millis(Duration::from_secs(30)), 30_000);
    assert_eq!(millis(Duration::MAX), u64::MAX);
}

#[tokio::test]
async fn test_immediate_cancellation_drains_without_checks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let endpoints = vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())];

    let engine = Engine::new(EngineSettings {
        check_interval: Duration::from_secs(60),
        report_interval: Duration::from_secs(60),
        ..settings(endpoints)
    })
    .unwrap();
    let store = engine.store();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let started = Instant::now();
    tokio::time::timeout(Duration::from_secs(2), engine.run(&cancel)).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));

    for (_, snapshot) in store.snapshots() {
        assert_eq!(snapshot.total_checks, 0);
    }
    assert_eq!(engine.report_final(), 0);
}

#[tokio::test]
async fn test_cancellation_aborts_in_flight_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;
    let url = format!("{}/", server.uri());

    let engine = Engine::new(EngineSettings {
        timeout: Duration::from_secs(60),
        ..settings(vec![url.clone()])
    })
    .unwrap();
    let cancel = CancellationToken::new();
    let (handle, store) = spawn_engine(engine, &cancel);

    // the first check is dispatched after one tick and then hangs
    while server.received_requests().await.unwrap_or_default().is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    drain(handle, &cancel).await;

    assert_eq!(store.snapshot(&url).total_checks, 0);
}

/// Panics on its first check
struct BrokenChecker;

#[async_trait::async_trait]
impl Checker for BrokenChecker {
    async fn check(&self, endpoint: &str, _cancel: &CancellationToken) -> Option<Measurement> {
        panic!("broken checker for {endpoint}");
    }
}

#[tokio::test]
async fn test_panicking_loop_drains_and_propagates() {
    let endpoints = vec!["http://a.example/".to_string(), "http://b.example/".to_string()];
    let engine = Engine::with_checker(settings(endpoints), Arc::new(BrokenChecker)).unwrap();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(async move { engine.run(&cancel).await });
    let joined = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap();

    assert!(joined.unwrap_err().is_panic());
}
