//! End-to-end adapter behaviour over an in-memory proxy.

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use webpro_connectors::{
    gmb, hubspot, linkedin, search_console, shopify, x, ConnectorRouter, PlatformAdapter,
    StubTransport,
};
use webpro_core::{AppConfig, DataSource, DateRange, Platform, RandomSource};

fn config(use_mock_data: bool) -> AppConfig {
    let mut config = AppConfig::default();
    config.use_mock_data = use_mock_data;
    config.mock.simulate_latency = false;
    config.api.timeout_ms = 1_000;
    config
}

fn router(use_mock_data: bool, stub: Arc<StubTransport>, seed: u64) -> ConnectorRouter {
    ConnectorRouter::from_config(
        &config(use_mock_data),
        stub,
        Arc::new(RandomSource::seeded(seed)),
    )
}

fn x_metrics_body() -> serde_json::Value {
    json!({"user": {"data": {"public_metrics": {
        "followers_count": 1200, "following_count": 80,
        "tweet_count": 640, "listed_count": 3
    }}}})
}

#[tokio::test]
async fn test_mock_mode_makes_no_transport_calls() {
    let stub = Arc::new(StubTransport::new().with_json("/x/metrics", x_metrics_body()));
    let router = router(true, stub.clone(), 1);

    for platform in Platform::ALL {
        let data = router.fetch(platform, "res-1", DateRange::Daily).await;
        assert_eq!(data.source, DataSource::Mock);
        assert!(!data.metrics.is_empty());
    }
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_live_success_is_marked_live() {
    let stub = Arc::new(StubTransport::new().with_json("/x/metrics", x_metrics_body()));
    let router = router(false, stub.clone(), 1);

    let data = router.fetch(Platform::X, "acct", DateRange::Weekly).await;
    assert_eq!(data.source, DataSource::Live);
    assert_eq!(data.metric("followers").unwrap().value, "1,200");
    assert_eq!(data.chart_data.as_ref().map(Vec::len), Some(7));

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "/x/metrics");
    assert_eq!(requests[0].1, vec![("dateRange".to_string(), "weekly".to_string())]);
}

#[tokio::test]
async fn test_http_error_falls_back_to_mock() {
    let stub = Arc::new(StubTransport::new().with_status("/linkedin/metrics", 502));
    let router = router(false, stub.clone(), 1);

    let data = router.fetch(Platform::LinkedIn, "org-9", DateRange::Daily).await;
    assert_eq!(data.id, "linkedin");
    assert_eq!(data.source, DataSource::Mock);
    assert_eq!(stub.call_count(), 1);
}

#[test]
fn test_fallback_is_counted_in_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let stub = Arc::new(StubTransport::new().with_status("/linkedin/metrics", 502));
                let router = router(false, stub, 1);
                let data = router.fetch(Platform::LinkedIn, "org-9", DateRange::Daily).await;
                assert_eq!(data.source, DataSource::Mock);
            });
    });

    let counters: HashMap<String, u64> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(key, _, _, value)| match value {
            DebugValue::Counter(n) => Some((key.key().name().to_string(), n)),
            _ => None,
        })
        .collect();
    assert_eq!(counters.get("connector.requests"), Some(&1));
    assert_eq!(counters.get("connector.fallbacks"), Some(&1));
}

#[tokio::test(start_paused = true)]
async fn test_mock_latency_is_simulated_per_platform() {
    let mut config = config(true);
    config.mock.simulate_latency = true;
    let stub = Arc::new(StubTransport::new());
    let router = ConnectorRouter::from_config(&config, stub.clone(), Arc::new(RandomSource::seeded(3)));

    let cases = [
        (Platform::Gmb, gmb::MOCK_LATENCY_MS),
        (Platform::SearchConsole, search_console::MOCK_LATENCY_MS),
        (Platform::LinkedIn, linkedin::MOCK_LATENCY_MS),
        (Platform::X, x::MOCK_LATENCY_MS),
        (Platform::Shopify, shopify::MOCK_LATENCY_MS),
        (Platform::HubSpot, hubspot::MOCK_LATENCY_MS),
    ];
    for (platform, latency_ms) in cases {
        let started = Instant::now();
        let data = router.fetch(platform, "res", DateRange::Daily).await;
        let elapsed = started.elapsed();
        assert_eq!(data.source, DataSource::Mock);
        assert!(elapsed >= Duration::from_millis(latency_ms), "{platform}: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(latency_ms + 50), "{platform}: {elapsed:?}");
    }
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_empty_payload_falls_back_to_mock() {
    let stub = Arc::new(
        StubTransport::new()
            .with_json("/google/search-console/metrics", json!({"rows": []}))
            .with_json("/shopify/metrics", json!({"metrics": {}})),
    );
    let router = router(false, stub, 1);

    let search = router.fetch(Platform::SearchConsole, "https://a.example/", DateRange::Monthly).await;
    assert_eq!(search.source, DataSource::Mock);
    let labels: Vec<&str> = search
        .chart_data
        .as_ref()
        .unwrap()
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(labels.first(), Some(&"1"));
    assert_eq!(labels.last(), Some(&"29"));

    let shop = router.fetch(Platform::Shopify, "store", DateRange::Daily).await;
    assert_eq!(shop.source, DataSource::Mock);
}

#[tokio::test(start_paused = true)]
async fn test_hung_proxy_times_out_into_mock() {
    let stub = Arc::new(StubTransport::new().with_hang("/hubspot/metrics"));
    let router = router(false, stub, 1);

    let started = Instant::now();
    let data = router.fetch(Platform::HubSpot, "portal", DateRange::Daily).await;
    assert_eq!(data.source, DataSource::Mock);
    assert!(started.elapsed() >= Duration::from_millis(1_000));
}

#[tokio::test(start_paused = true)]
async fn test_live_calls_are_paced_by_rate_limit() {
    let stub = Arc::new(StubTransport::new().with_json("/x/metrics", x_metrics_body()));
    let router = router(false, stub.clone(), 1);
    let adapter = router.adapter(Platform::X);

    let started = Instant::now();
    for _ in 0..10 {
        adapter.fetch_data("acct", DateRange::Daily).await;
    }
    assert!(started.elapsed() < Duration::from_millis(100));

    adapter.fetch_data("acct", DateRange::Daily).await;
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert_eq!(stub.call_count(), 11);
}

#[tokio::test]
async fn test_same_seed_produces_identical_mock_data() {
    let a = router(true, Arc::new(StubTransport::new()), 42);
    let b = router(true, Arc::new(StubTransport::new()), 42);

    let first = a.fetch(Platform::Gmb, "loc", DateRange::Weekly).await;
    let second = b.fetch(Platform::Gmb, "loc", DateRange::Weekly).await;
    assert_eq!(first, second);
    assert_eq!(first.chart_data.as_ref().map(Vec::len), Some(4));
}

#[tokio::test]
async fn test_oauth_url_passes_scope() {
    let stub = Arc::new(
        StubTransport::new()
            .with_json("/oauth/google/start", json!({"url": "https://accounts.example/auth"})),
    );
    let router = router(false, stub.clone(), 1);

    let url = router.adapter(Platform::Gmb).oauth_url().await.unwrap();
    assert_eq!(url, "https://accounts.example/auth");
    assert_eq!(
        stub.requests()[0].1,
        vec![("scope".to_string(), "gmb".to_string())]
    );
}

#[tokio::test]
async fn test_link_status_reflects_proxy_reachability() {
    let stub = Arc::new(StubTransport::new().with_json("/x/user", json!({"data": {"id": "7"}})));
    let router = router(false, stub, 1);

    let status = router.link_status().await;
    assert_eq!(status.get("x_ads"), Some(&true));
    assert_eq!(status.get("linkedin"), Some(&false));
}

#[tokio::test]
async fn test_commerce_link_checks_carry_resource_ids() {
    let stub = Arc::new(
        StubTransport::new()
            .with_json("/shopify/metrics", json!({"metrics": {"revenue": 10}}))
            .with_json("/hubspot/metrics", json!({"metrics": {"dealsCreated": 1}})),
    );
    let mut config = config(false);
    config.resources.shopify_store_id = Some("store-77".to_string());
    let router = ConnectorRouter::from_config(&config, stub.clone(), Arc::new(RandomSource::seeded(1)));

    assert!(router.adapter(Platform::Shopify).is_linked().await);
    assert!(!router.adapter(Platform::HubSpot).is_linked().await);

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "/shopify/metrics");
    assert_eq!(requests[0].1, vec![("storeId".to_string(), "store-77".to_string())]);
}
