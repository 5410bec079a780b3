//! Shared adapter contract.
//!
//! Every provider adapter implements `live_query` and `mock_query`; the
//! provided `fetch_data` wraps them in the common mock-mode / rate-limit /
//! fallback sequence so callers always receive a renderable `PlatformData`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, warn};
use webpro_core::config::ResourceConfig;
use webpro_core::{
    AppConfig, ChartPoint, DateRange, Platform, PlatformData, RandomSource, WebProError,
    WebProResult,
};

use crate::rate_limit::TokenBucket;
use crate::transport::{ProxyTransport, Query};

/// Dependencies shared by all adapters: transport, random source and the
/// mock/timeout policy taken from `AppConfig`.
#[derive(Clone)]
pub struct AdapterContext {
    transport: Arc<dyn ProxyTransport>,
    rng: Arc<RandomSource>,
    use_mock_data: bool,
    simulate_latency: bool,
    timeout: Duration,
    resources: ResourceConfig,
}

impl AdapterContext {
    pub fn new(
        config: &AppConfig,
        transport: Arc<dyn ProxyTransport>,
        rng: Arc<RandomSource>,
    ) -> Self {
        Self {
            transport,
            rng,
            use_mock_data: config.use_mock_data,
            simulate_latency: config.mock.simulate_latency,
            timeout: Duration::from_millis(config.api.timeout_ms),
            resources: config.resources.clone(),
        }
    }

    pub fn use_mock_data(&self) -> bool {
        self.use_mock_data
    }

    pub fn rng(&self) -> &RandomSource {
        &self.rng
    }

    /// Configured resource id (store, portal, ...) for `platform`.
    pub fn resource_for(&self, platform: Platform) -> Option<&str> {
        self.resources.resource_for(platform)
    }

    /// Proxy GET bounded by the configured timeout.
    pub async fn get(&self, path: &str, query: &Query<'_>) -> WebProResult<Value> {
        match tokio::time::timeout(self.timeout, self.transport.get_json(path, query)).await {
            Ok(result) => result,
            Err(_) => Err(WebProError::Timeout {
                path: path.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    /// Artificial delay keeping the mock path asynchronous like the live one.
    pub async fn simulate_latency(&self, millis: u64) {
        if self.simulate_latency {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    /// `floor(per_bucket * (low + r * width))` for every label.
    pub fn jittered_series(
        &self,
        labels: Vec<String>,
        per_bucket: f64,
        low: f64,
        width: f64,
    ) -> Vec<ChartPoint> {
        labels
            .into_iter()
            .map(|name| {
                let value = (per_bucket * self.rng.between(low, width)).floor().max(0.0);
                ChartPoint::new(name, value)
            })
            .collect()
    }
}

#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    fn context(&self) -> &AdapterContext;

    fn limiter(&self) -> &TokenBucket;

    /// Lightweight authenticated endpoint used by `is_linked`.
    fn link_check_path(&self) -> &'static str;

    /// Query sent with the link check. `None` means the check cannot be
    /// addressed yet and the platform reads as unlinked.
    fn link_check_query(&self) -> Option<Vec<(&'static str, String)>> {
        Some(Vec::new())
    }

    /// Optional `scope` passed to the OAuth start endpoint.
    fn oauth_scope(&self) -> Option<&'static str> {
        None
    }

    /// Fetch and transform live data. Empty results are errors.
    async fn live_query(&self, resource_id: &str, range: DateRange) -> WebProResult<PlatformData>;

    /// Generate and transform a synthetic payload.
    async fn mock_query(&self, resource_id: &str, range: DateRange) -> PlatformData;

    /// Metrics for `resource_id` over `range`. Never fails: any live-path
    /// error is logged and replaced by mock data.
    async fn fetch_data(&self, resource_id: &str, range: DateRange) -> PlatformData {
        let platform = self.platform().id();
        metrics::counter!("connector.requests", "platform" => platform).increment(1);

        if self.context().use_mock_data() {
            debug!(platform, resource_id, %range, "mock mode, skipping live fetch");
            return self.mock_query(resource_id, range).await;
        }

        self.limiter().consume().await;
        let started = Instant::now();
        match self.live_query(resource_id, range).await {
            Ok(data) => {
                metrics::histogram!("connector.live_latency_ms", "platform" => platform)
                    .record(started.elapsed().as_millis() as f64);
                data
            }
            Err(e) => {
                metrics::counter!("connector.fallbacks", "platform" => platform).increment(1);
                if e.is_recoverable() {
                    warn!(platform, resource_id, error = %e, "live fetch failed, serving mock data");
                } else {
                    error!(platform, resource_id, error = %e, "live fetch misconfigured, serving mock data");
                }
                self.mock_query(resource_id, range).await
            }
        }
    }

    /// Backend-issued authorization URL for linking this platform.
    async fn oauth_url(&self) -> WebProResult<String> {
        let path = format!("/oauth/{}/start", self.platform().oauth_provider());
        let query: Vec<(&str, String)> = self
            .oauth_scope()
            .map(|scope| vec![("scope", scope.to_string())])
            .unwrap_or_default();
        let body = self.context().get(&path, &query).await?;
        body.get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| WebProError::MalformedPayload(format!("{path}: missing url")))
    }

    /// Whether the platform is connected. Always `false` in mock mode.
    async fn is_linked(&self) -> bool {
        if self.context().use_mock_data() {
            return false;
        }
        let Some(query) = self.link_check_query() else {
            debug!(platform = self.platform().id(), "no resource configured for link check");
            return false;
        };
        match self.context().get(self.link_check_path(), &query).await {
            Ok(body) => !body.is_null(),
            Err(e) => {
                debug!(platform = self.platform().id(), error = %e, "link check failed");
                false
            }
        }
    }
}

// ─── Payload helpers ────────────────────────────────────────────────────────

/// Numeric field at a JSON pointer; numbers encoded as strings are accepted
/// and anything missing reads as zero.
pub(crate) fn number_at(value: &Value, pointer: &str) -> f64 {
    match value.pointer(pointer) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Array at a JSON pointer, or an empty slice.
pub(crate) fn array_at<'a>(value: &'a Value, pointer: &str) -> &'a [Value] {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Object at a JSON pointer; absent or non-object payloads are empty results.
pub(crate) fn require_object<'a>(
    value: &'a Value,
    pointer: &str,
    path: &str,
) -> WebProResult<&'a Value> {
    match value.pointer(pointer) {
        Some(obj @ Value::Object(map)) if !map.is_empty() => Ok(obj),
        Some(Value::Object(_)) | Some(Value::Null) | None => {
            Err(WebProError::EmptyResult(path.to_string()))
        }
        Some(other) => Err(WebProError::MalformedPayload(format!(
            "{path}: expected object at {pointer}, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_at_accepts_strings_and_defaults() {
        let v = json!({"a": {"b": 12, "c": "34", "d": "x"}});
        assert_eq!(number_at(&v, "/a/b"), 12.0);
        assert_eq!(number_at(&v, "/a/c"), 34.0);
        assert_eq!(number_at(&v, "/a/d"), 0.0);
        assert_eq!(number_at(&v, "/missing"), 0.0);
    }

    #[test]
    fn test_require_object() {
        let v = json!({"metrics": {"x": 1}, "empty": {}, "list": [1]});
        assert!(require_object(&v, "/metrics", "/p").is_ok());
        assert!(matches!(
            require_object(&v, "/empty", "/p"),
            Err(WebProError::EmptyResult(_))
        ));
        assert!(matches!(
            require_object(&v, "/nope", "/p"),
            Err(WebProError::EmptyResult(_))
        ));
        assert!(matches!(
            require_object(&v, "/list", "/p"),
            Err(WebProError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_array_at() {
        let v = json!({"rows": [1, 2], "scalar": 3});
        assert_eq!(array_at(&v, "/rows").len(), 2);
        assert!(array_at(&v, "/scalar").is_empty());
    }
}
