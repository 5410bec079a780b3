//! Transport to the backend proxy that fronts every provider API.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use webpro_core::config::ApiConfig;
use webpro_core::{WebProError, WebProResult};

/// Query parameters for a proxy call.
pub type Query<'a> = [(&'a str, String)];

/// A JSON GET against the backend proxy.
#[async_trait]
pub trait ProxyTransport: Send + Sync {
    async fn get_json(&self, path: &str, query: &Query<'_>) -> WebProResult<Value>;
}

// ─── HTTP ───────────────────────────────────────────────────────────────────

/// reqwest-backed transport. Connection-level failures against the primary
/// base URL are retried once against the fallback URL when one is set.
pub struct HttpProxyTransport {
    client: Client,
    base_url: Url,
    fallback_url: Option<Url>,
    bearer_token: Option<String>,
}

impl HttpProxyTransport {
    pub fn new(config: &ApiConfig) -> WebProResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| WebProError::Config(format!("failed to build HTTP client: {e}")))?;

        let fallback_url = config
            .fallback_url
            .as_deref()
            .map(parse_base_url)
            .transpose()?;

        Ok(Self {
            client,
            base_url: parse_base_url(&config.base_url)?,
            fallback_url,
            bearer_token: config.bearer_token.clone(),
        })
    }

    fn endpoint(base: &Url, path: &str, query: &Query<'_>) -> WebProResult<Url> {
        let mut url = base
            .join(path.trim_start_matches('/'))
            .map_err(|e| WebProError::Config(format!("invalid endpoint {path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn send(&self, base: &Url, path: &str, query: &Query<'_>) -> WebProResult<Value> {
        let url = Self::endpoint(base, path, query)?;
        debug!(url = %url, "proxy GET");

        let mut request = self.client.get(url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WebProError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebProError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| WebProError::MalformedPayload(e.to_string()))
    }
}

#[async_trait]
impl ProxyTransport for HttpProxyTransport {
    async fn get_json(&self, path: &str, query: &Query<'_>) -> WebProResult<Value> {
        match self.send(&self.base_url, path, query).await {
            Err(WebProError::Transport(reason)) => match &self.fallback_url {
                Some(fallback) => {
                    warn!(path, error = %reason, "primary proxy unreachable, trying fallback");
                    self.send(fallback, path, query).await
                }
                None => Err(WebProError::Transport(reason)),
            },
            other => other,
        }
    }
}

/// Base URLs are joined with relative paths, so they need a trailing slash.
fn parse_base_url(raw: &str) -> WebProResult<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|e| WebProError::Config(format!("invalid base url {raw}: {e}")))
}

// ─── In-memory ──────────────────────────────────────────────────────────────

/// Canned responses keyed by path. Paths without a response fail with a
/// transport error. Every call is counted.
#[derive(Default)]
pub struct StubTransport {
    responses: Mutex<HashMap<String, StubResponse>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

#[derive(Debug, Clone)]
pub enum StubResponse {
    Json(Value),
    Status(u16),
    /// Never resolves; used to exercise timeouts.
    Hang,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, path: &str, body: Value) -> Self {
        self.respond(path, StubResponse::Json(body));
        self
    }

    pub fn with_status(self, path: &str, status: u16) -> Self {
        self.respond(path, StubResponse::Status(status));
        self
    }

    pub fn with_hang(self, path: &str) -> Self {
        self.respond(path, StubResponse::Hang);
        self
    }

    pub fn respond(&self, path: &str, response: StubResponse) {
        self.responses.lock().insert(path.to_string(), response);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Recorded `(path, query)` pairs in call order.
    pub fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ProxyTransport for StubTransport {
    async fn get_json(&self, path: &str, query: &Query<'_>) -> WebProResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((
            path.to_string(),
            query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        ));

        let response = self.responses.lock().get(path).cloned();
        match response {
            Some(StubResponse::Json(body)) => Ok(body),
            Some(StubResponse::Status(status)) => Err(WebProError::Status {
                status,
                path: path.to_string(),
            }),
            Some(StubResponse::Hang) => std::future::pending().await,
            None => Err(WebProError::Transport(format!("no route for {path}"))),
        }
    }
}
