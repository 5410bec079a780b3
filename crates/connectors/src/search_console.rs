//! Google Search Console search-analytics adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use webpro_core::format::{format_percent, format_rounded};
use webpro_core::{
    ChartPoint, DataSource, DateRange, Metric, Platform, PlatformData, Trend, WebProError,
    WebProResult,
};

use crate::adapter::{array_at, number_at, AdapterContext, PlatformAdapter};
use crate::buckets::BucketScheme;
use crate::rate_limit::{RateLimitPolicy, TokenBucket};

/// Search Console enforces strict per-site QPS; bursts are allowed but the
/// steady refill is higher than the other Google adapters.
pub const RATE_LIMIT: RateLimitPolicy = RateLimitPolicy::new(20, 5.0);
pub const MOCK_LATENCY_MS: u64 = 200;
const SCHEME: BucketScheme = BucketScheme::OddDayNumbers;

const SITES_PATH: &str = "/google/search-console/sites";
const METRICS_PATH: &str = "/google/search-console/metrics";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConsoleSite {
    pub site_url: String,
    pub permission_level: Option<String>,
}

/// One search-analytics row. `keys` holds the grouping dimension (usually a
/// date) when the query was dimensioned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRow {
    pub keys: Vec<String>,
    pub clicks: f64,
    pub impressions: f64,
    pub ctr: f64,
    pub position: f64,
}

impl SearchRow {
    fn from_json(row: &Value) -> Self {
        Self {
            keys: array_at(row, "/keys")
                .iter()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect(),
            clicks: number_at(row, "/clicks"),
            impressions: number_at(row, "/impressions"),
            ctr: number_at(row, "/ctr"),
            position: number_at(row, "/position"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchTotals {
    pub clicks: f64,
    pub impressions: f64,
    /// Ratio, not percent.
    pub avg_ctr: f64,
    pub avg_position: f64,
}

impl SearchTotals {
    pub fn from_rows(rows: &[SearchRow]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let n = rows.len() as f64;
        Self {
            clicks: rows.iter().map(|r| r.clicks).sum(),
            impressions: rows.iter().map(|r| r.impressions).sum(),
            avg_ctr: rows.iter().map(|r| r.ctr).sum::<f64>() / n,
            avg_position: rows.iter().map(|r| r.position).sum::<f64>() / n,
        }
    }
}

pub struct SearchConsoleAdapter {
    ctx: AdapterContext,
    limiter: TokenBucket,
}

impl SearchConsoleAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            ctx,
            limiter: TokenBucket::new("search_console", RATE_LIMIT),
        }
    }

    /// Verified sites for the linked Google identity.
    pub async fn list_sites(&self) -> WebProResult<Vec<SearchConsoleSite>> {
        if self.ctx.use_mock_data() {
            return Ok(Vec::new());
        }
        let body = self.ctx.get(SITES_PATH, &[]).await?;
        Ok(array_at(&body, "/siteEntry")
            .iter()
            .filter_map(|s| {
                Some(SearchConsoleSite {
                    site_url: s.get("siteUrl")?.as_str()?.to_string(),
                    permission_level: s
                        .get("permissionLevel")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            })
            .collect())
    }

    fn generate_rows(&self, range: DateRange) -> Vec<SearchRow> {
        let m = range.multiplier() as f64;
        let rng = self.ctx.rng();
        let scaled = |base: f64| (base * m * rng.between(0.8, 0.4)).floor();
        vec![SearchRow {
            keys: Vec::new(),
            clicks: scaled(120.0),
            impressions: scaled(4500.0),
            ctr: rng.between(0.025, 0.01),
            position: rng.between(12.0, 4.0),
        }]
    }

    /// Chart from dimensioned rows, or clicks spread over the range buckets.
    fn chart(&self, rows: &[SearchRow], totals: &SearchTotals, range: DateRange) -> Vec<ChartPoint> {
        if rows.first().is_some_and(|r| !r.keys.is_empty()) {
            return rows
                .iter()
                .map(|r| {
                    ChartPoint::new(
                        r.keys.first().cloned().unwrap_or_default(),
                        r.clicks.floor().max(0.0),
                    )
                })
                .collect();
        }
        let points = SCHEME.bucket_count(range) as f64;
        self.ctx
            .jittered_series(SCHEME.labels(range), totals.clicks / points, 0.5, 1.0)
    }

    pub fn transform(totals: &SearchTotals, source: DataSource) -> PlatformData {
        let (changes, trend) = match source {
            DataSource::Live => (["+—", "+—", "+—", "+—"], Trend::Neutral),
            DataSource::Mock => (["+15%", "+8%", "+0.2%", "+1.2"], Trend::Up),
        };
        PlatformData::new(
            Platform::SearchConsole,
            vec![
                Metric::new("Total Clicks", format_rounded(totals.clicks), changes[0], trend)
                    .keyed("clicks"),
                Metric::new(
                    "Total Impressions",
                    format_rounded(totals.impressions),
                    changes[1],
                    trend,
                )
                .keyed("impressions"),
                Metric::new("Avg. CTR", format_percent(totals.avg_ctr * 100.0), changes[2], trend)
                    .keyed("ctr"),
                Metric::new(
                    "Avg. Position",
                    format!("{:.1}", totals.avg_position),
                    changes[3],
                    trend,
                )
                .keyed("position"),
            ],
            source,
        )
    }
}

#[async_trait]
impl PlatformAdapter for SearchConsoleAdapter {
    fn platform(&self) -> Platform {
        Platform::SearchConsole
    }

    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    fn limiter(&self) -> &TokenBucket {
        &self.limiter
    }

    fn link_check_path(&self) -> &'static str {
        SITES_PATH
    }

    fn oauth_scope(&self) -> Option<&'static str> {
        Some("searchconsole")
    }

    async fn live_query(&self, resource_id: &str, range: DateRange) -> WebProResult<PlatformData> {
        let query = [
            ("siteUrl", resource_id.to_string()),
            ("dateRange", range.to_string()),
        ];
        let body = self.ctx.get(METRICS_PATH, &query).await?;
        let rows: Vec<SearchRow> = array_at(&body, "/rows")
            .iter()
            .map(SearchRow::from_json)
            .collect();
        if rows.is_empty() {
            return Err(WebProError::EmptyResult(METRICS_PATH.to_string()));
        }
        let totals = SearchTotals::from_rows(&rows);
        let chart = self.chart(&rows, &totals, range);
        Ok(Self::transform(&totals, DataSource::Live).with_chart(chart))
    }

    async fn mock_query(&self, _resource_id: &str, range: DateRange) -> PlatformData {
        self.ctx.simulate_latency(MOCK_LATENCY_MS).await;
        let rows = self.generate_rows(range);
        let totals = SearchTotals::from_rows(&rows);
        let chart = self.chart(&rows, &totals, range);
        Self::transform(&totals, DataSource::Mock).with_chart(chart)
    }
}
