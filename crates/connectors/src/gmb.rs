//! Google Business Profile (GMB) insights adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use webpro_core::format::{format_change, format_rounded};
use webpro_core::{
    DataSource, DateRange, Metric, Platform, PlatformData, Trend, WebProError, WebProResult,
};

use crate::adapter::{array_at, AdapterContext, PlatformAdapter};
use crate::buckets::BucketScheme;
use crate::rate_limit::{RateLimitPolicy, TokenBucket};

pub const RATE_LIMIT: RateLimitPolicy = RateLimitPolicy::new(10, 2.0);
pub const MOCK_LATENCY_MS: u64 = 300;
const VARIANCE_SPREAD: f64 = 0.15;

const ACCOUNTS_PATH: &str = "/google/gmb/accounts";
const LOCATIONS_PATH: &str = "/google/gmb/locations";
const INSIGHTS_PATH: &str = "/google/gmb/insights";

/// Per-day base magnitudes used by the mock generator.
const BASE_PROFILE_VIEWS: f64 = 2400.0;
const BASE_SEARCH_QUERIES: f64 = 1200.0;
const BASE_DIRECTIONS: f64 = 450.0;
const BASE_WEBSITE_CLICKS: f64 = 180.0;
const BASE_PHONE_CALLS: f64 = 90.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GmbAccount {
    pub name: String,
    pub account_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GmbLocation {
    pub name: String,
    pub id: String,
    pub address: Option<String>,
}

/// Insight totals in provider units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GmbInsights {
    pub profile_views: f64,
    pub search_queries: f64,
    pub direction_requests: f64,
    pub website_clicks: f64,
    pub phone_calls: f64,
}

impl GmbInsights {
    fn is_empty(&self) -> bool {
        self.profile_views == 0.0
            && self.search_queries == 0.0
            && self.direction_requests == 0.0
            && self.website_clicks == 0.0
            && self.phone_calls == 0.0
    }
}

pub struct GmbAdapter {
    ctx: AdapterContext,
    limiter: TokenBucket,
}

impl GmbAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            ctx,
            limiter: TokenBucket::new("gmb", RATE_LIMIT),
        }
    }

    /// Accounts visible to the linked Google identity. Empty on failure.
    pub async fn list_accounts(&self) -> Vec<GmbAccount> {
        if self.ctx.use_mock_data() {
            return Vec::new();
        }
        match self.ctx.get(ACCOUNTS_PATH, &[]).await {
            Ok(body) => array_at(&body, "/accounts")
                .iter()
                .filter_map(|a| {
                    Some(GmbAccount {
                        name: a.get("name")?.as_str()?.to_string(),
                        account_number: a
                            .get("accountNumber")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    })
                })
                .collect(),
            Err(e) => {
                debug!(error = %e, "listing GMB accounts failed");
                Vec::new()
            }
        }
    }

    /// Locations for an account; sample locations when unavailable.
    pub async fn list_locations(&self, account_id: &str) -> Vec<GmbLocation> {
        if self.ctx.use_mock_data() {
            return sample_locations();
        }
        let query = [("accountId", account_id.to_string())];
        match self.ctx.get(LOCATIONS_PATH, &query).await {
            Ok(body) => array_at(&body, "/locations")
                .iter()
                .filter_map(|loc| {
                    let id = loc.get("name")?.as_str()?.to_string();
                    let name = loc
                        .get("displayName")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| id.clone());
                    Some(GmbLocation {
                        name,
                        id,
                        address: loc
                            .pointer("/address/formattedAddress")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    })
                })
                .collect(),
            Err(e) => {
                debug!(account_id, error = %e, "listing GMB locations failed");
                sample_locations()
            }
        }
    }

    pub fn parse_insights(body: &Value) -> GmbInsights {
        let lookup = |metric: &str| -> f64 {
            array_at(body, "/metrics/reports")
                .iter()
                .flat_map(|report| array_at(report, "/metricValues"))
                .find(|mv| mv.get("metric").and_then(Value::as_str) == Some(metric))
                .map(|mv| match mv.get("value") {
                    Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
                    Some(Value::String(s)) => s.parse().unwrap_or(0.0),
                    _ => 0.0,
                })
                .unwrap_or(0.0)
        };
        GmbInsights {
            profile_views: lookup("VIEWS_MAPS"),
            search_queries: lookup("QUERIES_INDIRECT"),
            direction_requests: lookup("ACTIONS_DIRECTIONS"),
            website_clicks: lookup("ACTIONS_WEBSITE"),
            phone_calls: lookup("ACTIONS_PHONE"),
        }
    }

    fn generate_insights(&self, range: DateRange) -> (GmbInsights, f64) {
        let m = range.multiplier() as f64;
        let variance = self.ctx.rng().variance(VARIANCE_SPREAD);
        let scaled = |base: f64| (base * m * variance).floor();
        let insights = GmbInsights {
            profile_views: scaled(BASE_PROFILE_VIEWS),
            search_queries: scaled(BASE_SEARCH_QUERIES),
            direction_requests: scaled(BASE_DIRECTIONS),
            website_clicks: scaled(BASE_WEBSITE_CLICKS),
            phone_calls: scaled(BASE_PHONE_CALLS),
        };
        (insights, variance)
    }

    pub fn transform(insights: &GmbInsights, range: DateRange, source: DataSource) -> PlatformData {
        // Live totals carry no history, so growth is the steady-state figure.
        let changes: [String; 5] = match source {
            DataSource::Live => ["+8%", "+5%", "+3%", "+2%", "+1%"].map(String::from),
            DataSource::Mock => {
                let m = range.multiplier() as i64;
                [
                    format_change(8 * m),
                    format_change(5 * m),
                    format_change(3 * m),
                    format_change(2 * m),
                    format_change(2),
                ]
            }
        };
        let [views, queries, directions, website, phone] = changes;

        PlatformData::new(
            Platform::Gmb,
            vec![
                Metric::new("Profile Views", format_rounded(insights.profile_views), views, Trend::Up)
                    .keyed("profile_views"),
                Metric::new("Search Queries", format_rounded(insights.search_queries), queries, Trend::Up)
                    .keyed("search_queries"),
                Metric::new(
                    "Direction Requests",
                    format_rounded(insights.direction_requests),
                    directions,
                    Trend::Up,
                )
                .keyed("direction_requests"),
                Metric::new("Website Clicks", format_rounded(insights.website_clicks), website, Trend::Up)
                    .keyed("website_clicks"),
                Metric::new("Phone Calls", format_rounded(insights.phone_calls), phone, Trend::Up)
                    .keyed("phone_calls"),
            ],
            source,
        )
    }
}

fn insights_range(range: DateRange) -> &'static str {
    match range {
        DateRange::Daily => "LAST_7_DAYS",
        DateRange::Weekly => "LAST_30_DAYS",
        DateRange::Monthly => "LAST_90_DAYS",
    }
}

fn sample_locations() -> Vec<GmbLocation> {
    vec![
        GmbLocation {
            name: "Main Office".into(),
            id: "loc_1".into(),
            address: Some("123 Business St, City, State".into()),
        },
        GmbLocation {
            name: "Downtown Branch".into(),
            id: "loc_2".into(),
            address: Some("456 Main Ave, City, State".into()),
        },
    ]
}

#[async_trait]
impl PlatformAdapter for GmbAdapter {
    fn platform(&self) -> Platform {
        Platform::Gmb
    }

    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    fn limiter(&self) -> &TokenBucket {
        &self.limiter
    }

    fn link_check_path(&self) -> &'static str {
        ACCOUNTS_PATH
    }

    fn oauth_scope(&self) -> Option<&'static str> {
        Some("gmb")
    }

    async fn live_query(&self, resource_id: &str, range: DateRange) -> WebProResult<PlatformData> {
        let query = [
            ("locationId", resource_id.to_string()),
            ("dateRange", insights_range(range).to_string()),
        ];
        let body = self.ctx.get(INSIGHTS_PATH, &query).await?;
        let insights = Self::parse_insights(&body);
        if insights.is_empty() {
            return Err(WebProError::EmptyResult(INSIGHTS_PATH.to_string()));
        }
        Ok(Self::transform(&insights, range, DataSource::Live))
    }

    async fn mock_query(&self, _resource_id: &str, range: DateRange) -> PlatformData {
        self.ctx.simulate_latency(MOCK_LATENCY_MS).await;
        let (insights, variance) = self.generate_insights(range);
        let m = range.multiplier() as f64;
        let labels = BucketScheme::BusinessProfile.labels(range);
        let chart = self
            .ctx
            .jittered_series(labels, BASE_PROFILE_VIEWS * m * variance, 0.8, 0.4);
        Self::transform(&insights, range, DataSource::Mock).with_chart(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use webpro_core::format::extract_number;

    #[test]
    fn test_parse_insights_by_metric_name() {
        let body = json!({
            "metrics": {"reports": [
                {"metricValues": [{"metric": "VIEWS_MAPS", "value": 1500}]},
                {"metricValues": [
                    {"metric": "ACTIONS_WEBSITE", "value": "42"},
                    {"metric": "ACTIONS_PHONE", "value": 7}
                ]}
            ]}
        });
        let insights = GmbAdapter::parse_insights(&body);
        assert_eq!(insights.profile_views, 1500.0);
        assert_eq!(insights.website_clicks, 42.0);
        assert_eq!(insights.phone_calls, 7.0);
        assert_eq!(insights.search_queries, 0.0);
    }

    #[test]
    fn test_transform_live_formats_values() {
        let insights = GmbInsights {
            profile_views: 12_345.0,
            ..GmbInsights::default()
        };
        let data = GmbAdapter::transform(&insights, DateRange::Weekly, DataSource::Live);
        assert_eq!(data.id, "gmb");
        assert_eq!(data.metrics.len(), 5);
        assert_eq!(data.metrics[0].value, "12,345");
        assert_eq!(data.metrics[1].value, "0");
        assert_eq!(data.metrics[4].change, "+1%");
        assert!(data.chart_data.is_none());
    }

    #[test]
    fn test_transform_mock_scales_growth() {
        let data = GmbAdapter::transform(&GmbInsights::default(), DateRange::Weekly, DataSource::Mock);
        assert_eq!(data.metrics[0].change, "+56%");
        assert_eq!(data.metrics[4].change, "+2%");
        assert_eq!(extract_number(&data.metrics[0].value), 0.0);
    }

    #[test]
    fn test_insights_range_mapping() {
        assert_eq!(insights_range(DateRange::Daily), "LAST_7_DAYS");
        assert_eq!(insights_range(DateRange::Monthly), "LAST_90_DAYS");
    }
}
