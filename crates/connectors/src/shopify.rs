//! Shopify store sales adapter.

use async_trait::async_trait;
use serde_json::Value;
use webpro_core::format::{format_currency, format_percent, format_rounded};
use webpro_core::{
    ChartPoint, DataSource, DateRange, Metric, Platform, PlatformData, Trend, WebProResult,
};

use crate::adapter::{array_at, number_at, require_object, AdapterContext, PlatformAdapter};
use crate::buckets::BucketScheme;
use crate::rate_limit::{RateLimitPolicy, TokenBucket};

/// Shopify's leaky bucket: 40 request burst, 2 per second leak.
pub const RATE_LIMIT: RateLimitPolicy = RateLimitPolicy::new(40, 2.0);
pub const MOCK_LATENCY_MS: u64 = 250;
const VARIANCE_SPREAD: f64 = 0.2;
const SCHEME: BucketScheme = BucketScheme::Standard;

const METRICS_PATH: &str = "/shopify/metrics";

const BASE_DAILY_REVENUE: f64 = 250_000.0;
const BASE_DAILY_ORDERS: f64 = 520.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SalesSummary {
    pub revenue: f64,
    pub orders: f64,
    /// Percent of returning customers.
    pub repeat_rate: f64,
}

impl SalesSummary {
    pub fn from_json(metrics: &Value) -> Self {
        Self {
            revenue: number_at(metrics, "/revenue"),
            orders: number_at(metrics, "/orders"),
            repeat_rate: number_at(metrics, "/repeatRate"),
        }
    }

    pub fn average_order_value(&self) -> f64 {
        self.revenue / self.orders.max(1.0)
    }
}

pub struct ShopifyAdapter {
    ctx: AdapterContext,
    limiter: TokenBucket,
}

impl ShopifyAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            ctx,
            limiter: TokenBucket::new("shopify", RATE_LIMIT),
        }
    }

    fn generate_summary(&self, range: DateRange) -> SalesSummary {
        let m = range.multiplier() as f64;
        let rng = self.ctx.rng();
        SalesSummary {
            revenue: (BASE_DAILY_REVENUE * m * rng.variance(VARIANCE_SPREAD)).floor(),
            orders: (BASE_DAILY_ORDERS * m * rng.variance(VARIANCE_SPREAD)).floor(),
            repeat_rate: (rng.between(18.0, 6.0) * 10.0).round() / 10.0,
        }
    }

    pub fn transform(summary: &SalesSummary, source: DataSource) -> PlatformData {
        let (changes, trend) = match source {
            DataSource::Live => (["+—"; 4], Trend::Neutral),
            DataSource::Mock => (["+8%", "+5%", "+2%", "+1%"], Trend::Up),
        };
        PlatformData::new(
            Platform::Shopify,
            vec![
                Metric::new("Revenue", format_currency(summary.revenue), changes[0], trend)
                    .keyed("revenue"),
                Metric::new("Orders", format_rounded(summary.orders), changes[1], trend)
                    .keyed("orders"),
                Metric::new(
                    "AOV",
                    format_currency(summary.average_order_value()),
                    changes[2],
                    trend,
                )
                .keyed("aov"),
                Metric::new("Repeat Rate", format_percent(summary.repeat_rate), changes[3], trend)
                    .keyed("repeat_rate"),
            ],
            source,
        )
    }

    fn revenue_chart(&self, summary: &SalesSummary, range: DateRange) -> Vec<ChartPoint> {
        let per_bucket = summary.revenue / SCHEME.bucket_count(range) as f64;
        self.ctx
            .jittered_series(SCHEME.labels(range), per_bucket, 0.8, 0.4)
    }
}

/// Provider-supplied revenue series, when the proxy returns one.
fn parse_series(body: &Value) -> Vec<ChartPoint> {
    array_at(body, "/series")
        .iter()
        .filter_map(|p| {
            let name = p.get("name")?.as_str()?.to_string();
            Some(ChartPoint::new(name, number_at(p, "/value").max(0.0)))
        })
        .collect()
}

#[async_trait]
impl PlatformAdapter for ShopifyAdapter {
    fn platform(&self) -> Platform {
        Platform::Shopify
    }

    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    fn limiter(&self) -> &TokenBucket {
        &self.limiter
    }

    fn link_check_path(&self) -> &'static str {
        METRICS_PATH
    }

    fn link_check_query(&self) -> Option<Vec<(&'static str, String)>> {
        self.ctx
            .resource_for(Platform::Shopify)
            .map(|id| vec![("storeId", id.to_string())])
    }

    async fn live_query(&self, resource_id: &str, range: DateRange) -> WebProResult<PlatformData> {
        let query = [
            ("storeId", resource_id.to_string()),
            ("dateRange", range.to_string()),
        ];
        let body = self.ctx.get(METRICS_PATH, &query).await?;
        let summary = SalesSummary::from_json(require_object(&body, "/metrics", METRICS_PATH)?);
        let series = parse_series(&body);
        let chart = if series.is_empty() {
            self.revenue_chart(&summary, range)
        } else {
            series
        };
        Ok(Self::transform(&summary, DataSource::Live).with_chart(chart))
    }

    async fn mock_query(&self, _resource_id: &str, range: DateRange) -> PlatformData {
        self.ctx.simulate_latency(MOCK_LATENCY_MS).await;
        let summary = self.generate_summary(range);
        let chart = self.revenue_chart(&summary, range);
        Self::transform(&summary, DataSource::Mock).with_chart(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transform_formats_currency_and_rate() {
        let summary = SalesSummary {
            revenue: 250_000.0,
            orders: 500.0,
            repeat_rate: 21.34,
        };
        let data = ShopifyAdapter::transform(&summary, DataSource::Mock);
        assert_eq!(data.metric("revenue").unwrap().value, "KES 250,000");
        assert_eq!(data.metric("orders").unwrap().value, "500");
        assert_eq!(data.metric("aov").unwrap().value, "KES 500");
        assert_eq!(data.metric("repeat_rate").unwrap().value, "21.3%");
        assert_eq!(data.metrics[0].change, "+8%");
    }

    #[test]
    fn test_zero_orders_do_not_divide_by_zero() {
        let summary = SalesSummary {
            revenue: 900.0,
            ..SalesSummary::default()
        };
        assert_eq!(summary.average_order_value(), 900.0);
    }

    #[test]
    fn test_series_parsing_skips_unnamed_points() {
        let body = json!({"series": [{"name": "Mon", "value": 12}, {"value": 3}]});
        let series = parse_series(&body);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value, 12.0);
    }
}
