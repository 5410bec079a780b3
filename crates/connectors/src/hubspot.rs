//! HubSpot CRM deal pipeline adapter.

use async_trait::async_trait;
use serde_json::Value;
use webpro_core::format::{format_currency, format_percent, format_rounded};
use webpro_core::{
    ChartPoint, DataSource, DateRange, Metric, Platform, PlatformData, Trend, WebProResult,
};

use crate::adapter::{number_at, require_object, AdapterContext, PlatformAdapter};
use crate::buckets::BucketScheme;
use crate::rate_limit::{RateLimitPolicy, TokenBucket};

/// HubSpot private apps allow 100 requests per 10 s; bursts are kept small.
pub const RATE_LIMIT: RateLimitPolicy = RateLimitPolicy::new(10, 10.0);
pub const MOCK_LATENCY_MS: u64 = 250;
const VARIANCE_SPREAD: f64 = 0.2;
const SCHEME: BucketScheme = BucketScheme::Standard;

const METRICS_PATH: &str = "/hubspot/metrics";

const PIPELINE_VALUE_PER_DEAL: f64 = 15_000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DealSummary {
    pub deals_created: f64,
    pub deals_won: f64,
    pub pipeline_value: f64,
    /// Average days from creation to close.
    pub avg_cycle_days: f64,
}

impl DealSummary {
    pub fn from_json(metrics: &Value) -> Self {
        Self {
            deals_created: number_at(metrics, "/dealsCreated"),
            deals_won: number_at(metrics, "/dealsWon"),
            pipeline_value: number_at(metrics, "/pipelineValue"),
            avg_cycle_days: number_at(metrics, "/avgCycleDays"),
        }
    }

    /// Won over created, in percent. Zero when nothing was created.
    pub fn win_rate(&self) -> f64 {
        if self.deals_created <= 0.0 {
            0.0
        } else {
            self.deals_won / self.deals_created * 100.0
        }
    }
}

fn base_deals(range: DateRange) -> f64 {
    match range {
        DateRange::Daily => 12.0,
        DateRange::Weekly => 75.0,
        DateRange::Monthly => 320.0,
    }
}

fn typical_cycle_days(range: DateRange) -> f64 {
    match range {
        DateRange::Daily => 14.0,
        DateRange::Weekly => 17.0,
        DateRange::Monthly => 21.0,
    }
}

pub struct HubSpotAdapter {
    ctx: AdapterContext,
    limiter: TokenBucket,
}

impl HubSpotAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            ctx,
            limiter: TokenBucket::new("hubspot", RATE_LIMIT),
        }
    }

    fn generate_summary(&self, range: DateRange) -> DealSummary {
        let rng = self.ctx.rng();
        let created = (base_deals(range) * rng.variance(VARIANCE_SPREAD)).floor();
        DealSummary {
            deals_created: created,
            deals_won: (created * rng.between(0.32, 0.08)).floor(),
            pipeline_value: (created * PIPELINE_VALUE_PER_DEAL * rng.variance(VARIANCE_SPREAD))
                .floor(),
            avg_cycle_days: typical_cycle_days(range),
        }
    }

    pub fn transform(summary: &DealSummary, source: DataSource) -> PlatformData {
        let changes: [(&str, Trend); 5] = match source {
            DataSource::Live => [("+—", Trend::Neutral); 5],
            DataSource::Mock => [
                ("+6%", Trend::Up),
                ("+4%", Trend::Up),
                ("+7%", Trend::Up),
                ("+1%", Trend::Up),
                ("-1", Trend::Down),
            ],
        };
        let values = [
            ("Deals Created", "deals_created", format_rounded(summary.deals_created)),
            ("Deals Won", "deals_won", format_rounded(summary.deals_won)),
            ("Pipeline Value", "pipeline_value", format_currency(summary.pipeline_value)),
            ("Win Rate", "win_rate", format_percent(summary.win_rate())),
            ("Avg Cycle (days)", "avg_cycle", format_rounded(summary.avg_cycle_days)),
        ];
        let metrics = values
            .into_iter()
            .zip(changes)
            .map(|((label, key, value), (change, trend))| {
                Metric::new(label, value, change, trend).keyed(key)
            })
            .collect();
        PlatformData::new(Platform::HubSpot, metrics, source)
    }

    fn deals_chart(&self, summary: &DealSummary, range: DateRange) -> Vec<ChartPoint> {
        let per_bucket = summary.deals_created / SCHEME.bucket_count(range) as f64;
        self.ctx
            .jittered_series(SCHEME.labels(range), per_bucket, 0.8, 0.4)
    }
}

#[async_trait]
impl PlatformAdapter for HubSpotAdapter {
    fn platform(&self) -> Platform {
        Platform::HubSpot
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
            .resource_for(Platform::HubSpot)
            .map(|id| vec![("portalId", id.to_string())])
    }

    async fn live_query(&self, resource_id: &str, range: DateRange) -> WebProResult<PlatformData> {
        let query = [
            ("portalId", resource_id.to_string()),
            ("dateRange", range.to_string()),
        ];
        let body = self.ctx.get(METRICS_PATH, &query).await?;
        let summary = DealSummary::from_json(require_object(&body, "/metrics", METRICS_PATH)?);
        let chart = self.deals_chart(&summary, range);
        Ok(Self::transform(&summary, DataSource::Live).with_chart(chart))
    }

    async fn mock_query(&self, _resource_id: &str, range: DateRange) -> PlatformData {
        self.ctx.simulate_latency(MOCK_LATENCY_MS).await;
        let summary = self.generate_summary(range);
        let chart = self.deals_chart(&summary, range);
        Self::transform(&summary, DataSource::Mock).with_chart(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_win_rate_handles_zero_created() {
        assert_eq!(DealSummary::default().win_rate(), 0.0);
        let data = HubSpotAdapter::transform(&DealSummary::default(), DataSource::Live);
        assert_eq!(data.metric("win_rate").unwrap().value, "0.0%");
    }

    #[test]
    fn test_live_payload_transform() {
        let metrics = json!({"dealsCreated": 80, "dealsWon": 30,
                             "pipelineValue": 1200000, "avgCycleDays": 17});
        let data = HubSpotAdapter::transform(&DealSummary::from_json(&metrics), DataSource::Live);
        assert_eq!(data.id, "hubspot");
        assert_eq!(data.metric("win_rate").unwrap().value, "37.5%");
        assert_eq!(data.metric("pipeline_value").unwrap().value, "KES 1,200,000");
        assert_eq!(data.metric("avg_cycle").unwrap().value, "17");
    }

    #[test]
    fn test_mock_cycle_trends_down() {
        let data = HubSpotAdapter::transform(&DealSummary::default(), DataSource::Mock);
        let cycle = data.metric("avg_cycle").unwrap();
        assert_eq!(cycle.change, "-1");
        assert_eq!(cycle.trend, Trend::Down);
    }
}
