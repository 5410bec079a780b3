//! LinkedIn organization page adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use webpro_core::format::{format_change, format_percent, format_rounded};
use webpro_core::{DataSource, DateRange, Metric, Platform, PlatformData, Trend, WebProResult};

use crate::adapter::{array_at, number_at, require_object, AdapterContext, PlatformAdapter};
use crate::buckets::BucketScheme;
use crate::rate_limit::{RateLimitPolicy, TokenBucket};

pub const RATE_LIMIT: RateLimitPolicy = RateLimitPolicy::new(10, 2.0);
pub const MOCK_LATENCY_MS: u64 = 400;
const VARIANCE_SPREAD: f64 = 0.2;

const ORGANIZATIONS_PATH: &str = "/linkedin/organizations";
const METRICS_PATH: &str = "/linkedin/metrics";

const BASE_FOLLOWERS: f64 = 5230.0;
const FOLLOWER_GROWTH_PER_DAY: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedInOrganization {
    pub id: String,
    pub name: String,
}

/// Synthetic page analytics served when the live path is unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PageActivity {
    followers: f64,
    follower_gain: f64,
    page_views: f64,
    unique_visitors: f64,
    button_clicks: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageStatistics {
    pub followers: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    /// Percent.
    pub engagement_rate: f64,
}

impl PageStatistics {
    pub fn from_json(metrics: &Value) -> Self {
        Self {
            followers: number_at(metrics, "/followers/total"),
            impressions: number_at(metrics, "/engagement/impressions"),
            clicks: number_at(metrics, "/engagement/clicks"),
            likes: number_at(metrics, "/engagement/likes"),
            comments: number_at(metrics, "/engagement/comments"),
            shares: number_at(metrics, "/engagement/shares"),
            engagement_rate: number_at(metrics, "/engagement/engagement_rate"),
        }
    }

    pub fn interactions(&self) -> f64 {
        self.likes + self.comments + self.shares
    }

    fn total_engagement(&self) -> f64 {
        self.impressions + self.clicks + self.likes
    }
}

pub struct LinkedInAdapter {
    ctx: AdapterContext,
    limiter: TokenBucket,
}

impl LinkedInAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            ctx,
            limiter: TokenBucket::new("linkedin", RATE_LIMIT),
        }
    }

    /// Organizations the linked member administers.
    pub async fn list_organizations(&self) -> WebProResult<Vec<LinkedInOrganization>> {
        if self.ctx.use_mock_data() {
            return Ok(Vec::new());
        }
        let body = self.ctx.get(ORGANIZATIONS_PATH, &[]).await?;
        Ok(array_at(&body, "/elements")
            .iter()
            .filter_map(|el| {
                let id = el.get("organization")?.as_str()?.to_string();
                let name = el
                    .pointer("/organization~/localizedName")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| id.clone());
                Some(LinkedInOrganization { id, name })
            })
            .collect())
    }

    fn generate_page_activity(&self, range: DateRange) -> PageActivity {
        let m = range.multiplier() as f64;
        let variance = self.ctx.rng().variance(VARIANCE_SPREAD);
        let scaled = |base: f64| (base * m * variance).floor();
        PageActivity {
            followers: (BASE_FOLLOWERS + FOLLOWER_GROWTH_PER_DAY * m).floor(),
            follower_gain: (15.0 * m).floor(),
            page_views: scaled(120.0),
            unique_visitors: scaled(85.0),
            button_clicks: scaled(8.0),
        }
    }

    /// Live organization statistics.
    pub fn transform(stats: &PageStatistics) -> PlatformData {
        let followers_change = if stats.followers > 0.0 {
            format!("+{}", (stats.followers * 0.02).floor() as u64)
        } else {
            "+0".to_string()
        };
        let growth = |present: bool, pct: i64| {
            if present {
                (format_change(pct), Trend::Up)
            } else {
                ("+0%".to_string(), Trend::Neutral)
            }
        };
        let (impressions_change, impressions_trend) = growth(stats.impressions > 0.0, 12);
        let (clicks_change, clicks_trend) = growth(stats.clicks > 0.0, 8);
        let engagement_trend = if stats.engagement_rate > 2.0 {
            Trend::Up
        } else if stats.engagement_rate > 1.0 {
            Trend::Neutral
        } else {
            Trend::Down
        };

        PlatformData::new(
            Platform::LinkedIn,
            vec![
                Metric::new(
                    "Followers",
                    format_rounded(stats.followers),
                    followers_change,
                    if stats.followers > 0.0 { Trend::Up } else { Trend::Neutral },
                )
                .keyed("followers"),
                Metric::new(
                    "Impressions",
                    format_rounded(stats.impressions),
                    impressions_change,
                    impressions_trend,
                )
                .keyed("impressions"),
                Metric::new(
                    "Engagement",
                    format_rounded(stats.interactions()),
                    format_percent(stats.engagement_rate),
                    engagement_trend,
                )
                .keyed("engagement"),
                Metric::new("Clicks", format_rounded(stats.clicks), clicks_change, clicks_trend)
                    .keyed("clicks"),
            ],
            DataSource::Live,
        )
    }

    fn mock_transform(activity: &PageActivity) -> PlatformData {
        PlatformData::new(
            Platform::LinkedIn,
            vec![
                Metric::new(
                    "Followers",
                    format_rounded(activity.followers),
                    format!("+{}", activity.follower_gain),
                    Trend::Up,
                )
                .keyed("followers"),
                Metric::new("Page Views", format_rounded(activity.page_views), "+8%", Trend::Up)
                    .keyed("page_views"),
                Metric::new(
                    "Unique Visitors",
                    format_rounded(activity.unique_visitors),
                    "+5%",
                    Trend::Up,
                )
                .keyed("unique_visitors"),
                Metric::new(
                    "Custom Button Clicks",
                    format_rounded(activity.button_clicks),
                    "+2%",
                    Trend::Up,
                )
                .keyed("button_clicks"),
            ],
            DataSource::Mock,
        )
    }

    fn with_engagement_chart(&self, data: PlatformData, total: f64, range: DateRange) -> PlatformData {
        let scheme = BucketScheme::Standard;
        let per_bucket = total / scheme.bucket_count(range) as f64;
        let chart = self
            .ctx
            .jittered_series(scheme.labels(range), per_bucket, 0.7, 0.6);
        data.with_chart(chart)
    }
}

#[async_trait]
impl PlatformAdapter for LinkedInAdapter {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    fn limiter(&self) -> &TokenBucket {
        &self.limiter
    }

    fn link_check_path(&self) -> &'static str {
        ORGANIZATIONS_PATH
    }

    async fn live_query(&self, resource_id: &str, range: DateRange) -> WebProResult<PlatformData> {
        let query = [
            ("organizationId", resource_id.to_string()),
            ("dateRange", range.to_string()),
        ];
        let body = self.ctx.get(METRICS_PATH, &query).await?;
        let metrics = require_object(&body, "/metrics", METRICS_PATH)?;
        let stats = PageStatistics::from_json(metrics);
        let data = Self::transform(&stats);
        Ok(self.with_engagement_chart(data, stats.total_engagement(), range))
    }

    async fn mock_query(&self, _resource_id: &str, range: DateRange) -> PlatformData {
        self.ctx.simulate_latency(MOCK_LATENCY_MS).await;
        let activity = self.generate_page_activity(range);
        let data = Self::mock_transform(&activity);
        self.with_engagement_chart(data, activity.page_views, range)
    }
}
