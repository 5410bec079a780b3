//! X (Twitter) account adapter.

use async_trait::async_trait;
use serde_json::Value;
use webpro_core::format::{format_compact, format_rounded};
use webpro_core::{DataSource, DateRange, Metric, Platform, PlatformData, Trend, WebProResult};

use crate::adapter::{number_at, require_object, AdapterContext, PlatformAdapter};
use crate::buckets::BucketScheme;
use crate::rate_limit::{RateLimitPolicy, TokenBucket};

pub const RATE_LIMIT: RateLimitPolicy = RateLimitPolicy::new(10, 2.0);
pub const MOCK_LATENCY_MS: u64 = 350;
const VARIANCE_SPREAD: f64 = 0.2;
const SCHEME: BucketScheme = BucketScheme::Standard;
/// Share of mock impressions plotted as engagements on the activity chart.
const MOCK_CHART_SHARE: f64 = 1_200.0 / 125_000.0;

const USER_PATH: &str = "/x/user";
const METRICS_PATH: &str = "/x/metrics";

/// Synthetic account activity served when the live path is unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AccountActivity {
    impressions: f64,
    profile_visits: f64,
    mentions: f64,
    followers: u64,
}

/// `public_metrics` of the authenticated account.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PublicMetrics {
    pub followers_count: f64,
    pub following_count: f64,
    pub tweet_count: f64,
    pub listed_count: f64,
}

impl PublicMetrics {
    pub fn from_json(public_metrics: &Value) -> Self {
        Self {
            followers_count: number_at(public_metrics, "/followers_count"),
            following_count: number_at(public_metrics, "/following_count"),
            tweet_count: number_at(public_metrics, "/tweet_count"),
            listed_count: number_at(public_metrics, "/listed_count"),
        }
    }
}

pub struct XAdapter {
    ctx: AdapterContext,
    limiter: TokenBucket,
}

impl XAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            ctx,
            limiter: TokenBucket::new("x", RATE_LIMIT),
        }
    }

    /// Raw profile of the linked account; empty object in mock mode.
    pub async fn get_user(&self) -> WebProResult<Value> {
        if self.ctx.use_mock_data() {
            return Ok(Value::Object(Default::default()));
        }
        self.ctx.get(USER_PATH, &[]).await
    }

    fn generate_activity(&self, range: DateRange) -> AccountActivity {
        let m = range.multiplier() as f64;
        let variance = self.ctx.rng().variance(VARIANCE_SPREAD);
        AccountActivity {
            impressions: (125_000.0 * m * variance).round(),
            profile_visits: (3_400.0 * m * variance).round(),
            mentions: (450.0 * m * variance).floor(),
            followers: (10_500.0 * variance).floor() as u64,
        }
    }

    /// Live `public_metrics` view. The API exposes no period-over-period
    /// deltas, so every change is neutral.
    pub fn transform(metrics: &PublicMetrics) -> PlatformData {
        let rows = [
            ("Followers", "followers", metrics.followers_count),
            ("Following", "following", metrics.following_count),
            ("Tweets", "tweets", metrics.tweet_count),
            ("Listed", "listed", metrics.listed_count),
        ];
        let metrics = rows
            .iter()
            .map(|(label, key, value)| {
                Metric::new(*label, format_rounded(*value), "+—", Trend::Neutral).keyed(*key)
            })
            .collect();
        PlatformData::new(Platform::X, metrics, DataSource::Live)
    }

    fn mock_transform(activity: &AccountActivity) -> PlatformData {
        PlatformData::new(
            Platform::X,
            vec![
                Metric::new("Tweet Impressions", format_rounded(activity.impressions), "-2%", Trend::Down)
                    .keyed("impressions"),
                Metric::new("Profile Visits", format_rounded(activity.profile_visits), "+5%", Trend::Up)
                    .keyed("profile_visits"),
                Metric::new("Mentions", format_rounded(activity.mentions), "+12%", Trend::Up)
                    .keyed("mentions"),
                Metric::new("Followers", format_compact(activity.followers), "+15", Trend::Neutral)
                    .keyed("followers"),
            ],
            DataSource::Mock,
        )
    }

    fn with_activity_chart(&self, data: PlatformData, metrics: &PublicMetrics, range: DateRange) -> PlatformData {
        // Accounts without a tweet count still get a visible baseline.
        let tweets = if metrics.tweet_count > 0.0 {
            metrics.tweet_count
        } else {
            100.0
        };
        let per_bucket = tweets / SCHEME.bucket_count(range) as f64;
        let chart = self
            .ctx
            .jittered_series(SCHEME.labels(range), per_bucket, 0.5, 1.0);
        data.with_chart(chart)
    }
}

#[async_trait]
impl PlatformAdapter for XAdapter {
    fn platform(&self) -> Platform {
        Platform::X
    }

    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    fn limiter(&self) -> &TokenBucket {
        &self.limiter
    }

    fn link_check_path(&self) -> &'static str {
        USER_PATH
    }

    async fn live_query(&self, _resource_id: &str, range: DateRange) -> WebProResult<PlatformData> {
        let query = [("dateRange", range.to_string())];
        let body = self.ctx.get(METRICS_PATH, &query).await?;
        let public = require_object(&body, "/user/data/public_metrics", METRICS_PATH)?;
        let metrics = PublicMetrics::from_json(public);
        let data = Self::transform(&metrics);
        Ok(self.with_activity_chart(data, &metrics, range))
    }

    async fn mock_query(&self, _resource_id: &str, range: DateRange) -> PlatformData {
        self.ctx.simulate_latency(MOCK_LATENCY_MS).await;
        let activity = self.generate_activity(range);
        let per_bucket = activity.impressions * MOCK_CHART_SHARE / SCHEME.bucket_count(range) as f64;
        let chart = self
            .ctx
            .jittered_series(SCHEME.labels(range), per_bucket, 0.0, 1.0);
        Self::mock_transform(&activity).with_chart(chart)
    }
}
