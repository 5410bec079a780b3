//! Cross-platform report overview assembled from one round of fetches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use webpro_core::{DateRange, PlatformData, RandomSource};

use crate::insights::{detect_anomalies, forecast_metric, generate_insights, Insight, DEFAULT_ANOMALY_THRESHOLD};
use crate::normalization::{normalize_hubspot, normalize_shopify, NormalizedPlatform};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOverview {
    pub date_range: DateRange,
    pub platforms: BTreeMap<String, Option<PlatformData>>,
    pub live_platforms: Vec<String>,
    pub mock_platforms: Vec<String>,
    pub missing_platforms: Vec<String>,
    pub insights: Vec<Insight>,
    pub commerce: Option<NormalizedPlatform>,
    pub crm: Option<NormalizedPlatform>,
    /// Chart-point indices flagged as outliers, per platform.
    pub chart_anomalies: BTreeMap<String, Vec<usize>>,
    /// Seven-point projection of each platform's chart series.
    pub chart_forecasts: BTreeMap<String, Vec<f64>>,
    pub generated_at: DateTime<Utc>,
}

impl ReportOverview {
    pub fn build(
        platforms: BTreeMap<String, Option<PlatformData>>,
        date_range: DateRange,
        rng: &RandomSource,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut live_platforms = Vec::new();
        let mut mock_platforms = Vec::new();
        let mut missing_platforms = Vec::new();
        let mut chart_anomalies = BTreeMap::new();
        let mut chart_forecasts = BTreeMap::new();

        for (key, data) in &platforms {
            let Some(data) = data else {
                missing_platforms.push(key.clone());
                continue;
            };
            if data.is_live() {
                live_platforms.push(key.clone());
            } else {
                mock_platforms.push(key.clone());
            }
            if let Some(chart) = &data.chart_data {
                let series: Vec<f64> = chart.iter().map(|p| p.value).collect();
                let anomalies = detect_anomalies(&series, DEFAULT_ANOMALY_THRESHOLD);
                if !anomalies.is_empty() {
                    chart_anomalies.insert(key.clone(), anomalies);
                }
                chart_forecasts.insert(key.clone(), forecast_metric(&series, rng));
            }
        }

        let present = |key: &str| platforms.get(key).and_then(Option::as_ref);
        let commerce = present("shopify").map(normalize_shopify);
        let crm = present("hubspot").map(normalize_hubspot);
        let insights = generate_insights(&platforms, generated_at);

        Self {
            date_range,
            live_platforms,
            mock_platforms,
            missing_platforms,
            insights,
            commerce,
            crm,
            chart_anomalies,
            chart_forecasts,
            generated_at,
            platforms,
        }
    }

    pub fn is_fully_live(&self) -> bool {
        self.mock_platforms.is_empty() && self.missing_platforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webpro_core::{ChartPoint, DataSource, Metric, Platform, Trend};

    #[test]
    fn test_overview_partitions_sources() {
        let shopify = PlatformData::new(
            Platform::Shopify,
            vec![Metric::new("Revenue", "KES 1,000", "+8%", Trend::Up).keyed("revenue")],
            DataSource::Mock,
        )
        .with_chart(vec![ChartPoint::new("Mon", 10.0), ChartPoint::new("Tue", 12.0)]);
        let linkedin = PlatformData::new(
            Platform::LinkedIn,
            vec![Metric::new("Followers", "5,000", "+100", Trend::Up)],
            DataSource::Live,
        );
        let platforms = BTreeMap::from([
            ("shopify".to_string(), Some(shopify)),
            ("linkedin".to_string(), Some(linkedin)),
            ("hubspot".to_string(), None),
        ]);

        let overview = ReportOverview::build(platforms, DateRange::Weekly, &RandomSource::seeded(1), Utc::now());
        assert_eq!(overview.live_platforms, vec!["linkedin"]);
        assert_eq!(overview.mock_platforms, vec!["shopify"]);
        assert_eq!(overview.missing_platforms, vec!["hubspot"]);
        assert!(!overview.is_fully_live());
        assert_eq!(overview.commerce.as_ref().and_then(|c| c.value("revenue")), Some(1000.0));
        assert!(overview.crm.is_none());
        assert_eq!(overview.chart_forecasts["shopify"].len(), 7);
        assert!(!overview.chart_forecasts.contains_key("linkedin"));
    }
}
