//! Keyed numeric views of commerce and CRM platform data for cross-platform
//! aggregation.

use serde::{Deserialize, Serialize};
use webpro_core::format::extract_number;
use webpro_core::{ChartPoint, PlatformData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDef {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
}

pub const SHOPIFY_METRICS: [MetricDef; 4] = [
    MetricDef { key: "revenue", label: "Revenue", unit: "KES" },
    MetricDef { key: "orders", label: "Orders", unit: "" },
    MetricDef { key: "aov", label: "Average Order Value", unit: "KES" },
    MetricDef { key: "repeat_rate", label: "Repeat Rate", unit: "%" },
];

pub const HUBSPOT_METRICS: [MetricDef; 5] = [
    MetricDef { key: "deals_created", label: "Deals Created", unit: "" },
    MetricDef { key: "deals_won", label: "Deals Won", unit: "" },
    MetricDef { key: "pipeline_value", label: "Pipeline Value", unit: "KES" },
    MetricDef { key: "win_rate", label: "Win Rate", unit: "%" },
    MetricDef { key: "avg_cycle", label: "Avg Sales Cycle (days)", unit: "days" },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedMetric {
    pub key: String,
    pub label: String,
    pub unit: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPlatform {
    pub platform: String,
    pub metrics: Vec<UnifiedMetric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<Vec<ChartPoint>>,
}

impl NormalizedPlatform {
    pub fn value(&self, key: &str) -> Option<f64> {
        self.metrics.iter().find(|m| m.key == key).map(|m| m.value)
    }
}

pub fn normalize_shopify(data: &PlatformData) -> NormalizedPlatform {
    normalize("Shopify", data, &SHOPIFY_METRICS)
}

pub fn normalize_hubspot(data: &PlatformData) -> NormalizedPlatform {
    normalize("HubSpot CRM", data, &HUBSPOT_METRICS)
}

/// Metrics are looked up by semantic key (label as fallback), so adapter
/// ordering does not matter. Missing metrics read as zero.
fn normalize(platform: &str, data: &PlatformData, defs: &[MetricDef]) -> NormalizedPlatform {
    let metrics = defs
        .iter()
        .map(|def| UnifiedMetric {
            key: def.key.to_string(),
            label: def.label.to_string(),
            unit: def.unit.to_string(),
            value: data
                .metric(def.key)
                .or_else(|| data.metric(def.label))
                .map(|m| extract_number(&m.value))
                .unwrap_or(0.0),
        })
        .collect();
    NormalizedPlatform {
        platform: platform.to_string(),
        metrics,
        chart: data.chart_data.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webpro_core::{DataSource, Metric, Platform, Trend};

    fn shopify_data(metrics: Vec<Metric>) -> PlatformData {
        PlatformData::new(Platform::Shopify, metrics, DataSource::Mock)
    }

    #[test]
    fn test_shopify_values_recovered_by_key() {
        let data = shopify_data(vec![
            Metric::new("Repeat Rate", "21.4%", "+1%", Trend::Up).keyed("repeat_rate"),
            Metric::new("Revenue", "KES 250,000", "+8%", Trend::Up).keyed("revenue"),
            Metric::new("AOV", "KES 481", "+2%", Trend::Up).keyed("aov"),
            Metric::new("Orders", "520", "+5%", Trend::Up).keyed("orders"),
        ]);
        let normalized = normalize_shopify(&data);
        assert_eq!(normalized.platform, "Shopify");
        assert_eq!(normalized.value("revenue"), Some(250_000.0));
        assert_eq!(normalized.value("orders"), Some(520.0));
        assert_eq!(normalized.value("aov"), Some(481.0));
        assert_eq!(normalized.value("repeat_rate"), Some(21.4));
        assert_eq!(normalized.metrics[0].unit, "KES");
    }

    #[test]
    fn test_label_fallback_and_missing_metrics() {
        let data = PlatformData::new(
            Platform::HubSpot,
            vec![
                Metric::new("Deals Won", "31", "+4%", Trend::Up),
                Metric::new("Win Rate", "38.8%", "+1%", Trend::Up),
            ],
            DataSource::Live,
        );
        let normalized = normalize_hubspot(&data);
        assert_eq!(normalized.value("deals_won"), Some(31.0));
        assert_eq!(normalized.value("win_rate"), Some(38.8));
        assert_eq!(normalized.value("deals_created"), Some(0.0));
        assert!(normalized.chart.is_none());
    }
}
