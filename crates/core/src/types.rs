//! Common metrics contract shared by every platform adapter and the
//! reporting engines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WebProError;

/// Supported data sources.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Gmb,
    SearchConsole,
    #[serde(rename = "linkedin")]
    LinkedIn,
    #[serde(rename = "x_ads")]
    X,
    Shopify,
    #[serde(rename = "hubspot")]
    HubSpot,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Gmb,
        Platform::SearchConsole,
        Platform::LinkedIn,
        Platform::X,
        Platform::Shopify,
        Platform::HubSpot,
    ];

    /// Identifier used as `PlatformData.id` and as the key in platform maps.
    pub fn id(&self) -> &'static str {
        match self {
            Platform::Gmb => "gmb",
            Platform::SearchConsole => "search_console",
            Platform::LinkedIn => "linkedin",
            Platform::X => "x_ads",
            Platform::Shopify => "shopify",
            Platform::HubSpot => "hubspot",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Gmb => "Google Business Profile",
            Platform::SearchConsole => "Search Console",
            Platform::LinkedIn => "LinkedIn",
            Platform::X => "X (Twitter)",
            Platform::Shopify => "Shopify",
            Platform::HubSpot => "HubSpot CRM",
        }
    }

    /// Path segment used by the backend OAuth start endpoint.
    pub fn oauth_provider(&self) -> &'static str {
        match self {
            Platform::Gmb | Platform::SearchConsole => "google",
            Platform::LinkedIn => "linkedin",
            Platform::X => "x",
            Platform::Shopify => "shopify",
            Platform::HubSpot => "hubspot",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Platform {
    type Err = WebProError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gmb" | "google_business" => Ok(Platform::Gmb),
            "search_console" | "gsc" => Ok(Platform::SearchConsole),
            "linkedin" => Ok(Platform::LinkedIn),
            "x" | "x_ads" | "twitter" => Ok(Platform::X),
            "shopify" => Ok(Platform::Shopify),
            "hubspot" | "hubspot_crm" => Ok(Platform::HubSpot),
            other => Err(WebProError::Config(format!("unknown platform: {other}"))),
        }
    }
}

/// Reporting window requested by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl DateRange {
    /// Scale applied to per-day base magnitudes.
    pub fn multiplier(&self) -> u32 {
        match self {
            DateRange::Daily => 1,
            DateRange::Weekly => 7,
            DateRange::Monthly => 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Daily => "daily",
            DateRange::Weekly => "weekly",
            DateRange::Monthly => "monthly",
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateRange {
    type Err = WebProError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(DateRange::Daily),
            "weekly" => Ok(DateRange::Weekly),
            "monthly" => Ok(DateRange::Monthly),
            other => Err(WebProError::Config(format!("unknown date range: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// Where a `PlatformData` came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Mock,
}

/// A single display-ready KPI. `value` and `change` are already formatted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    pub label: String,
    pub value: String,
    pub change: String,
    pub trend: Trend,
    /// Semantic key (e.g. `revenue`) used for keyed lookups across platforms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Metric {
    pub fn new(
        label: impl Into<String>,
        value: impl Into<String>,
        change: impl Into<String>,
        trend: Trend,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            change: change.into(),
            trend,
            key: None,
        }
    }

    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Output of one adapter fetch for one (platform, date range) query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformData {
    pub id: String,
    pub metrics: Vec<Metric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_data: Option<Vec<ChartPoint>>,
    pub source: DataSource,
}

impl PlatformData {
    pub fn new(platform: Platform, metrics: Vec<Metric>, source: DataSource) -> Self {
        Self {
            id: platform.id().to_string(),
            metrics,
            chart_data: None,
            source,
        }
    }

    pub fn with_chart(mut self, chart: Vec<ChartPoint>) -> Self {
        self.chart_data = Some(chart);
        self
    }

    /// Look up a metric by semantic key, falling back to a case-insensitive
    /// label match.
    pub fn metric(&self, key: &str) -> Option<&Metric> {
        self.metrics
            .iter()
            .find(|m| m.key.as_deref() == Some(key))
            .or_else(|| {
                self.metrics
                    .iter()
                    .find(|m| m.label.eq_ignore_ascii_case(key))
            })
    }

    pub fn is_live(&self) -> bool {
        self.source == DataSource::Live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_ids_round_trip() {
        for platform in Platform::ALL {
            let parsed: Platform = platform.id().parse().unwrap();
            assert_eq!(parsed, platform);
        }
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_serde_matches_id() {
        for platform in Platform::ALL {
            let json = serde_json::to_string(&platform).unwrap();
            assert_eq!(json, format!("\"{}\"", platform.id()));
        }
    }

    #[test]
    fn test_date_range_multiplier() {
        assert_eq!(DateRange::Daily.multiplier(), 1);
        assert_eq!(DateRange::Weekly.multiplier(), 7);
        assert_eq!(DateRange::Monthly.multiplier(), 30);
        assert_eq!("WEEKLY".parse::<DateRange>().unwrap(), DateRange::Weekly);
    }

    #[test]
    fn test_metric_lookup_prefers_key() {
        let data = PlatformData::new(
            Platform::Shopify,
            vec![
                Metric::new("Orders", "520", "+5%", Trend::Up).keyed("orders"),
                Metric::new("Revenue", "KES 1,000", "+8%", Trend::Up).keyed("revenue"),
            ],
            DataSource::Mock,
        );
        assert_eq!(data.metric("revenue").unwrap().label, "Revenue");
        assert_eq!(data.metric("ORDERS").unwrap().value, "520");
        assert!(data.metric("aov").is_none());
    }

    #[test]
    fn test_platform_data_json_shape() {
        let data = PlatformData::new(
            Platform::X,
            vec![Metric::new("Followers", "10", "+—", Trend::Neutral)],
            DataSource::Live,
        )
        .with_chart(vec![ChartPoint::new("Mon", 3.0)]);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["id"], "x_ads");
        assert_eq!(json["source"], "live");
        assert_eq!(json["chartData"][0]["name"], "Mon");
        assert_eq!(json["metrics"][0]["trend"], "neutral");
        assert!(json["metrics"][0].get("key").is_none());
    }
}
