//! Rule-based insights over normalized platform metrics, plus simple
//! forecasting and anomaly detection on numeric series.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use webpro_core::{Metric, PlatformData, RandomSource};

pub const MAX_INSIGHTS: usize = 12;
pub const FORECAST_HORIZON: usize = 7;
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.0;

static SIGNED_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+").expect("signed integer pattern is valid"));

const SEARCH_PLATFORMS: [&str; 2] = ["search_console", "google_ads"];
const SOCIAL_PLATFORMS: [&str; 3] = ["meta_ads", "linkedin", "x_ads"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Success,
    Warning,
    Opportunity,
    Alert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// First signed integer in a formatted change string; `0` when absent.
pub fn parse_change(change: &str) -> i64 {
    SIGNED_INTEGER
        .find(change)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Human-readable platform name for insight copy.
pub fn platform_name(key: &str) -> &str {
    match key {
        "google_ads" => "Google Ads",
        "ga4" => "Google Analytics",
        "meta_ads" => "Meta Ads",
        "search_console" => "Search Console",
        "linkedin" => "LinkedIn",
        "x_ads" => "X (Twitter)",
        "tiktok_ads" => "TikTok",
        "shopify" => "Shopify",
        "hubspot" | "hubspot_crm" => "HubSpot CRM",
        "gmb" => "Google Business",
        other => other,
    }
}

/// Hands out `insight_1`, `insight_2`, ... across both generation passes.
struct InsightIds(u32);

impl InsightIds {
    fn next(&mut self) -> String {
        self.0 += 1;
        format!("insight_{}", self.0)
    }
}

/// Classify every metric's change, add cross-platform observations, then keep
/// the highest-impact insights (stable within an impact level).
pub fn generate_insights(
    platforms: &BTreeMap<String, Option<PlatformData>>,
    now: DateTime<Utc>,
) -> Vec<Insight> {
    let mut ids = InsightIds(0);
    let mut insights = Vec::new();

    for (platform, data) in platforms {
        let Some(data) = data else { continue };
        for metric in &data.metrics {
            metric_insights(platform, metric, now, &mut ids, &mut insights);
        }
    }
    cross_platform_insights(platforms, now, &mut ids, &mut insights);

    insights.sort_by_key(|i| Reverse(i.impact));
    insights.truncate(MAX_INSIGHTS);
    insights
}

fn metric_insights(
    platform: &str,
    metric: &Metric,
    now: DateTime<Utc>,
    ids: &mut InsightIds,
    out: &mut Vec<Insight>,
) {
    let change = parse_change(&metric.change);
    let name = platform_name(platform);
    let label = &metric.label;
    let mut push = |insight_type, impact, title: String, description: String, recommendation: &str| {
        out.push(Insight {
            id: ids.next(),
            insight_type,
            title,
            description,
            impact,
            platform: platform.to_string(),
            metric: Some(label.clone()),
            recommendation: Some(recommendation.to_string()),
            created_at: now,
        });
    };

    if change > 20 {
        push(
            InsightType::Success,
            Impact::High,
            format!("Strong {label} Growth"),
            format!(
                "Your {label} increased by {} on {name}. This indicates effective campaign performance.",
                metric.change
            ),
            "Continue current strategy and consider scaling budget by 15-20% to capitalize on momentum.",
        );
    }
    if change < -10 {
        push(
            InsightType::Alert,
            Impact::High,
            format!("{label} Decline Detected"),
            format!(
                "{label} dropped by {}% on {name}. Immediate attention recommended.",
                change.abs()
            ),
            "Review recent changes in targeting, ad creative, or bidding strategy. Consider A/B testing new approaches.",
        );
    }
    if change > 5 && change <= 20 {
        push(
            InsightType::Opportunity,
            Impact::Medium,
            format!("Growth Opportunity in {label}"),
            format!(
                "{label} is up {} on {name}. Room for optimization exists.",
                metric.change
            ),
            "Test new ad variations or expand to similar audiences to accelerate growth.",
        );
    }
    if change.abs() < 2 {
        push(
            InsightType::Warning,
            Impact::Medium,
            format!("{label} Stagnating"),
            format!(
                "{label} on {name} has remained flat ({}). Consider refreshing strategy.",
                metric.change
            ),
            "Experiment with new channels, creative formats, or audience segments to reignite growth.",
        );
    }
}

fn cross_platform_insights(
    platforms: &BTreeMap<String, Option<PlatformData>>,
    now: DateTime<Utc>,
    ids: &mut InsightIds,
    out: &mut Vec<Insight>,
) {
    let present = |key: &str| platforms.get(key).is_some_and(Option::is_some);
    let active = platforms.values().filter(|d| d.is_some()).count();

    if active >= 3 {
        out.push(Insight {
            id: ids.next(),
            insight_type: InsightType::Success,
            title: "Multi-Platform Coverage Active".into(),
            description: format!(
                "You're leveraging {active} platforms for comprehensive reach. Cross-platform synergy is boosting overall performance."
            ),
            impact: Impact::High,
            platform: "cross-platform".into(),
            metric: None,
            recommendation: Some(
                "Maintain consistent messaging across all channels and track customer journey touchpoints for better attribution.".into(),
            ),
            created_at: now,
        });
    }

    let has_search = SEARCH_PLATFORMS.iter().any(|p| present(p));
    let has_social = SOCIAL_PLATFORMS.iter().any(|p| present(p));
    if has_search && !has_social {
        out.push(Insight {
            id: ids.next(),
            insight_type: InsightType::Opportunity,
            title: "Expand to Social Channels".into(),
            description: "Your strategy is search-heavy. Adding social platforms could unlock new audience segments.".into(),
            impact: Impact::High,
            platform: "strategy".into(),
            metric: None,
            recommendation: Some(
                "Consider adding Meta Ads or LinkedIn to reach audiences earlier in the funnel.".into(),
            ),
            created_at: now,
        });
    }
}

/// Linear-trend forecast of the next seven points with ±5% noise.
pub fn forecast_metric(history: &[f64], rng: &RandomSource) -> Vec<f64> {
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return Vec::new();
    };
    let n = history.len() as f64;
    let avg = history.iter().sum::<f64>() / n;
    let trend = (last - first) / n;
    (0..FORECAST_HORIZON)
        .map(|i| {
            let noise = (rng.next_f64() - 0.5) * avg * 0.1;
            (avg + trend * (n + i as f64) + noise).round().max(0.0)
        })
        .collect()
}

/// Indices whose distance from the mean exceeds `threshold` population
/// standard deviations.
pub fn detect_anomalies(data: &[f64], threshold: f64) -> Vec<usize> {
    if data.is_empty() {
        return Vec::new();
    }
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let std_dev = (data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
    data.iter()
        .enumerate()
        .filter(|(_, x)| (*x - mean).abs() > threshold * std_dev)
        .map(|(i, _)| i)
        .collect()
}
