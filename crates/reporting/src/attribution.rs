//! Multi-touch revenue attribution across platforms.
//!
//! A journey is an ordered list of touch points ending in a conversion. Each
//! model turns the journey into per-platform weights; results are reported in
//! order of first appearance and their contributions sum to 100.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use webpro_core::RandomSource;

const TIME_DECAY_HALF_LIFE_DAYS: f64 = 7.0;

const FALLBACK_FIRST_PLATFORM: &str = "google_ads";
const FALLBACK_LAST_PLATFORM: &str = "meta_ads";

// ─── Types ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchType {
    Impression,
    Click,
    Engagement,
    Conversion,
}

impl TouchType {
    /// Heuristic weight used by the data-driven model.
    pub fn weight(&self) -> f64 {
        match self {
            TouchType::Conversion => 3.0,
            TouchType::Engagement => 2.0,
            TouchType::Click => 1.5,
            TouchType::Impression => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchPoint {
    pub id: String,
    pub platform: String,
    pub touch_type: TouchType,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionModel {
    LastClick,
    FirstClick,
    Linear,
    TimeDecay,
    PositionBased,
    DataDriven,
}

impl AttributionModel {
    pub const ALL: [AttributionModel; 6] = [
        AttributionModel::LastClick,
        AttributionModel::FirstClick,
        AttributionModel::Linear,
        AttributionModel::TimeDecay,
        AttributionModel::PositionBased,
        AttributionModel::DataDriven,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            AttributionModel::LastClick => "last_click",
            AttributionModel::FirstClick => "first_click",
            AttributionModel::Linear => "linear",
            AttributionModel::TimeDecay => "time_decay",
            AttributionModel::PositionBased => "position_based",
            AttributionModel::DataDriven => "data_driven",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttributionModel::LastClick => "Last Click",
            AttributionModel::FirstClick => "First Click",
            AttributionModel::Linear => "Linear",
            AttributionModel::TimeDecay => "Time Decay",
            AttributionModel::PositionBased => "Position-Based (U-Shaped)",
            AttributionModel::DataDriven => "Data-Driven (Heuristic)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AttributionModel::LastClick => {
                "Gives 100% credit to the last touchpoint before conversion"
            }
            AttributionModel::FirstClick => {
                "Gives 100% credit to the first touchpoint in the customer journey"
            }
            AttributionModel::Linear => "Distributes credit equally across all touchpoints",
            AttributionModel::TimeDecay => {
                "Gives more credit to touchpoints closer to conversion (7-day half-life)"
            }
            AttributionModel::PositionBased => {
                "Gives 40% each to first and last touch, 20% to middle touches"
            }
            AttributionModel::DataDriven => {
                "Weights touches by interaction type and value; a heuristic, not a trained model"
            }
        }
    }

    /// Resolve a model id. Unknown ids fall back to linear.
    pub fn from_id(id: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|m| m.id() == id)
            .unwrap_or(AttributionModel::Linear)
    }
}

impl fmt::Display for AttributionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// The selectable models with display metadata.
pub fn model_catalog() -> Vec<ModelInfo> {
    AttributionModel::ALL
        .iter()
        .map(|m| ModelInfo {
            id: m.id().to_string(),
            name: m.name().to_string(),
            description: m.description().to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    pub platform: String,
    /// Percent of the credit, 0..=100.
    pub contribution: f64,
    pub revenue: f64,
    pub conversions: f64,
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Per-platform weights in first-appearance order.
#[derive(Default)]
struct PlatformWeights(Vec<(String, f64)>);

impl PlatformWeights {
    fn add(&mut self, platform: &str, weight: f64) {
        match self.0.iter_mut().find(|(p, _)| p == platform) {
            Some((_, w)) => *w += weight,
            None => self.0.push((platform.to_string(), weight)),
        }
    }

    fn seeded(touch_points: &[TouchPoint]) -> Self {
        let mut weights = Self::default();
        for tp in touch_points {
            weights.add(&tp.platform, 0.0);
        }
        weights
    }

    fn into_results(self, revenue: f64, conversions: f64) -> Vec<AttributionResult> {
        let total: f64 = self.0.iter().map(|(_, w)| w).sum();
        self.0
            .into_iter()
            .map(|(platform, weight)| {
                let share = if total > 0.0 { weight / total } else { 0.0 };
                AttributionResult {
                    platform,
                    contribution: share * 100.0,
                    revenue: revenue * share,
                    conversions: conversions * share,
                }
            })
            .collect()
    }
}

/// Split `revenue` and `conversions` across the journey's platforms.
pub fn calculate_attribution(
    touch_points: &[TouchPoint],
    model: AttributionModel,
    revenue: f64,
    conversions: f64,
) -> Vec<AttributionResult> {
    let (first, last) = match (touch_points.first(), touch_points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Vec::new(),
    };

    if touch_points.len() == 1 {
        return vec![AttributionResult {
            platform: first.platform.clone(),
            contribution: 100.0,
            revenue,
            conversions,
        }];
    }

    let weights = match model {
        AttributionModel::LastClick => endpoint_weights(touch_points, last),
        AttributionModel::FirstClick => endpoint_weights(touch_points, first),
        AttributionModel::Linear => {
            let mut weights = PlatformWeights::default();
            for tp in touch_points {
                weights.add(&tp.platform, 1.0);
            }
            weights
        }
        AttributionModel::TimeDecay => time_decay_weights(touch_points, last.timestamp),
        AttributionModel::PositionBased => position_weights(touch_points),
        AttributionModel::DataDriven => {
            let mut weights = PlatformWeights::default();
            for tp in touch_points {
                weights.add(&tp.platform, tp.touch_type.weight() * (1.0 + tp.value / 100.0));
            }
            weights
        }
    };
    weights.into_results(revenue, conversions)
}

fn endpoint_weights(touch_points: &[TouchPoint], endpoint: &TouchPoint) -> PlatformWeights {
    let mut weights = PlatformWeights::seeded(touch_points);
    weights.add(&endpoint.platform, 1.0);
    weights
}

fn time_decay_weights(touch_points: &[TouchPoint], conversion_at: DateTime<Utc>) -> PlatformWeights {
    let mut weights = PlatformWeights::default();
    for tp in touch_points {
        let days_before = (conversion_at - tp.timestamp).num_milliseconds() as f64 / 86_400_000.0;
        let weight = (-days_before * std::f64::consts::LN_2 / TIME_DECAY_HALF_LIFE_DAYS).exp();
        weights.add(&tp.platform, weight);
    }
    weights
}

fn position_weights(touch_points: &[TouchPoint]) -> PlatformWeights {
    let mut weights = PlatformWeights::seeded(touch_points);
    let n = touch_points.len();
    if n == 2 {
        // No middle touches: the endpoints split the credit evenly.
        weights.add(&touch_points[0].platform, 0.5);
        weights.add(&touch_points[1].platform, 0.5);
        return weights;
    }
    weights.add(&touch_points[0].platform, 0.4);
    weights.add(&touch_points[n - 1].platform, 0.4);
    let middle = &touch_points[1..n - 1];
    let share = 0.2 / middle.len() as f64;
    for tp in middle {
        weights.add(&tp.platform, share);
    }
    weights
}

// ─── Mock journeys ──────────────────────────────────────────────────────────

/// Synthetic five-touch journey spanning the 14 days before `now`: an
/// impression on the first platform, three alternating click/engagement
/// touches on random platforms, and a conversion on the last platform.
pub fn generate_mock_journey(
    platforms: &[String],
    rng: &RandomSource,
    now: DateTime<Utc>,
) -> Vec<TouchPoint> {
    let start = now - Duration::days(14);
    let first_platform = platforms
        .first()
        .map(String::as_str)
        .unwrap_or(FALLBACK_FIRST_PLATFORM);
    let last_platform = platforms
        .last()
        .map(String::as_str)
        .unwrap_or(FALLBACK_LAST_PLATFORM);

    let mut journey = vec![TouchPoint {
        id: "tp_1".into(),
        platform: first_platform.to_string(),
        touch_type: TouchType::Impression,
        timestamp: start,
        value: 10.0,
    }];

    for i in 0..3 {
        let platform = if platforms.is_empty() {
            FALLBACK_FIRST_PLATFORM.to_string()
        } else {
            platforms[rng.index(platforms.len())].clone()
        };
        journey.push(TouchPoint {
            id: format!("tp_{}", i + 2),
            platform,
            touch_type: if i % 2 == 0 {
                TouchType::Click
            } else {
                TouchType::Engagement
            },
            timestamp: start + Duration::days(3 * (i + 1)),
            value: rng.between(20.0, 30.0),
        });
    }

    journey.push(TouchPoint {
        id: format!("tp_{}", journey.len() + 1),
        platform: last_platform.to_string(),
        touch_type: TouchType::Conversion,
        timestamp: now,
        value: 100.0,
    });
    journey
}

// ─── Tests ──────────────────────────────────────────────────────────────────
