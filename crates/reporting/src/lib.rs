//! Cross-platform reporting: attribution, insights, keyed normalization,
//! export and scheduling over normalized `PlatformData`.

pub mod attribution;
pub mod export;
pub mod insights;
pub mod normalization;
pub mod overview;
pub mod scheduler;

pub use attribution::{calculate_attribution, generate_mock_journey, AttributionModel, AttributionResult, TouchPoint};
pub use export::{ExportFormat, ReportExporter, ReportMeta};
pub use insights::{generate_insights, Insight};
pub use normalization::{normalize_hubspot, normalize_shopify, NormalizedPlatform};
pub use overview::ReportOverview;
pub use scheduler::ReportScheduler;
