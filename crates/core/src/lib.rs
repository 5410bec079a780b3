//! Shared types, configuration, errors and formatting for WebPro Metrics.

pub mod config;
pub mod error;
pub mod format;
pub mod random;
pub mod types;

pub use config::AppConfig;
pub use error::{WebProError, WebProResult};
pub use random::RandomSource;
pub use types::{ChartPoint, DataSource, DateRange, Metric, Platform, PlatformData, Trend};
