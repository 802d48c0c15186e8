//! HR Analytics - прогнозная аналитика по кадровым данным

pub mod types;
pub mod error;
pub mod config;
pub mod preprocessing;
pub mod models;
pub mod cache;
pub mod facade;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use types::*;
pub use models::*;
pub use preprocessing::*;

// Re-export для удобства
pub use cache::ResultCache;
pub use config::AnalyticsConfig;
pub use error::{AnalyticsError, ErrorKind};
pub use facade::{AnalyticsFacade, AnalyticsRequest, AnalyticsResponse, Operation, Outcome};
