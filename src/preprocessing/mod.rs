/// Модуль предобработки данных

pub mod feature_engineering;
pub mod normalization;
pub mod statistics;

pub use feature_engineering::{FeatureEngineer, LeavePoint};
pub use normalization::DataNormalizer;
pub use statistics::Statistics;
