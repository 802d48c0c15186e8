//! Настройки аналитических моделей

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Зерно для всех генераторов (бутстрап, перестановки, k-means)
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Лимит времени на обучение ансамбля, мс
    #[serde(default)]
    pub training_budget_ms: Option<u64>,
    #[serde(default)]
    pub leave: LeaveConfig,
    #[serde(default)]
    pub compensation: CompensationConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub workload: WorkloadConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveConfig {
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    #[serde(default = "default_ridge_alpha")]
    pub ridge_alpha: f64,
    #[serde(default = "default_seasonal_peak_ratio")]
    pub seasonal_peak_ratio: f64,
    #[serde(default = "default_high_usage_days")]
    pub high_usage_days: f64,
    #[serde(default = "default_strong_trend_slope")]
    pub strong_trend_slope: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl ForestConfig {
    pub fn compensation() -> Self {
        Self {
            n_trees: 50,
            max_depth: 10,
            min_samples_split: 2,
        }
    }

    pub fn performance() -> Self {
        Self {
            n_trees: 100,
            max_depth: 15,
            min_samples_split: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationConfig {
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    #[serde(default = "ForestConfig::compensation")]
    pub forest: ForestConfig,
    #[serde(default = "default_growth_window")]
    pub growth_window: usize,
    /// Рост прогноза (в %), выше которого нужен бюджет
    #[serde(default = "default_high_growth_rate")]
    pub high_growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_n_runs")]
    pub n_runs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "ForestConfig::performance")]
    pub forest: ForestConfig,
    #[serde(default = "default_permutation_repeats")]
    pub permutation_repeats: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    #[serde(default = "default_bottleneck")]
    pub bottleneck_utilization: f64,
    #[serde(default = "default_underutilized")]
    pub underutilized_utilization: f64,
    #[serde(default = "default_capacity")]
    pub default_capacity: f64,
}

fn default_seed() -> u64 { 42 }
fn default_horizon() -> usize { 6 }
fn default_ridge_alpha() -> f64 { 1e-3 }
fn default_seasonal_peak_ratio() -> f64 { 1.5 }
fn default_high_usage_days() -> f64 { 15.0 }
fn default_strong_trend_slope() -> f64 { 0.5 }
fn default_growth_window() -> usize { 3 }
fn default_high_growth_rate() -> f64 { 10.0 }
fn default_z_threshold() -> f64 { 2.0 }
fn default_max_iterations() -> u64 { 100 }
fn default_tolerance() -> f64 { 1e-4 }
fn default_n_runs() -> usize { 10 }
fn default_permutation_repeats() -> usize { 5 }
fn default_bottleneck() -> f64 { 0.9 }
fn default_underutilized() -> f64 { 0.5 }
pub(crate) fn default_capacity() -> f64 { 100.0 }

impl Default for LeaveConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            ridge_alpha: default_ridge_alpha(),
            seasonal_peak_ratio: default_seasonal_peak_ratio(),
            high_usage_days: default_high_usage_days(),
            strong_trend_slope: default_strong_trend_slope(),
        }
    }
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            forest: ForestConfig::compensation(),
            growth_window: default_growth_window(),
            high_growth_rate: default_high_growth_rate(),
        }
    }
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            z_threshold: default_z_threshold(),
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            n_runs: default_n_runs(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            forest: ForestConfig::performance(),
            permutation_repeats: default_permutation_repeats(),
        }
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            bottleneck_utilization: default_bottleneck(),
            underutilized_utilization: default_underutilized(),
            default_capacity: default_capacity(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            training_budget_ms: None,
            leave: LeaveConfig::default(),
            compensation: CompensationConfig::default(),
            anomaly: AnomalyConfig::default(),
            clustering: ClusteringConfig::default(),
            performance: PerformanceConfig::default(),
            workload: WorkloadConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AnalyticsError::InvalidInput(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AnalyticsError::InvalidInput(format!("config {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn training_budget(&self) -> Option<Duration> {
        self.training_budget_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(AnalyticsError::InvalidInput(msg.to_string()));

        if self.leave.horizon == 0 || self.compensation.horizon == 0 {
            return invalid("forecast horizon must be positive");
        }
        if !(self.leave.ridge_alpha.is_finite() && self.leave.ridge_alpha > 0.0) {
            return invalid("ridge_alpha must be a positive number");
        }
        if self.compensation.growth_window == 0 {
            return invalid("growth_window must be positive");
        }
        for forest in [&self.compensation.forest, &self.performance.forest] {
            if forest.n_trees == 0 || forest.max_depth == 0 || forest.min_samples_split < 2 {
                return invalid("forest needs n_trees > 0, max_depth > 0, min_samples_split >= 2");
            }
        }
        if !(self.anomaly.z_threshold.is_finite() && self.anomaly.z_threshold > 0.0) {
            return invalid("z_threshold must be a positive number");
        }
        if self.clustering.max_iterations == 0 || self.clustering.n_runs == 0 {
            return invalid("clustering needs max_iterations > 0 and n_runs > 0");
        }
        let w = &self.workload;
        if !(w.underutilized_utilization < w.bottleneck_utilization) {
            return invalid("underutilized_utilization must be below bottleneck_utilization");
        }
        if !(w.default_capacity > 0.0) {
            return invalid("default_capacity must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config = AnalyticsConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AnalyticsConfig::default());
        assert_eq!(config.anomaly.z_threshold, 2.0);
        assert_eq!(config.compensation.forest.n_trees, 50);
        assert_eq!(config.performance.forest.n_trees, 100);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config =
            AnalyticsConfig::from_json_str(r#"{"leave": {"horizon": 3}, "seed": 7}"#).unwrap();
        assert_eq!(config.leave.horizon, 3);
        assert_eq!(config.leave.seasonal_peak_ratio, 1.5);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn rejects_inverted_workload_thresholds() {
        let json = r#"{"workload": {"bottleneck_utilization": 0.4}}"#;
        let err = AnalyticsConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidInput(_)));
    }
}
