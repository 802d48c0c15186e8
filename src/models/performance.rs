//! Прогноз производительности и поиск сотрудников с высоким потенциалом

use std::time::Duration;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::PerformanceConfig;
use crate::error::{ensure_min_samples, AnalyticsError, Result};
use crate::models::forest::RandomForest;
use crate::models::insights::InsightComposer;
use crate::preprocessing::{FeatureEngineer, Statistics};
use crate::types::{
    FeatureImportance, PerformancePrediction, PerformanceRecord, PerformanceReport, Potential,
};

pub const MIN_EMPLOYEES: usize = 20;

pub const DEFAULT_FEATURES: [&str; 6] = [
    "years_experience",
    "education_level",
    "training_hours",
    "previous_performance",
    "attendance_rate",
    "team_collaboration_score",
];

pub struct PerformancePredictor {
    config: PerformanceConfig,
    seed: u64,
    budget: Option<Duration>,
}

impl PerformancePredictor {
    pub fn new(config: PerformanceConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            budget: None,
        }
    }

    pub fn with_budget(mut self, budget: Option<Duration>) -> Self {
        self.budget = budget;
        self
    }

    pub fn predict(
        &self,
        records: &[PerformanceRecord],
        features: Option<&[String]>,
    ) -> Result<PerformanceReport> {
        ensure_min_samples("performance prediction", "employees", MIN_EMPLOYEES, records.len())?;

        let feature_names: Vec<String> = match features {
            Some(names) if names.is_empty() => {
                return Err(AnalyticsError::InvalidInput(
                    "feature list must not be empty".to_string(),
                ))
            }
            Some(names) => names.to_vec(),
            None => DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect(),
        };

        for name in &feature_names {
            if !records.iter().any(|r| r.has_feature(name)) {
                tracing::warn!("Feature '{}' is absent in every record, treated as 0", name);
            }
        }

        let (features, targets) = FeatureEngineer::performance_features(records, &feature_names);

        let mut forest = RandomForest::new(self.config.forest.clone(), self.seed).with_budget(self.budget);
        forest.fit(&features, &targets)?;

        let fitted = forest.predict(&features)?;
        let model_accuracy = Statistics::model_accuracy(&fitted.to_vec(), &targets.to_vec());
        tracing::info!(
            "Performance model trained on {} employees, {} features. Accuracy: {:.0}%",
            records.len(),
            feature_names.len(),
            model_accuracy
        );

        let feature_importance = self.permutation_importance(&forest, &features, &targets, &feature_names)?;

        let predictions: Vec<PerformancePrediction> = records
            .iter()
            .zip(fitted.iter())
            .map(|(record, &predicted)| {
                let current = record.current();
                PerformancePrediction {
                    employee_id: record.employee_id,
                    employee_name: record.employee_name.clone(),
                    current_performance: current,
                    predicted_performance: (predicted * 100.0).round() / 100.0,
                    potential: Potential::assess(current, predicted),
                    recommendations: Self::employee_recommendations(record, predicted),
                }
            })
            .collect();

        let high_potential: Vec<PerformancePrediction> = predictions
            .iter()
            .filter(|p| p.potential == Potential::High)
            .cloned()
            .collect();

        let insights = InsightComposer::performance_insights(&high_potential, &feature_importance);

        Ok(PerformanceReport {
            predictions,
            feature_importance,
            high_potential,
            model_accuracy,
            insights,
        })
    }

    /// Перестановочная важность: прирост MSE при перемешивании столбца признака,
    /// усреднённый по повторам и нормированный к сумме 1
    fn permutation_importance(
        &self,
        forest: &RandomForest,
        features: &Array2<f64>,
        targets: &Array1<f64>,
        names: &[String],
    ) -> Result<Vec<FeatureImportance>> {
        let target = targets.to_vec();
        let baseline = Statistics::mse(&forest.predict(features)?.to_vec(), &target);
        let repeats = self.config.permutation_repeats.max(1);
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(1));

        let mut increases = Vec::with_capacity(names.len());
        for j in 0..names.len() {
            let mut total = 0.0;
            for _ in 0..repeats {
                let mut column: Vec<f64> = features.column(j).to_vec();
                column.shuffle(&mut rng);

                let mut permuted = features.clone();
                permuted.column_mut(j).assign(&Array1::from(column));
                let mse = Statistics::mse(&forest.predict(&permuted)?.to_vec(), &target);
                total += mse - baseline;
            }
            increases.push((total / repeats as f64).max(0.0));
        }

        let sum: f64 = increases.iter().sum();
        let mut importance: Vec<FeatureImportance> = names
            .iter()
            .zip(increases)
            .map(|(name, increase)| FeatureImportance {
                feature: name.clone(),
                importance: if sum > 0.0 { increase / sum } else { 0.0 },
                rank: 0,
            })
            .collect();

        importance.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        for (i, item) in importance.iter_mut().enumerate() {
            item.rank = i + 1;
        }

        Ok(importance)
    }

    fn employee_recommendations(record: &PerformanceRecord, predicted: f64) -> Vec<String> {
        let mut recommendations = Vec::new();

        if predicted > record.current() * 1.15 {
            recommendations.push("High potential - consider leadership development".to_string());
        }
        if record.training_hours.map_or(false, |h| h < 20.0) {
            recommendations.push("Increase training hours to improve performance".to_string());
        }
        if record.attendance_rate.map_or(false, |a| a < 0.9) {
            recommendations.push("Address attendance issues to unlock potential".to_string());
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Текущая оценка определяется прошлой оценкой и обучением, стаж не влияет
    fn staff(n: usize) -> Vec<PerformanceRecord> {
        (0..n)
            .map(|i| {
                let previous = 0.3 + (i % 10) as f64 * 0.06;
                let training = (i % 7) as f64 * 8.0;
                PerformanceRecord {
                    employee_id: i as i64,
                    employee_name: Some(format!("Employee {}", i)),
                    current_performance: Some(previous * 0.8 + training / 400.0),
                    years_experience: Some(((i * 37) % 11) as f64),
                    education_level: Some(2.0),
                    training_hours: Some(training),
                    previous_performance: Some(previous),
                    attendance_rate: Some(0.95),
                    team_collaboration_score: Some(0.7),
                    ..Default::default()
                }
            })
            .collect()
    }

    fn predictor() -> PerformancePredictor {
        PerformancePredictor::new(PerformanceConfig::default(), 42)
    }

    #[test]
    fn nineteen_employees_are_insufficient() {
        let err = predictor().predict(&staff(19), None).unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientData { required: 20, .. }));
    }

    #[test]
    fn predicts_every_employee() {
        let report = predictor().predict(&staff(40), None).unwrap();
        assert_eq!(report.predictions.len(), 40);
        assert_eq!(report.feature_importance.len(), DEFAULT_FEATURES.len());
        assert!(report
            .high_potential
            .iter()
            .all(|p| p.potential == Potential::High));
    }

    #[test]
    fn importance_ranks_the_driving_feature_first() {
        let report = predictor().predict(&staff(60), None).unwrap();
        let importance = &report.feature_importance;

        assert_eq!(importance[0].feature, "previous_performance");
        assert_eq!(importance[0].rank, 1);
        let total: f64 = importance.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-9);

        let constant = importance.iter().find(|f| f.feature == "education_level").unwrap();
        assert_eq!(constant.importance, 0.0);
    }

    #[test]
    fn custom_feature_list_is_respected() {
        let features = vec!["training_hours".to_string()];
        let report = predictor().predict(&staff(25), Some(features.as_slice())).unwrap();
        assert_eq!(report.feature_importance.len(), 1);
        assert_eq!(report.feature_importance[0].feature, "training_hours");
    }

    #[test]
    fn empty_feature_list_is_invalid() {
        let err = predictor().predict(&staff(25), Some(&[][..])).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidInput(_)));
    }
}
