//! Обнаружение аномалий в метриках сотрудников (z-score по каждой метрике)

use crate::config::{AnomalyConfig, ClusteringConfig};
use crate::error::{ensure_min_samples, AnalyticsError, Result};
use crate::models::clustering::EmployeeClusterer;
use crate::models::insights::InsightComposer;
use crate::preprocessing::Statistics;
use crate::types::{
    AnomalyRecord, AnomalyReport, Clustering, EmployeeMetrics, ExpectedRange, Metric, RiskLevel,
    Severity,
};

pub const MIN_EMPLOYEES: usize = 10;

/// Отклонение ниже этого считается нулевым
const MIN_STD: f64 = 1e-12;

pub struct AnomalyDetector {
    config: AnomalyConfig,
    clusterer: EmployeeClusterer,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig, clustering: ClusteringConfig, seed: u64) -> Self {
        Self {
            config,
            clusterer: EmployeeClusterer::new(clustering, seed),
        }
    }

    pub fn detect(&self, employees: &[EmployeeMetrics], threshold: Option<f64>) -> Result<AnomalyReport> {
        ensure_min_samples("anomaly detection", "records", MIN_EMPLOYEES, employees.len())?;

        let threshold = threshold.unwrap_or(self.config.z_threshold);
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(AnalyticsError::InvalidInput(format!(
                "z-score threshold must be a positive number, got {}",
                threshold
            )));
        }

        let mut anomalies = Vec::new();
        let mut skipped_metrics = Vec::new();

        for metric in Metric::ALL {
            match Self::scan_metric(employees, metric, threshold) {
                Ok(found) => anomalies.extend(found),
                Err(AnalyticsError::DegenerateComputation(reason)) => {
                    tracing::debug!("Skipping {}: {}", metric.label(), reason);
                    skipped_metrics.push(metric);
                }
                Err(e) => return Err(e),
            }
        }

        // Кластеризация вспомогательная: ошибка не прерывает сканирование
        let clusters = match self.clusterer.cluster(employees) {
            Ok(clusters) => clusters,
            Err(e) => {
                tracing::warn!("Clustering failed: {}", e);
                Clustering::default()
            }
        };

        let risk_assessment = RiskLevel::assess(&anomalies);
        let recommendations = InsightComposer::anomaly_recommendations(&anomalies);

        tracing::info!(
            "Scanned {} employees: {} anomalies, risk {:?}",
            employees.len(),
            anomalies.len(),
            risk_assessment
        );

        Ok(AnomalyReport {
            anomalies,
            skipped_metrics,
            clusters,
            risk_assessment,
            recommendations,
        })
    }

    /// Аномалии одной метрики. Пропуски не участвуют в статистике.
    /// Нулевая дисперсия или отсутствие значений дают DegenerateComputation.
    pub fn scan_metric(
        employees: &[EmployeeMetrics],
        metric: Metric,
        threshold: f64,
    ) -> Result<Vec<AnomalyRecord>> {
        let values: Vec<f64> = employees.iter().filter_map(|e| metric.value(e)).collect();
        if values.is_empty() {
            return Err(AnalyticsError::DegenerateComputation(format!(
                "no values for {}",
                metric.label()
            )));
        }

        let mean = Statistics::mean(&values);
        let std = Statistics::std_dev(&values);
        if std < MIN_STD {
            return Err(AnalyticsError::DegenerateComputation(format!(
                "zero variance in {}",
                metric.label()
            )));
        }

        let expected_range = ExpectedRange {
            low: mean - threshold * std,
            high: mean + threshold * std,
        };

        let anomalies = employees
            .iter()
            .filter_map(|employee| {
                let value = metric.value(employee)?;
                let z_score = (value - mean) / std;
                (z_score.abs() > threshold).then(|| AnomalyRecord {
                    employee_id: employee.employee_id,
                    employee_name: employee.employee_name.clone(),
                    metric,
                    value,
                    z_score,
                    expected_range,
                    severity: Severity::from_z_score(z_score),
                    description: Self::describe(metric, value, mean, z_score),
                })
            })
            .collect();

        Ok(anomalies)
    }

    fn describe(metric: Metric, value: f64, mean: f64, z_score: f64) -> String {
        let side = if z_score > 0.0 { "above" } else { "below" };
        format!(
            "{} of {:.2} is {:.1} standard deviations {} the population mean of {:.2}",
            capitalize(metric.label()),
            value,
            z_score.abs(),
            side,
            mean
        )
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyConfig::default(), ClusteringConfig::default(), 42)
    }
}
