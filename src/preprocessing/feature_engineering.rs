//! Feature engineering для аналитических моделей

use chrono::Datelike;
use ndarray::{Array1, Array2};

use crate::preprocessing::Statistics;
use crate::types::{CompensationRecord, EmployeeMetrics, LeaveRecord, Metric, PerformanceRecord};

/// Точка временного ряда отпусков
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeavePoint {
    /// Порядковый номер месяца, с 1
    pub index: usize,
    pub month_of_year: u32,
    pub leave_days: f64,
}

pub struct FeatureEngineer;

impl FeatureEngineer {
    /// Ряд отпусков по датам: (порядковый индекс, месяц года, дни)
    pub fn leave_series(records: &[&LeaveRecord]) -> Vec<LeavePoint> {
        let mut sorted: Vec<&LeaveRecord> = records.to_vec();
        sorted.sort_by_key(|r| r.date);

        sorted
            .iter()
            .enumerate()
            .map(|(i, record)| LeavePoint {
                index: i + 1,
                month_of_year: record.date.month(),
                leave_days: if record.leave_days.is_finite() {
                    record.leave_days.max(0.0)
                } else {
                    0.0
                },
            })
            .collect()
    }

    /// Признаки (индекс, месяц года) и целевая переменная (дни отпуска)
    pub fn leave_features(series: &[LeavePoint]) -> (Array2<f64>, Array1<f64>) {
        let mut features = Array2::zeros((series.len(), 2));
        let mut targets = Array1::zeros(series.len());

        for (i, point) in series.iter().enumerate() {
            features[[i, 0]] = point.index as f64;
            features[[i, 1]] = point.month_of_year as f64;
            targets[i] = point.leave_days;
        }

        (features, targets)
    }

    /// Признаки зарплаты: [индекс, оценка, стаж, индекс * оценка]
    pub fn compensation_features(records: &[CompensationRecord]) -> (Array2<f64>, Array1<f64>) {
        let mut features = Array2::zeros((records.len(), 4));
        let mut targets = Array1::zeros(records.len());

        for (i, record) in records.iter().enumerate() {
            let row = Self::compensation_row(i + 1, record.performance(), record.experience());
            features.row_mut(i).assign(&row);
            targets[i] = record.total_salary;
        }

        (features, targets)
    }

    /// Строка признаков зарплаты; взаимодействие пересчитывается для каждого периода
    pub fn compensation_row(index: usize, performance: f64, experience: f64) -> Array1<f64> {
        let index = index as f64;
        Array1::from(vec![index, performance, experience, index * performance])
    }

    /// Признаки кластеризации: [посещаемость, оценка, дни отпуска].
    /// Пропуски заполняются средним по популяции.
    pub fn cluster_features(employees: &[EmployeeMetrics]) -> Array2<f64> {
        const METRICS: [Metric; 3] = [Metric::AttendanceRate, Metric::PerformanceScore, Metric::LeaveDays];

        let fill: Vec<f64> = METRICS
            .iter()
            .map(|metric| {
                let present: Vec<f64> = employees.iter().filter_map(|e| metric.value(e)).collect();
                Statistics::mean(&present)
            })
            .collect();

        let mut features = Array2::zeros((employees.len(), METRICS.len()));
        for (i, employee) in employees.iter().enumerate() {
            for (j, metric) in METRICS.iter().enumerate() {
                features[[i, j]] = metric.value(employee).unwrap_or(fill[j]);
            }
        }

        features
    }

    /// Признаки производительности по выбранному списку; цель = текущая оценка
    pub fn performance_features(
        records: &[PerformanceRecord],
        feature_names: &[String],
    ) -> (Array2<f64>, Array1<f64>) {
        let mut features = Array2::zeros((records.len(), feature_names.len()));
        let mut targets = Array1::zeros(records.len());

        for (i, record) in records.iter().enumerate() {
            for (j, name) in feature_names.iter().enumerate() {
                features[[i, j]] = record.feature(name);
            }
            targets[i] = record.current();
        }

        (features, targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn leave(date: (i32, u32), days: f64) -> LeaveRecord {
        LeaveRecord {
            employee_id: Some(1),
            date: NaiveDate::from_ymd_opt(date.0, date.1, 1).unwrap(),
            leave_days: days,
            leave_type: None,
        }
    }

    #[test]
    fn leave_series_is_ordered_by_date() {
        let records = vec![leave((2024, 3), 3.0), leave((2024, 1), 1.0), leave((2024, 2), -2.0)];
        let refs: Vec<&LeaveRecord> = records.iter().collect();
        let series = FeatureEngineer::leave_series(&refs);

        let months: Vec<u32> = series.iter().map(|p| p.month_of_year).collect();
        assert_eq!(months, vec![1, 2, 3]);
        assert_eq!(series[1].leave_days, 0.0);
        assert_eq!(series[2].index, 3);
    }

    #[test]
    fn compensation_row_has_interaction_term() {
        let row = FeatureEngineer::compensation_row(4, 0.5, 3.0);
        assert_eq!(row.to_vec(), vec![4.0, 0.5, 3.0, 2.0]);
    }

    #[test]
    fn cluster_features_impute_missing_with_mean() {
        let employees = vec![
            EmployeeMetrics {
                employee_id: 1,
                attendance_rate: Some(0.8),
                performance_score: Some(0.6),
                leave_days: Some(4.0),
                ..Default::default()
            },
            EmployeeMetrics {
                employee_id: 2,
                attendance_rate: Some(1.0),
                performance_score: None,
                leave_days: Some(6.0),
                ..Default::default()
            },
        ];
        let features = FeatureEngineer::cluster_features(&employees);
        assert_eq!(features[[1, 1]], 0.6);
        assert_eq!(features[[0, 2]], 4.0);
    }
}
