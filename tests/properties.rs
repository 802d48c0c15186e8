use chrono::NaiveDate;
use hr_analytics::config::{ClusteringConfig, WorkloadConfig};
use hr_analytics::error::AnalyticsError;
use hr_analytics::{
    AnomalyDetector, EmployeeClusterer, EmployeeMetrics, LeaveForecaster, Metric, RiskLevel,
    TeamStatus, WorkloadBalancer,
};
use proptest::prelude::*;

fn leave_records(days: &[f64]) -> Vec<hr_analytics::LeaveRecord> {
    days.iter()
        .enumerate()
        .map(|(i, &d)| hr_analytics::LeaveRecord {
            employee_id: Some(1),
            date: NaiveDate::from_ymd_opt(2020 + (i / 12) as i32, (i % 12) as u32 + 1, 10).unwrap(),
            leave_days: d,
            leave_type: None,
        })
        .collect()
}

proptest! {
    #[test]
    fn leave_forecast_has_six_non_negative_points(days in prop::collection::vec(0.0f64..30.0, 6..36)) {
        let forecast = LeaveForecaster::default().forecast(&leave_records(&days), None).unwrap();
        prop_assert_eq!(forecast.predictions.len(), 6);
        for prediction in &forecast.predictions {
            prop_assert!(prediction.predicted_leave_days >= 0.0);
            prop_assert_eq!(prediction.predicted_leave_days, prediction.predicted_leave_days.round());
            prop_assert!((10.0..=95.0).contains(&prediction.confidence));
        }
    }

    #[test]
    fn zero_variance_metric_never_yields_anomalies(
        value in -100.0f64..100.0,
        others in prop::collection::vec(0.0f64..50.0, 10..40),
    ) {
        let employees: Vec<EmployeeMetrics> = others
            .iter()
            .enumerate()
            .map(|(i, &leave)| EmployeeMetrics {
                employee_id: i as i64,
                leave_days: Some(leave),
                overtime_hours: Some(value),
                ..Default::default()
            })
            .collect();

        let result = AnomalyDetector::scan_metric(&employees, Metric::OvertimeHours, 2.0);
        prop_assert!(matches!(result, Err(AnalyticsError::DegenerateComputation(_))));
    }

    #[test]
    fn fewer_than_ten_employees_is_insufficient(n in 0usize..10) {
        let employees: Vec<EmployeeMetrics> = (0..n)
            .map(|i| EmployeeMetrics { employee_id: i as i64, ..Default::default() })
            .collect();
        let result = AnomalyDetector::default().detect(&employees, None);
        let is_insufficient = matches!(result, Err(AnalyticsError::InsufficientData { .. }));
        prop_assert!(is_insufficient);
    }

    #[test]
    fn risk_level_is_monotonic_in_high_severity(high in 0usize..20, medium in 0usize..20) {
        prop_assert!(RiskLevel::from_counts(high, medium) <= RiskLevel::from_counts(high + 1, medium));
    }

    #[test]
    fn clustering_partitions_every_employee(
        rows in prop::collection::vec((0.5f64..1.0, 0.0f64..1.0, 0.0f64..30.0), 3..40),
        seed in any::<u64>(),
    ) {
        let employees: Vec<EmployeeMetrics> = rows
            .iter()
            .enumerate()
            .map(|(i, &(attendance, performance, leave))| EmployeeMetrics {
                employee_id: i as i64,
                attendance_rate: Some(attendance),
                performance_score: Some(performance),
                leave_days: Some(leave),
                ..Default::default()
            })
            .collect();

        let clustering = EmployeeClusterer::new(ClusteringConfig::default(), seed)
            .cluster(&employees)
            .unwrap();
        prop_assert_eq!(clustering.assignments.len(), employees.len());
        prop_assert_eq!(clustering.summaries.len(), 3);
        prop_assert!(clustering.assignments.iter().all(|a| a.cluster < 3));

        let total: usize = clustering.summaries.iter().map(|s| s.size).sum();
        prop_assert_eq!(total, employees.len());
        for summary in &clustering.summaries {
            let members = clustering.assignments.iter().filter(|a| a.cluster == summary.cluster).count();
            prop_assert_eq!(members, summary.size);
        }
    }

    #[test]
    fn workload_status_follows_thresholds(utilization in 0.0f64..2.0) {
        let balancer = WorkloadBalancer::new(WorkloadConfig::default());
        let expected = if utilization > 0.9 {
            TeamStatus::Bottleneck
        } else if utilization < 0.5 {
            TeamStatus::Underutilized
        } else {
            TeamStatus::Balanced
        };
        prop_assert_eq!(balancer.classify(utilization), expected);
    }
}

#[test]
fn workload_reference_points() {
    let balancer = WorkloadBalancer::default();
    assert_eq!(balancer.classify(95.0 / 100.0), TeamStatus::Bottleneck);
    assert_eq!(balancer.classify(45.0 / 100.0), TeamStatus::Underutilized);
    assert_eq!(balancer.classify(70.0 / 100.0), TeamStatus::Balanced);
}
