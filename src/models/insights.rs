//! Генератор инсайтов и рекомендаций по результатам моделей

use crate::config::{CompensationConfig, LeaveConfig};
use crate::preprocessing::Statistics;
use crate::types::{
    AnomalyRecord, FeatureImportance, Insight, InsightCategory, LeavePatterns, LeavePrediction,
    MarketPosition, Metric, PerformancePrediction, Priority, SalaryPrediction, Severity, TeamLoad,
    TrendDirection,
};

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Порог числа аномалий посещаемости для пересмотра политики
const ATTENDANCE_REVIEW_COUNT: usize = 3;

const TOP_DRIVERS: usize = 3;

pub struct InsightComposer;

impl InsightComposer {
    pub fn leave_insights(
        patterns: &LeavePatterns,
        predictions: &[LeavePrediction],
        config: &LeaveConfig,
    ) -> Vec<Insight> {
        let mut insights = Vec::new();

        // Сравниваются только месяцы с записями; месяц с 0 днями остаётся в сравнении
        let observed: Vec<(usize, f64)> = patterns
            .seasonal
            .iter()
            .copied()
            .enumerate()
            .filter(|(month, _)| patterns.observations.get(*month).map_or(false, |&n| n > 0))
            .collect();
        if observed.len() >= 2 {
            let peak = observed.iter().max_by(|a, b| a.1.total_cmp(&b.1));
            let low = observed.iter().min_by(|a, b| a.1.total_cmp(&b.1));
            if let (Some(&(month, peak_avg)), Some(&(_, low_avg))) = (peak, low) {
                if peak_avg > low_avg * config.seasonal_peak_ratio {
                    insights.push(Insight::new(
                        InsightCategory::Seasonal,
                        Priority::Medium,
                        format!(
                            "Peak leave season is {} with {:.1} average days",
                            MONTH_NAMES[month.min(11)],
                            peak_avg
                        ),
                        "Consider implementing seasonal leave policies or backup staffing",
                    ));
                }
            }
        }

        if patterns.trend.direction == TrendDirection::Increasing {
            insights.push(Insight::new(
                InsightCategory::Trend,
                Priority::Medium,
                "Leave usage is trending upward",
                "Review leave policies and employee satisfaction",
            ));
        }

        let predicted: Vec<f64> = predictions.iter().map(|p| p.predicted_leave_days).collect();
        let average = Statistics::mean(&predicted);
        if average > config.high_usage_days {
            insights.push(Insight::new(
                InsightCategory::Prediction,
                Priority::High,
                format!("High leave usage predicted ({:.1} days/month average)", average),
                "Plan for adequate coverage and consider wellness programs",
            ));
        }

        insights
    }

    pub fn salary_recommendations(
        predictions: &[SalaryPrediction],
        market: Option<&MarketPosition>,
        config: &CompensationConfig,
    ) -> Vec<Insight> {
        let mut recommendations = Vec::new();

        for prediction in predictions {
            if prediction.growth_rate < 0.0 {
                recommendations.push(Insight::new(
                    InsightCategory::SalaryDecrease,
                    Priority::High,
                    format!("Salary decrease predicted for period {}", prediction.period),
                    "Review performance and market conditions",
                ));
            } else if prediction.growth_rate > config.high_growth_rate {
                recommendations.push(Insight::new(
                    InsightCategory::SalaryIncrease,
                    Priority::Medium,
                    format!("High growth predicted ({:.1}%)", prediction.growth_rate),
                    "Plan for budget allocation",
                ));
            }
        }

        if market.map_or(false, |m| m.below_market) {
            recommendations.push(Insight::new(
                InsightCategory::MarketAdjustment,
                Priority::High,
                "Current salaries below market average",
                "Consider market adjustment program",
            ));
        }

        recommendations
    }

    pub fn anomaly_recommendations(anomalies: &[AnomalyRecord]) -> Vec<Insight> {
        let mut recommendations = Vec::new();

        let mut flagged: Vec<_> = anomalies
            .iter()
            .filter(|a| a.severity == Severity::High)
            .map(|a| a.employee_id)
            .collect();
        flagged.sort_unstable();
        flagged.dedup();
        if !flagged.is_empty() {
            recommendations.push(
                Insight::new(
                    InsightCategory::Investigation,
                    Priority::High,
                    format!("{} employees show high-severity anomalies", flagged.len()),
                    "Immediate investigation required",
                )
                .with_employees(flagged),
            );
        }

        let attendance = anomalies
            .iter()
            .filter(|a| a.metric == Metric::AttendanceRate)
            .count();
        if attendance > ATTENDANCE_REVIEW_COUNT {
            recommendations.push(Insight::new(
                InsightCategory::Attendance,
                Priority::Medium,
                format!("{} attendance anomalies detected", attendance),
                "Review attendance policies and employee engagement",
            ));
        }

        recommendations
    }

    pub fn performance_insights(
        high_potential: &[PerformancePrediction],
        importance: &[FeatureImportance],
    ) -> Vec<Insight> {
        let mut insights = Vec::new();

        if !high_potential.is_empty() {
            insights.push(
                Insight::new(
                    InsightCategory::TalentManagement,
                    Priority::High,
                    format!("{} high-potential employees identified", high_potential.len()),
                    "Develop succession planning and career paths",
                )
                .with_employees(high_potential.iter().map(|p| p.employee_id).collect()),
            );
        }

        let drivers: Vec<&str> = importance
            .iter()
            .filter(|f| f.importance > 0.0)
            .take(TOP_DRIVERS)
            .map(|f| f.feature.as_str())
            .collect();
        if !drivers.is_empty() {
            insights.push(Insight::new(
                InsightCategory::FeatureAnalysis,
                Priority::Medium,
                format!("Top performance drivers: {}", drivers.join(", ")),
                "Focus improvement efforts on these areas",
            ));
        }

        insights
    }

    pub fn workload_recommendations(bottlenecks: &[TeamLoad], underutilized: &[TeamLoad]) -> Vec<Insight> {
        let overload = bottlenecks.iter().map(|team| {
            Insight::new(
                InsightCategory::Overload,
                Priority::High,
                format!(
                    "Team {} is at {:.0}% of capacity",
                    team.team_name,
                    team.utilization * 100.0
                ),
                "Redistribute workload or increase capacity",
            )
        });

        let idle = underutilized.iter().map(|team| {
            Insight::new(
                InsightCategory::Underutilized,
                Priority::Medium,
                format!(
                    "Team {} is at {:.0}% of capacity",
                    team.team_name,
                    team.utilization * 100.0
                ),
                "Assign additional work or cross-train team members",
            )
        });

        overload.chain(idle).collect()
    }

    /// Сортировка по приоритету (high -> low), порядок внутри приоритета сохраняется
    pub fn rank(mut insights: Vec<Insight>) -> Vec<Insight> {
        insights.sort_by(|a, b| b.priority.cmp(&a.priority));
        insights
    }

    /// Объединение инсайтов нескольких операций в один ранжированный список
    pub fn compose<'a, I>(groups: I) -> Vec<Insight>
    where
        I: IntoIterator<Item = &'a [Insight]>,
    {
        let merged = groups
            .into_iter()
            .flat_map(|group| group.iter().cloned())
            .collect();
        Self::rank(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExpectedRange, TeamStatus, TrendStrength, TrendSummary};

    fn patterns(seasonal: Vec<f64>, direction: TrendDirection) -> LeavePatterns {
        let observations = seasonal.iter().map(|&avg| usize::from(avg > 0.0)).collect();
        LeavePatterns {
            seasonal,
            observations,
            trend: TrendSummary {
                direction,
                rate: 0.1,
                strength: TrendStrength::Weak,
            },
            correlation_leave_month: 0.0,
        }
    }

    fn forecast(days: f64) -> Vec<LeavePrediction> {
        (1..=6)
            .map(|i| LeavePrediction {
                period: i,
                month_of_year: i as u32,
                predicted_leave_days: days,
                confidence: 80.0,
            })
            .collect()
    }

    fn anomaly(id: i64, metric: Metric, severity: Severity) -> AnomalyRecord {
        AnomalyRecord {
            employee_id: id,
            employee_name: None,
            metric,
            value: 0.0,
            z_score: 3.5,
            expected_range: ExpectedRange { low: 0.0, high: 1.0 },
            severity,
            description: String::new(),
        }
    }

    #[test]
    fn seasonal_peak_ignores_months_without_data() {
        let mut seasonal = vec![0.0; 12];
        seasonal[6] = 9.0;
        seasonal[0] = 8.0;
        let insights = InsightComposer::leave_insights(
            &patterns(seasonal.clone(), TrendDirection::Stable),
            &forecast(2.0),
            &LeaveConfig::default(),
        );
        assert!(insights.is_empty());

        seasonal[0] = 3.0;
        let insights = InsightComposer::leave_insights(
            &patterns(seasonal, TrendDirection::Stable),
            &forecast(2.0),
            &LeaveConfig::default(),
        );
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].category, InsightCategory::Seasonal);
        assert!(insights[0].message.contains("July"));
    }

    #[test]
    fn observed_zero_month_counts_as_seasonal_low() {
        let mut seasonal = vec![2.0; 12];
        seasonal[0] = 0.0;
        seasonal[6] = 3.0;
        let mut leave = patterns(seasonal, TrendDirection::Stable);
        leave.observations = vec![1; 12];

        let insights =
            InsightComposer::leave_insights(&leave, &forecast(2.0), &LeaveConfig::default());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].category, InsightCategory::Seasonal);
        assert!(insights[0].message.contains("July"));
    }

    #[test]
    fn high_usage_and_upward_trend() {
        let insights = InsightComposer::leave_insights(
            &patterns(vec![0.0; 12], TrendDirection::Increasing),
            &forecast(16.0),
            &LeaveConfig::default(),
        );
        let categories: Vec<_> = insights.iter().map(|i| i.category).collect();
        assert_eq!(categories, vec![InsightCategory::Trend, InsightCategory::Prediction]);
        assert_eq!(insights[1].priority, Priority::High);
    }

    #[test]
    fn investigation_lists_each_employee_once() {
        let anomalies = vec![
            anomaly(3, Metric::LeaveDays, Severity::High),
            anomaly(3, Metric::OvertimeHours, Severity::High),
            anomaly(1, Metric::PerformanceScore, Severity::High),
            anomaly(2, Metric::LeaveDays, Severity::Medium),
        ];
        let recommendations = InsightComposer::anomaly_recommendations(&anomalies);
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].employees, vec![1, 3]);
    }

    #[test]
    fn attendance_review_after_more_than_three() {
        let anomalies: Vec<_> = (0..4)
            .map(|i| anomaly(i, Metric::AttendanceRate, Severity::Medium))
            .collect();
        let recommendations = InsightComposer::anomaly_recommendations(&anomalies);
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].category, InsightCategory::Attendance);

        let recommendations = InsightComposer::anomaly_recommendations(&anomalies[..3]);
        assert!(recommendations.is_empty());
    }

    #[test]
    fn workload_recommendations_per_team() {
        let team = |id: i64, utilization: f64, status: TeamStatus| TeamLoad {
            team_id: id,
            team_name: format!("T{}", id),
            current_workload: utilization * 100.0,
            capacity: 100.0,
            utilization,
            status,
        };
        let recommendations = InsightComposer::workload_recommendations(
            &[team(1, 0.95, TeamStatus::Bottleneck)],
            &[team(2, 0.3, TeamStatus::Underutilized), team(3, 0.2, TeamStatus::Underutilized)],
        );
        assert_eq!(recommendations.len(), 3);
        assert_eq!(recommendations[0].category, InsightCategory::Overload);
        assert_eq!(recommendations[0].message, "Team T1 is at 95% of capacity");
    }

    #[test]
    fn compose_ranks_by_priority_and_keeps_order() {
        let low = Insight::new(InsightCategory::Trend, Priority::Low, "a", "x");
        let high_first = Insight::new(InsightCategory::Overload, Priority::High, "b", "x");
        let medium = Insight::new(InsightCategory::Seasonal, Priority::Medium, "c", "x");
        let high_second = Insight::new(InsightCategory::Investigation, Priority::High, "d", "x");

        let first = vec![low, high_first];
        let second = vec![medium, high_second];
        let composed = InsightComposer::compose([first.as_slice(), second.as_slice()]);

        let messages: Vec<&str> = composed.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["b", "d", "c", "a"]);
    }
}
