//! Прогноз использования отпусков (сезонность + тренд)

use ndarray::Array1;

use crate::config::LeaveConfig;
use crate::error::{ensure_min_samples, Result};
use crate::models::insights::InsightComposer;
use crate::models::regression::{linear_trend, PolynomialRegression};
use crate::preprocessing::{FeatureEngineer, LeavePoint, Statistics};
use crate::types::{
    EmployeeId, LeaveForecast, LeavePatterns, LeavePrediction, LeaveRecord, TrendDirection,
    TrendStrength, TrendSummary,
};

pub const MIN_LEAVE_RECORDS: usize = 6;

pub struct LeaveForecaster {
    config: LeaveConfig,
}

impl LeaveForecaster {
    pub fn new(config: LeaveConfig) -> Self {
        Self { config }
    }

    pub fn forecast(
        &self,
        records: &[LeaveRecord],
        employee_id: Option<EmployeeId>,
    ) -> Result<LeaveForecast> {
        let selected: Vec<&LeaveRecord> = records
            .iter()
            .filter(|r| employee_id.map_or(true, |id| r.employee_id == Some(id)))
            .collect();

        ensure_min_samples("leave prediction", "months", MIN_LEAVE_RECORDS, selected.len())?;

        let series = FeatureEngineer::leave_series(&selected);
        let (features, targets) = FeatureEngineer::leave_features(&series);

        let mut regression = PolynomialRegression::new(2, self.config.ridge_alpha);
        regression.fit(&features, &targets)?;

        let fitted = regression.predict(&features)?;
        let model_accuracy = Statistics::model_accuracy(&fitted.to_vec(), &targets.to_vec());
        tracing::info!(
            "Leave model trained on {} months. Accuracy: {:.0}%",
            series.len(),
            model_accuracy
        );

        let history: Vec<f64> = series.iter().map(|p| p.leave_days).collect();
        let confidence = Self::confidence(&history);

        // series не пуст после проверки минимума
        let last = series[series.len() - 1];
        let mut predictions = Vec::with_capacity(self.config.horizon);
        for step in 1..=self.config.horizon {
            let period = last.index + step;
            let month_of_year = (last.month_of_year - 1 + step as u32) % 12 + 1;
            let raw = regression.predict_row(Array1::from(vec![period as f64, month_of_year as f64]).view())?;

            predictions.push(LeavePrediction {
                period,
                month_of_year,
                predicted_leave_days: if raw.is_finite() { raw.max(0.0).round() } else { 0.0 },
                confidence,
            });
        }

        let patterns = self.analyze_patterns(&series)?;
        let insights = InsightComposer::leave_insights(&patterns, &predictions, &self.config);

        Ok(LeaveForecast {
            predictions,
            patterns,
            model_accuracy,
            insights,
        })
    }

    /// Уверенность (%) падает с ростом разброса истории, в пределах 10..95
    fn confidence(history: &[f64]) -> f64 {
        let spread = Statistics::std_dev(history);
        ((1.0 - spread / 100.0).clamp(0.1, 0.95) * 100.0).round()
    }

    pub fn analyze_patterns(&self, series: &[LeavePoint]) -> Result<LeavePatterns> {
        let index: Vec<f64> = series.iter().map(|p| p.index as f64).collect();
        let days: Vec<f64> = series.iter().map(|p| p.leave_days).collect();
        let months: Vec<f64> = series.iter().map(|p| p.month_of_year as f64).collect();

        let (slope, _) = linear_trend(&index, &days)?;
        let trend = TrendSummary {
            direction: TrendDirection::from_slope(slope),
            rate: slope.abs(),
            strength: if slope.abs() > self.config.strong_trend_slope {
                TrendStrength::Strong
            } else {
                TrendStrength::Weak
            },
        };

        Ok(LeavePatterns {
            seasonal: Self::seasonal_averages(series),
            observations: Self::seasonal_counts(series),
            trend,
            correlation_leave_month: Statistics::pearson(&days, &months),
        })
    }

    /// Средние дни по календарным месяцам
    pub fn seasonal_averages(series: &[LeavePoint]) -> Vec<f64> {
        let mut sums = [0.0_f64; 12];
        for point in series {
            sums[Self::month_slot(point)] += point.leave_days;
        }

        sums.iter()
            .zip(Self::seasonal_counts(series))
            .map(|(sum, count)| if count > 0 { sum / count as f64 } else { 0.0 })
            .collect()
    }

    /// Число наблюдений по календарным месяцам
    pub fn seasonal_counts(series: &[LeavePoint]) -> Vec<usize> {
        let mut counts = vec![0_usize; 12];
        for point in series {
            counts[Self::month_slot(point)] += 1;
        }
        counts
    }

    fn month_slot(point: &LeavePoint) -> usize {
        (point.month_of_year as usize).saturating_sub(1).min(11)
    }
}

impl Default for LeaveForecaster {
    fn default() -> Self {
        Self::new(LeaveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use chrono::NaiveDate;

    fn monthly(days: &[f64]) -> Vec<LeaveRecord> {
        days.iter()
            .enumerate()
            .map(|(i, &d)| LeaveRecord {
                employee_id: Some(if i % 2 == 0 { 1 } else { 2 }),
                date: NaiveDate::from_ymd_opt(2023 + (i / 12) as i32, (i % 12) as u32 + 1, 15).unwrap(),
                leave_days: d,
                leave_type: Some("annual".to_string()),
            })
            .collect()
    }

    #[test]
    fn six_records_are_enough() {
        let forecast = LeaveForecaster::default()
            .forecast(&monthly(&[2.0, 3.0, 1.0, 4.0, 2.0, 3.0]), None)
            .unwrap();
        assert_eq!(forecast.predictions.len(), 6);
        assert!(forecast.predictions.iter().all(|p| p.predicted_leave_days >= 0.0));
    }

    #[test]
    fn five_records_are_insufficient() {
        let err = LeaveForecaster::default()
            .forecast(&monthly(&[2.0, 3.0, 1.0, 4.0, 2.0]), None)
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientData { required: 6, actual: 5, .. }));
    }

    #[test]
    fn employee_filter_applies_before_minimum() {
        let records = monthly(&[1.0; 10]);
        let err = LeaveForecaster::default().forecast(&records, Some(1)).unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientData { actual: 5, .. }));
    }

    #[test]
    fn forecast_months_continue_the_calendar() {
        let forecast = LeaveForecaster::default()
            .forecast(&monthly(&[1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0]), None)
            .unwrap();
        let months: Vec<u32> = forecast.predictions.iter().map(|p| p.month_of_year).collect();
        assert_eq!(months, vec![11, 12, 1, 2, 3, 4]);
        assert_eq!(forecast.predictions[0].period, 11);
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(LeaveForecaster::confidence(&[1.0, 1.0, 1.0]), 95.0);
        assert_eq!(LeaveForecaster::confidence(&[0.0, 500.0, 0.0, 500.0]), 10.0);
    }

    #[test]
    fn rising_usage_reports_upward_trend() {
        let forecast = LeaveForecaster::default()
            .forecast(&monthly(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]), None)
            .unwrap();
        assert_eq!(forecast.patterns.trend.direction, TrendDirection::Increasing);
        assert_eq!(forecast.patterns.trend.strength, TrendStrength::Strong);
        assert!(forecast
            .insights
            .iter()
            .any(|i| i.category == crate::types::InsightCategory::Trend));
    }

    #[test]
    fn seasonal_averages_cover_twelve_months() {
        let series = vec![
            LeavePoint { index: 1, month_of_year: 1, leave_days: 2.0 },
            LeavePoint { index: 13, month_of_year: 1, leave_days: 4.0 },
            LeavePoint { index: 7, month_of_year: 7, leave_days: 9.0 },
        ];
        let seasonal = LeaveForecaster::seasonal_averages(&series);
        assert_eq!(seasonal.len(), 12);
        assert_eq!(seasonal[0], 3.0);
        assert_eq!(seasonal[6], 9.0);
        assert_eq!(seasonal[3], 0.0);

        let counts = LeaveForecaster::seasonal_counts(&series);
        assert_eq!((counts[0], counts[6], counts[3]), (2, 1, 0));
    }

    #[test]
    fn zero_day_month_is_an_observed_seasonal_low() {
        let days = [0.0, 2.0, 2.0, 2.0, 2.0, 2.0, 3.0, 2.0, 2.0, 2.0, 2.0, 2.0];
        let records: Vec<LeaveRecord> = days
            .iter()
            .enumerate()
            .map(|(i, &d)| LeaveRecord {
                employee_id: Some(1),
                date: NaiveDate::from_ymd_opt(2024, i as u32 + 1, 15).unwrap(),
                leave_days: d,
                leave_type: None,
            })
            .collect();

        let forecast = LeaveForecaster::default().forecast(&records, None).unwrap();
        assert_eq!(forecast.patterns.observations, vec![1; 12]);
        assert_eq!(forecast.patterns.seasonal[0], 0.0);

        let seasonal = forecast
            .insights
            .iter()
            .find(|i| i.category == crate::types::InsightCategory::Seasonal)
            .expect("seasonal peak insight");
        assert!(seasonal.message.contains("July"));
    }
}
