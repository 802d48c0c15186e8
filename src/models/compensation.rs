//! Прогноз динамики зарплат и сравнение с рынком

use std::time::Duration;

use crate::config::CompensationConfig;
use crate::error::{ensure_min_samples, Result};
use crate::models::forest::RandomForest;
use crate::models::insights::InsightComposer;
use crate::models::regression::linear_trend;
use crate::preprocessing::{FeatureEngineer, Statistics};
use crate::types::{
    CompensationRecord, MarketDataPoint, MarketPosition, SalaryForecast, SalaryPrediction,
    SalaryRecommendation, SalaryTrend, TrendDirection,
};

pub const MIN_COMPENSATION_RECORDS: usize = 12;

pub struct CompensationForecaster {
    config: CompensationConfig,
    seed: u64,
    budget: Option<Duration>,
}

impl CompensationForecaster {
    pub fn new(config: CompensationConfig, seed: u64) -> Self {
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

    pub fn forecast(
        &self,
        records: &[CompensationRecord],
        market: Option<&[MarketDataPoint]>,
    ) -> Result<SalaryForecast> {
        ensure_min_samples("salary prediction", "months", MIN_COMPENSATION_RECORDS, records.len())?;

        let (features, targets) = FeatureEngineer::compensation_features(records);

        let mut forest = RandomForest::new(self.config.forest.clone(), self.seed).with_budget(self.budget);
        forest.fit(&features, &targets)?;
        tracing::info!(
            "Salary model trained on {} months with {} trees",
            records.len(),
            forest.n_trees()
        );

        let salaries: Vec<f64> = targets.to_vec();
        let performance: Vec<f64> = records.iter().map(|r| r.performance()).collect();
        let experience: Vec<f64> = records.iter().map(|r| r.experience()).collect();
        let avg_performance = Statistics::mean(&performance);
        let avg_experience = Statistics::mean(&experience);

        let window = self.config.growth_window.min(salaries.len());
        let recent_average = Statistics::mean(&salaries[salaries.len() - window..]);
        let recommendation = SalaryRecommendation::from_performance(avg_performance);

        let mut predictions = Vec::with_capacity(self.config.horizon);
        for step in 1..=self.config.horizon {
            let period = records.len() + step;
            let row = FeatureEngineer::compensation_row(period, avg_performance, avg_experience);
            let predicted = forest.predict_row(row.view())?;

            predictions.push(SalaryPrediction {
                period,
                predicted_salary: predicted.round(),
                growth_rate: Self::growth_rate(recent_average, predicted),
                recommendation,
            });
        }

        let current_trend = Self::current_trend(&salaries)?;
        let market_insights = market.map(|m| Self::market_position(&salaries, m));
        let recommendations =
            InsightComposer::salary_recommendations(&predictions, market_insights.as_ref(), &self.config);

        Ok(SalaryForecast {
            predictions,
            current_trend,
            market_insights,
            recommendations,
        })
    }

    /// Рост (%) прогноза относительно среднего за последние периоды
    pub fn growth_rate(recent_average: f64, predicted: f64) -> f64 {
        if recent_average > 0.0 {
            (predicted - recent_average) / recent_average * 100.0
        } else {
            0.0
        }
    }

    fn current_trend(salaries: &[f64]) -> Result<SalaryTrend> {
        let index: Vec<f64> = (1..=salaries.len()).map(|i| i as f64).collect();
        let (slope, _) = linear_trend(&index, salaries)?;
        let average = Statistics::mean(salaries);

        Ok(SalaryTrend {
            direction: TrendDirection::from_slope(slope),
            monthly_change: slope,
            percent_change: if average > 0.0 { slope / average * 100.0 } else { 0.0 },
        })
    }

    pub fn market_position(salaries: &[f64], market: &[MarketDataPoint]) -> MarketPosition {
        let average = Statistics::mean(salaries);
        let market_salaries: Vec<f64> = market.iter().map(|m| m.salary).filter(|s| s.is_finite()).collect();
        let percentile = Statistics::percentile_rank(average, &market_salaries);
        let below_market = percentile < 50.0;

        MarketPosition {
            percentile,
            below_market,
            recommendation: if below_market {
                "Below market - consider adjustment".to_string()
            } else {
                "Competitive position".to_string()
            },
            gap: if below_market {
                "Below market average".to_string()
            } else {
                "At or above market average".to_string()
            },
        }
    }
}
