//! Единая точка входа: пять аналитических операций.
//! Ни одна операция не паникует наружу, ошибка возвращается как значение.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cache::ResultCache;
use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, ErrorKind, Result};
use crate::models::{
    AnomalyDetector, CompensationForecaster, InsightComposer, LeaveForecaster,
    PerformancePredictor, WorkloadBalancer,
};
use crate::types::{
    AnomalyReport, CompensationRecord, EmployeeId, EmployeeMetrics, Insight, LeaveForecast,
    LeaveRecord, MarketDataPoint, PerformanceRecord, PerformanceReport, SalaryForecast, Team,
    WorkloadAssignment, WorkloadReport,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: String,
    pub kind: ErrorKind,
}

impl From<&AnalyticsError> for ErrorReport {
    fn from(e: &AnalyticsError) -> Self {
        Self {
            error: e.to_string(),
            kind: e.kind(),
        }
    }
}

/// Результат операции: объект результата или `{ "error": ..., "kind": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Failure(ErrorReport),
    Success(T),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ErrorReport> {
        match self {
            Outcome::Failure(report) => Some(report),
            Outcome::Success(_) => None,
        }
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(e) => Outcome::Failure(ErrorReport::from(&e)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    LeavePatterns,
    SalaryTrends,
    Anomalies,
    Performance,
    Workload,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::LeavePatterns => "leave_patterns",
            Operation::SalaryTrends => "salary_trends",
            Operation::Anomalies => "anomalies",
            Operation::Performance => "performance",
            Operation::Workload => "workload",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum AnalyticsRequest {
    LeavePatterns {
        records: Vec<LeaveRecord>,
        #[serde(default)]
        employee_id: Option<EmployeeId>,
    },
    SalaryTrends {
        records: Vec<CompensationRecord>,
        #[serde(default)]
        market_data: Option<Vec<MarketDataPoint>>,
    },
    Anomalies {
        employees: Vec<EmployeeMetrics>,
        #[serde(default)]
        threshold: Option<f64>,
    },
    Performance {
        employees: Vec<PerformanceRecord>,
        #[serde(default)]
        features: Option<Vec<String>>,
    },
    Workload {
        teams: Vec<Team>,
        workloads: Vec<WorkloadAssignment>,
    },
}

impl AnalyticsRequest {
    pub fn operation(&self) -> Operation {
        match self {
            AnalyticsRequest::LeavePatterns { .. } => Operation::LeavePatterns,
            AnalyticsRequest::SalaryTrends { .. } => Operation::SalaryTrends,
            AnalyticsRequest::Anomalies { .. } => Operation::Anomalies,
            AnalyticsRequest::Performance { .. } => Operation::Performance,
            AnalyticsRequest::Workload { .. } => Operation::Workload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", content = "result", rename_all = "snake_case")]
pub enum AnalyticsResponse {
    LeavePatterns(Outcome<LeaveForecast>),
    SalaryTrends(Outcome<SalaryForecast>),
    Anomalies(Outcome<AnomalyReport>),
    Performance(Outcome<PerformanceReport>),
    Workload(Outcome<WorkloadReport>),
}

impl AnalyticsResponse {
    pub fn failed(operation: Operation, error: &AnalyticsError) -> Self {
        let report = ErrorReport::from(error);
        match operation {
            Operation::LeavePatterns => Self::LeavePatterns(Outcome::Failure(report)),
            Operation::SalaryTrends => Self::SalaryTrends(Outcome::Failure(report)),
            Operation::Anomalies => Self::Anomalies(Outcome::Failure(report)),
            Operation::Performance => Self::Performance(Outcome::Failure(report)),
            Operation::Workload => Self::Workload(Outcome::Failure(report)),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::LeavePatterns(_) => Operation::LeavePatterns,
            Self::SalaryTrends(_) => Operation::SalaryTrends,
            Self::Anomalies(_) => Operation::Anomalies,
            Self::Performance(_) => Operation::Performance,
            Self::Workload(_) => Operation::Workload,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }

    pub fn failure(&self) -> Option<&ErrorReport> {
        match self {
            Self::LeavePatterns(o) => o.failure(),
            Self::SalaryTrends(o) => o.failure(),
            Self::Anomalies(o) => o.failure(),
            Self::Performance(o) => o.failure(),
            Self::Workload(o) => o.failure(),
        }
    }

    /// Инсайты успешного результата, пусто для ошибки
    pub fn insights(&self) -> &[Insight] {
        match self {
            Self::LeavePatterns(o) => o.success().map(|r| r.insights.as_slice()).unwrap_or(&[]),
            Self::SalaryTrends(o) => o.success().map(|r| r.recommendations.as_slice()).unwrap_or(&[]),
            Self::Anomalies(o) => o.success().map(|r| r.recommendations.as_slice()).unwrap_or(&[]),
            Self::Performance(o) => o.success().map(|r| r.insights.as_slice()).unwrap_or(&[]),
            Self::Workload(o) => o.success().map(|r| r.recommendations.as_slice()).unwrap_or(&[]),
        }
    }
}

pub struct AnalyticsFacade {
    config: AnalyticsConfig,
    cache: Option<Arc<ResultCache>>,
}

impl AnalyticsFacade {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            config,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn predict_leave_patterns(
        &self,
        records: &[LeaveRecord],
        employee_id: Option<EmployeeId>,
    ) -> Outcome<LeaveForecast> {
        self.execute(Operation::LeavePatterns, &(records, employee_id), || {
            LeaveForecaster::new(self.config.leave.clone()).forecast(records, employee_id)
        })
    }

    pub fn predict_salary_trends(
        &self,
        records: &[CompensationRecord],
        market_data: Option<&[MarketDataPoint]>,
    ) -> Outcome<SalaryForecast> {
        self.execute(Operation::SalaryTrends, &(records, market_data), || {
            CompensationForecaster::new(self.config.compensation.clone(), self.config.seed)
                .with_budget(self.config.training_budget())
                .forecast(records, market_data)
        })
    }

    pub fn detect_anomalies(
        &self,
        employees: &[EmployeeMetrics],
        threshold: Option<f64>,
    ) -> Outcome<AnomalyReport> {
        self.execute(Operation::Anomalies, &(employees, threshold), || {
            AnomalyDetector::new(
                self.config.anomaly.clone(),
                self.config.clustering.clone(),
                self.config.seed,
            )
            .detect(employees, threshold)
        })
    }

    pub fn predict_performance(
        &self,
        employees: &[PerformanceRecord],
        features: Option<&[String]>,
    ) -> Outcome<PerformanceReport> {
        self.execute(Operation::Performance, &(employees, features), || {
            PerformancePredictor::new(self.config.performance.clone(), self.config.seed)
                .with_budget(self.config.training_budget())
                .predict(employees, features)
        })
    }

    pub fn optimize_workload(
        &self,
        teams: &[Team],
        workloads: &[WorkloadAssignment],
    ) -> Outcome<WorkloadReport> {
        self.execute(Operation::Workload, &(teams, workloads), || {
            WorkloadBalancer::new(self.config.workload.clone()).optimize(teams, workloads)
        })
    }

    pub fn run(&self, request: &AnalyticsRequest) -> AnalyticsResponse {
        match request {
            AnalyticsRequest::LeavePatterns { records, employee_id } => {
                AnalyticsResponse::LeavePatterns(self.predict_leave_patterns(records, *employee_id))
            }
            AnalyticsRequest::SalaryTrends { records, market_data } => AnalyticsResponse::SalaryTrends(
                self.predict_salary_trends(records, market_data.as_deref()),
            ),
            AnalyticsRequest::Anomalies { employees, threshold } => {
                AnalyticsResponse::Anomalies(self.detect_anomalies(employees, *threshold))
            }
            AnalyticsRequest::Performance { employees, features } => AnalyticsResponse::Performance(
                self.predict_performance(employees, features.as_deref()),
            ),
            AnalyticsRequest::Workload { teams, workloads } => {
                AnalyticsResponse::Workload(self.optimize_workload(teams, workloads))
            }
        }
    }

    /// Независимые запросы выполняются параллельно в пуле блокирующих задач.
    /// Порядок ответов совпадает с порядком запросов.
    pub async fn run_batch(self: Arc<Self>, requests: Vec<AnalyticsRequest>) -> Vec<AnalyticsResponse> {
        let handles: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let operation = request.operation();
                let facade = Arc::clone(&self);
                let handle = tokio::task::spawn_blocking(move || facade.run(&request));
                (operation, handle)
            })
            .collect();

        let mut responses = Vec::with_capacity(handles.len());
        for (operation, handle) in handles {
            let response = match handle.await {
                Ok(response) => response,
                Err(e) => {
                    let error = AnalyticsError::DegenerateComputation(format!("task failed: {}", e));
                    tracing::error!("{} {}", operation.as_str(), error);
                    AnalyticsResponse::failed(operation, &error)
                }
            };
            responses.push(response);
        }
        responses
    }

    pub fn compose_insights(responses: &[AnalyticsResponse]) -> Vec<Insight> {
        InsightComposer::compose(responses.iter().map(|r| r.insights()))
    }

    fn execute<I, T, F>(&self, operation: Operation, input: &I, compute: F) -> Outcome<T>
    where
        I: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        let key = self
            .cache
            .as_ref()
            .and_then(|_| ResultCache::fingerprint(operation.as_str(), input, &self.config));

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            if let Some(hit) = cache.get::<T>(key) {
                tracing::debug!("{}: cache hit", operation.as_str());
                return Outcome::Success(hit);
            }
        }

        let result = panic::catch_unwind(AssertUnwindSafe(compute)).unwrap_or_else(|payload| {
            Err(AnalyticsError::DegenerateComputation(format!(
                "internal failure: {}",
                panic_message(payload.as_ref())
            )))
        });

        match result {
            Ok(value) => {
                if let (Some(cache), Some(key)) = (&self.cache, key) {
                    cache.insert(key, &value);
                }
                Outcome::Success(value)
            }
            Err(e) => {
                match e.kind() {
                    ErrorKind::InsufficientData => tracing::info!("{}: {}", operation.as_str(), e),
                    ErrorKind::InvalidInput => tracing::warn!("{}: {}", operation.as_str(), e),
                    ErrorKind::DegenerateComputation => tracing::error!("{}: {}", operation.as_str(), e),
                }
                Outcome::Failure(ErrorReport::from(&e))
            }
        }
    }
}

impl Default for AnalyticsFacade {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_is_returned_as_value() {
        let outcome = AnalyticsFacade::default().predict_leave_patterns(&[], None);
        let report = outcome.failure().unwrap();
        assert_eq!(report.kind, ErrorKind::InsufficientData);

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "insufficient_data");
        assert!(json["error"].as_str().unwrap().contains("minimum 6 months"));
    }

    #[test]
    fn panic_inside_operation_becomes_degenerate_computation() {
        let facade = AnalyticsFacade::default();
        let outcome: Outcome<u32> = facade.execute(Operation::Workload, &0, || panic!("boom"));
        let report = outcome.failure().unwrap();
        assert_eq!(report.kind, ErrorKind::DegenerateComputation);
        assert!(report.error.contains("boom"));
    }

    #[test]
    fn request_is_tagged_by_operation() {
        let request: AnalyticsRequest = serde_json::from_value(serde_json::json!({
            "operation": "workload",
            "teams": [{"id": 1, "name": "Ops"}],
            "workloads": [{"team_id": 1, "workload": 95.0}]
        }))
        .unwrap();
        assert_eq!(request.operation(), Operation::Workload);

        let response = AnalyticsFacade::default().run(&request);
        assert!(response.is_success());
        assert_eq!(response.insights().len(), 1);
    }

    #[test]
    fn failed_response_keeps_operation() {
        let error = AnalyticsError::InvalidInput("bad".to_string());
        let response = AnalyticsResponse::failed(Operation::Performance, &error);
        assert_eq!(response.operation(), Operation::Performance);
        assert!(response.insights().is_empty());
        assert_eq!(response.failure().unwrap().kind, ErrorKind::InvalidInput);
    }
}
