/// Аналитические модели

pub mod regression;
pub mod forest;
pub mod leave_forecasting;
pub mod compensation;
pub mod anomaly_detection;
pub mod clustering;
pub mod performance;
pub mod workload;
pub mod insights;

pub use leave_forecasting::LeaveForecaster;
pub use compensation::CompensationForecaster;
pub use anomaly_detection::AnomalyDetector;
pub use clustering::EmployeeClusterer;
pub use performance::PerformancePredictor;
pub use workload::WorkloadBalancer;
pub use insights::InsightComposer;
