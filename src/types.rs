/// Типы данных аналитического модуля

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::default_capacity;

pub type EmployeeId = i64;

// ============================================================================
// Входные записи
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRecord {
    #[serde(default)]
    pub employee_id: Option<EmployeeId>,
    pub date: NaiveDate,
    #[serde(default)]
    pub leave_days: f64,
    #[serde(default)]
    pub leave_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationRecord {
    #[serde(default)]
    pub employee_id: Option<EmployeeId>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub basic_salary: f64,
    #[serde(default)]
    pub total_salary: f64,
    /// 0..1, по умолчанию 0.5
    #[serde(default)]
    pub performance_score: Option<f64>,
    /// По умолчанию 1 год
    #[serde(default)]
    pub years_experience: Option<f64>,
}

impl CompensationRecord {
    pub fn performance(&self) -> f64 {
        self.performance_score.filter(|v| *v != 0.0).unwrap_or(0.5)
    }

    pub fn experience(&self) -> f64 {
        self.years_experience.filter(|v| *v != 0.0).unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataPoint {
    pub salary: f64,
    #[serde(default)]
    pub source: Option<String>,
}

/// Метрики сотрудника для поиска аномалий и кластеризации.
/// Отсутствующее значение пропускается, а не считается нулём.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeMetrics {
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub attendance_rate: Option<f64>,
    #[serde(default)]
    pub performance_score: Option<f64>,
    #[serde(default)]
    pub leave_days: Option<f64>,
    #[serde(default)]
    pub overtime_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub current_performance: Option<f64>,
    #[serde(default)]
    pub years_experience: Option<f64>,
    #[serde(default)]
    pub education_level: Option<f64>,
    #[serde(default)]
    pub training_hours: Option<f64>,
    #[serde(default)]
    pub previous_performance: Option<f64>,
    #[serde(default)]
    pub attendance_rate: Option<f64>,
    #[serde(default)]
    pub team_collaboration_score: Option<f64>,
    /// Произвольные числовые признаки для пользовательского набора
    #[serde(default, flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl PerformanceRecord {
    pub fn current(&self) -> f64 {
        self.current_performance.unwrap_or(0.0)
    }

    /// Значение признака по имени; неизвестный или пустой признак = 0
    pub fn feature(&self, name: &str) -> f64 {
        let known = match name {
            "years_experience" => self.years_experience,
            "education_level" => self.education_level,
            "training_hours" => self.training_hours,
            "previous_performance" => self.previous_performance,
            "attendance_rate" => self.attendance_rate,
            "team_collaboration_score" => self.team_collaboration_score,
            "current_performance" => self.current_performance,
            _ => self.extra.get(name).and_then(|v| v.as_f64()),
        };
        known.unwrap_or(0.0)
    }

    pub fn has_feature(&self, name: &str) -> bool {
        match name {
            "years_experience" => self.years_experience.is_some(),
            "education_level" => self.education_level.is_some(),
            "training_hours" => self.training_hours.is_some(),
            "previous_performance" => self.previous_performance.is_some(),
            "attendance_rate" => self.attendance_rate.is_some(),
            "team_collaboration_score" => self.team_collaboration_score.is_some(),
            "current_performance" => self.current_performance.is_some(),
            _ => self.extra.get(name).map_or(false, |v| v.is_number()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_capacity")]
    pub capacity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadAssignment {
    pub team_id: i64,
    #[serde(default)]
    pub workload: f64,
    #[serde(default)]
    pub task: Option<String>,
}

// ============================================================================
// Общие перечисления
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.0 {
            Self::Increasing
        } else if slope < 0.0 {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStrength {
    Strong,
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

// ============================================================================
// Отпуска
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeavePrediction {
    /// Порядковый номер периода (продолжает историю)
    pub period: usize,
    pub month_of_year: u32,
    pub predicted_leave_days: f64,
    /// Уверенность в процентах, 10..95
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSummary {
    pub direction: TrendDirection,
    pub rate: f64,
    pub strength: TrendStrength,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeavePatterns {
    /// Средние дни отпуска по месяцам (январь..декабрь), 0 для месяцев без данных
    pub seasonal: Vec<f64>,
    /// Число записей по месяцам; месяц с 0 записей не участвует в сравнении сезонов
    #[serde(default)]
    pub observations: Vec<usize>,
    pub trend: TrendSummary,
    pub correlation_leave_month: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveForecast {
    pub predictions: Vec<LeavePrediction>,
    pub patterns: LeavePatterns,
    pub model_accuracy: f64,
    pub insights: Vec<Insight>,
}

// ============================================================================
// Зарплаты
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryRecommendation {
    AboveMarketIncrease,
    StandardAdjustment,
    PerformanceImprovementFirst,
}

impl SalaryRecommendation {
    pub fn from_performance(performance: f64) -> Self {
        if performance > 0.8 {
            Self::AboveMarketIncrease
        } else if performance > 0.6 {
            Self::StandardAdjustment
        } else {
            Self::PerformanceImprovementFirst
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::AboveMarketIncrease => "High performer - consider above-market increase",
            Self::StandardAdjustment => "Good performer - standard market adjustment",
            Self::PerformanceImprovementFirst => {
                "Performance improvement needed before salary increase"
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryPrediction {
    pub period: usize,
    pub predicted_salary: f64,
    /// Рост относительно среднего за последние периоды, %
    pub growth_rate: f64,
    pub recommendation: SalaryRecommendation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryTrend {
    pub direction: TrendDirection,
    pub monthly_change: f64,
    pub percent_change: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketPosition {
    /// Перцентиль текущей средней зарплаты на рынке, 0..100
    pub percentile: f64,
    pub below_market: bool,
    pub recommendation: String,
    pub gap: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryForecast {
    pub predictions: Vec<SalaryPrediction>,
    pub current_trend: SalaryTrend,
    pub market_insights: Option<MarketPosition>,
    pub recommendations: Vec<Insight>,
}

// ============================================================================
// Аномалии и кластеры
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AttendanceRate,
    PerformanceScore,
    LeaveDays,
    OvertimeHours,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::AttendanceRate,
        Metric::PerformanceScore,
        Metric::LeaveDays,
        Metric::OvertimeHours,
    ];

    pub fn value(&self, employee: &EmployeeMetrics) -> Option<f64> {
        match self {
            Metric::AttendanceRate => employee.attendance_rate,
            Metric::PerformanceScore => employee.performance_score,
            Metric::LeaveDays => employee.leave_days,
            Metric::OvertimeHours => employee.overtime_hours,
        }
        .filter(|v| v.is_finite())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::AttendanceRate => "attendance rate",
            Metric::PerformanceScore => "performance score",
            Metric::LeaveDays => "leave days",
            Metric::OvertimeHours => "overtime hours",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn from_z_score(z: f64) -> Self {
        let z = z.abs();
        if z > 3.0 {
            Self::High
        } else if z > 2.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedRange {
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub employee_id: EmployeeId,
    pub employee_name: Option<String>,
    pub metric: Metric,
    pub value: f64,
    pub z_score: f64,
    pub expected_range: ExpectedRange,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_counts(high: usize, medium: usize) -> Self {
        if high > 5 {
            Self::Critical
        } else if high > 2 || medium > 10 {
            Self::High
        } else if high > 0 || medium > 5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn assess(anomalies: &[AnomalyRecord]) -> Self {
        let high = anomalies.iter().filter(|a| a.severity == Severity::High).count();
        let medium = anomalies.iter().filter(|a| a.severity == Severity::Medium).count();
        Self::from_counts(high, medium)
    }
}

/// Метка кластера, выводится из ранга центроида по производительности
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterLabel {
    HighPerformer,
    AveragePerformer,
    LowPerformer,
}

impl ClusterLabel {
    pub fn from_rank(rank: usize) -> Self {
        match rank {
            0 => Self::HighPerformer,
            1 => Self::AveragePerformer,
            _ => Self::LowPerformer,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::HighPerformer => "High performer, low absenteeism",
            Self::AveragePerformer => "Average performer, moderate attendance",
            Self::LowPerformer => "Low performer, high absenteeism",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub employee_id: EmployeeId,
    /// 0 = лучший кластер по производительности
    pub cluster: usize,
    pub label: ClusterLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterCentroid {
    pub attendance_rate: f64,
    pub performance_score: f64,
    pub leave_days: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster: usize,
    pub label: ClusterLabel,
    pub size: usize,
    pub centroid: Option<ClusterCentroid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Clustering {
    pub assignments: Vec<ClusterAssignment>,
    pub summaries: Vec<ClusterSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub anomalies: Vec<AnomalyRecord>,
    /// Метрики с нулевой дисперсией, пропущенные при сканировании
    pub skipped_metrics: Vec<Metric>,
    pub clusters: Clustering,
    pub risk_assessment: RiskLevel,
    pub recommendations: Vec<Insight>,
}

// ============================================================================
// Производительность
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Potential {
    High,
    Medium,
    Low,
}

impl Potential {
    pub fn assess(current: f64, predicted: f64) -> Self {
        // При нулевой текущей оценке любой положительный прогноз считается ростом
        if current <= 0.0 {
            return if predicted > 0.0 { Self::High } else { Self::Low };
        }
        let improvement = (predicted - current) / current * 100.0;
        if improvement > 20.0 {
            Self::High
        } else if improvement > 10.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformancePrediction {
    pub employee_id: EmployeeId,
    pub employee_name: Option<String>,
    pub current_performance: f64,
    pub predicted_performance: f64,
    pub potential: Potential,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    /// Доля прироста ошибки при перестановке признака, сумма = 1
    pub importance: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub predictions: Vec<PerformancePrediction>,
    pub feature_importance: Vec<FeatureImportance>,
    pub high_potential: Vec<PerformancePrediction>,
    pub model_accuracy: f64,
    pub insights: Vec<Insight>,
}

// ============================================================================
// Нагрузка команд
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    Bottleneck,
    Underutilized,
    Balanced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamLoad {
    pub team_id: i64,
    pub team_name: String,
    pub current_workload: f64,
    pub capacity: f64,
    pub utilization: f64,
    pub status: TeamStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceStrategy {
    /// Выравнивание загрузки пропорционально мощности (эвристика, не решатель назначений)
    ProportionalLeveling,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalancedTeam {
    pub team_id: i64,
    pub team_name: String,
    pub optimized_workload: f64,
    pub optimized_utilization: f64,
    /// Изменение нагрузки: > 0 принять, < 0 отдать
    pub change: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedImprovements {
    pub bottlenecks_before: usize,
    pub bottlenecks_after: usize,
    pub max_utilization_before: f64,
    pub max_utilization_after: f64,
    pub utilization_spread_before: f64,
    pub utilization_spread_after: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadReport {
    pub current_distribution: Vec<TeamLoad>,
    pub bottlenecks: Vec<TeamLoad>,
    pub underutilized: Vec<TeamLoad>,
    pub recommendations: Vec<Insight>,
    pub strategy: RebalanceStrategy,
    pub optimized_distribution: Vec<RebalancedTeam>,
    pub expected_improvements: ExpectedImprovements,
}

// ============================================================================
// Инсайты и рекомендации
// ============================================================================

/// Категория определяет иконку и цвет на стороне интерфейса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Seasonal,
    Trend,
    Prediction,
    SalaryDecrease,
    SalaryIncrease,
    MarketAdjustment,
    Investigation,
    Attendance,
    TalentManagement,
    FeatureAnalysis,
    Overload,
    Underutilized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub priority: Priority,
    pub message: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub employees: Vec<EmployeeId>,
}

impl Insight {
    pub fn new(
        category: InsightCategory,
        priority: Priority,
        message: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            category,
            priority,
            message: message.into(),
            action: action.into(),
            employees: Vec::new(),
        }
    }

    pub fn with_employees(mut self, employees: Vec<EmployeeId>) -> Self {
        self.employees = employees;
        self
    }
}
