//! Анализ загрузки команд и симуляция перераспределения

use std::collections::HashMap;

use crate::config::WorkloadConfig;
use crate::error::{AnalyticsError, Result};
use crate::models::insights::InsightComposer;
use crate::types::{
    ExpectedImprovements, RebalanceStrategy, RebalancedTeam, Team, TeamLoad, TeamStatus,
    WorkloadAssignment, WorkloadReport,
};

pub struct WorkloadBalancer {
    config: WorkloadConfig,
}

impl WorkloadBalancer {
    pub fn new(config: WorkloadConfig) -> Self {
        Self { config }
    }

    pub fn optimize(&self, teams: &[Team], workloads: &[WorkloadAssignment]) -> Result<WorkloadReport> {
        if teams.is_empty() {
            return Err(AnalyticsError::InvalidInput("team roster is empty".to_string()));
        }

        let mut assigned: HashMap<i64, f64> = HashMap::new();
        for item in workloads {
            if !item.workload.is_finite() || item.workload < 0.0 {
                return Err(AnalyticsError::InvalidInput(format!(
                    "workload for team {} must be a non-negative number, got {}",
                    item.team_id, item.workload
                )));
            }
            *assigned.entry(item.team_id).or_insert(0.0) += item.workload;
        }
        for team_id in assigned.keys() {
            if !teams.iter().any(|t| t.id == *team_id) {
                tracing::warn!("Workload assigned to unknown team {} is ignored", team_id);
            }
        }

        let current_distribution = teams
            .iter()
            .map(|team| {
                let capacity = self.capacity(team)?;
                let current_workload = assigned.get(&team.id).copied().unwrap_or(0.0);
                let utilization = current_workload / capacity;
                Ok(TeamLoad {
                    team_id: team.id,
                    team_name: team.name.clone(),
                    current_workload,
                    capacity,
                    utilization,
                    status: self.classify(utilization),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let bottlenecks: Vec<TeamLoad> = current_distribution
            .iter()
            .filter(|t| t.status == TeamStatus::Bottleneck)
            .cloned()
            .collect();
        let underutilized: Vec<TeamLoad> = current_distribution
            .iter()
            .filter(|t| t.status == TeamStatus::Underutilized)
            .cloned()
            .collect();

        let recommendations = InsightComposer::workload_recommendations(&bottlenecks, &underutilized);
        let optimized_distribution = Self::level(&current_distribution);
        let expected_improvements = self.improvements(&current_distribution, &optimized_distribution);

        tracing::info!(
            "Workload analysed for {} teams: {} bottlenecks, {} underutilized",
            teams.len(),
            bottlenecks.len(),
            underutilized.len()
        );

        Ok(WorkloadReport {
            current_distribution,
            bottlenecks,
            underutilized,
            recommendations,
            strategy: RebalanceStrategy::ProportionalLeveling,
            optimized_distribution,
            expected_improvements,
        })
    }

    /// Нулевая мощность заменяется значением по умолчанию
    fn capacity(&self, team: &Team) -> Result<f64> {
        match team.capacity {
            c if c == 0.0 => Ok(self.config.default_capacity),
            c if c.is_finite() && c > 0.0 => Ok(c),
            c => Err(AnalyticsError::InvalidInput(format!(
                "capacity of team {} must be positive, got {}",
                team.id, c
            ))),
        }
    }

    pub fn classify(&self, utilization: f64) -> TeamStatus {
        if utilization > self.config.bottleneck_utilization {
            TeamStatus::Bottleneck
        } else if utilization < self.config.underutilized_utilization {
            TeamStatus::Underutilized
        } else {
            TeamStatus::Balanced
        }
    }

    /// Эвристика: общая нагрузка делится пропорционально мощности,
    /// у всех команд одинаковая загрузка. Не решатель назначений,
    /// задачи считаются делимыми.
    fn level(current: &[TeamLoad]) -> Vec<RebalancedTeam> {
        let total_workload: f64 = current.iter().map(|t| t.current_workload).sum();
        let total_capacity: f64 = current.iter().map(|t| t.capacity).sum();
        let target = if total_capacity > 0.0 {
            total_workload / total_capacity
        } else {
            0.0
        };

        current
            .iter()
            .map(|team| {
                let optimized_workload = team.capacity * target;
                RebalancedTeam {
                    team_id: team.team_id,
                    team_name: team.team_name.clone(),
                    optimized_workload,
                    optimized_utilization: target,
                    change: optimized_workload - team.current_workload,
                }
            })
            .collect()
    }

    fn improvements(&self, current: &[TeamLoad], optimized: &[RebalancedTeam]) -> ExpectedImprovements {
        let before: Vec<f64> = current.iter().map(|t| t.utilization).collect();
        let after: Vec<f64> = optimized.iter().map(|t| t.optimized_utilization).collect();
        let over = |values: &[f64]| {
            values
                .iter()
                .filter(|&&u| u > self.config.bottleneck_utilization)
                .count()
        };

        ExpectedImprovements {
            bottlenecks_before: over(&before),
            bottlenecks_after: over(&after),
            max_utilization_before: max(&before),
            max_utilization_after: max(&after),
            utilization_spread_before: max(&before) - min(&before),
            utilization_spread_after: max(&after) - min(&after),
        }
    }
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max).max(0.0)
}

fn min(values: &[f64]) -> f64 {
    let m = values.iter().copied().fold(f64::INFINITY, f64::min);
    if m.is_finite() {
        m
    } else {
        0.0
    }
}

impl Default for WorkloadBalancer {
    fn default() -> Self {
        Self::new(WorkloadConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: i64, capacity: f64) -> Team {
        Team {
            id,
            name: format!("Team {}", id),
            capacity,
        }
    }

    fn load(team_id: i64, workload: f64) -> WorkloadAssignment {
        WorkloadAssignment {
            team_id,
            workload,
            task: None,
        }
    }

    #[test]
    fn classifies_by_utilization() {
        let report = WorkloadBalancer::default()
            .optimize(
                &[team(1, 100.0), team(2, 100.0), team(3, 100.0)],
                &[load(1, 95.0), load(2, 45.0), load(3, 70.0)],
            )
            .unwrap();

        let statuses: Vec<TeamStatus> = report.current_distribution.iter().map(|t| t.status).collect();
        assert_eq!(
            statuses,
            vec![TeamStatus::Bottleneck, TeamStatus::Underutilized, TeamStatus::Balanced]
        );
        assert_eq!(report.bottlenecks.len(), 1);
        assert_eq!(report.underutilized.len(), 1);
        assert_eq!(report.recommendations.len(), 2);
    }

    #[test]
    fn leveling_conserves_total_workload() {
        let report = WorkloadBalancer::default()
            .optimize(
                &[team(1, 100.0), team(2, 50.0)],
                &[load(1, 30.0), load(2, 60.0), load(2, 30.0)],
            )
            .unwrap();

        let total: f64 = report.optimized_distribution.iter().map(|t| t.optimized_workload).sum();
        assert!((total - 120.0).abs() < 1e-9);
        assert!((report.optimized_distribution[0].optimized_workload - 80.0).abs() < 1e-9);
        assert!((report.optimized_distribution[1].change + 50.0).abs() < 1e-9);

        let improvements = &report.expected_improvements;
        assert_eq!(improvements.bottlenecks_before, 1);
        assert_eq!(improvements.bottlenecks_after, 0);
        assert!((improvements.max_utilization_before - 1.8).abs() < 1e-9);
        assert!(improvements.utilization_spread_after.abs() < 1e-9);
    }

    #[test]
    fn zero_capacity_falls_back_to_default() {
        let report = WorkloadBalancer::default()
            .optimize(&[team(1, 0.0)], &[load(1, 50.0)])
            .unwrap();
        assert_eq!(report.current_distribution[0].capacity, 100.0);
        assert_eq!(report.current_distribution[0].utilization, 0.5);
    }

    #[test]
    fn rejects_empty_roster_and_negative_capacity() {
        let balancer = WorkloadBalancer::default();
        assert!(matches!(
            balancer.optimize(&[], &[]),
            Err(AnalyticsError::InvalidInput(_))
        ));
        assert!(matches!(
            balancer.optimize(&[team(1, -5.0)], &[]),
            Err(AnalyticsError::InvalidInput(_))
        ));
    }

    #[test]
    fn unknown_team_workload_is_ignored() {
        let report = WorkloadBalancer::default()
            .optimize(&[team(1, 100.0)], &[load(1, 60.0), load(9, 500.0)])
            .unwrap();
        assert_eq!(report.current_distribution[0].current_workload, 60.0);
    }
}
