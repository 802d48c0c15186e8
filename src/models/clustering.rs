//! Кластеризация сотрудников по поведению (k-means, k = 3)

use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::{KMeans, KMeansInit};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ClusteringConfig;
use crate::error::{ensure_min_samples, AnalyticsError, Result};
use crate::preprocessing::{DataNormalizer, FeatureEngineer};
use crate::types::{
    ClusterAssignment, ClusterCentroid, ClusterLabel, ClusterSummary, Clustering, EmployeeMetrics,
};

pub const N_CLUSTERS: usize = 3;

pub struct EmployeeClusterer {
    config: ClusteringConfig,
    seed: u64,
}

impl EmployeeClusterer {
    pub fn new(config: ClusteringConfig, seed: u64) -> Self {
        Self { config, seed }
    }

    pub fn cluster(&self, employees: &[EmployeeMetrics]) -> Result<Clustering> {
        ensure_min_samples("clustering", "employees", N_CLUSTERS, employees.len())?;

        let raw = FeatureEngineer::cluster_features(employees);
        // Дни отпуска на порядки больше долей, без нормализации они доминируют
        let scaled = DataNormalizer::new().fit_transform(&raw)?;
        let dataset = DatasetBase::from(scaled.clone());

        let model = KMeans::params_with_rng(N_CLUSTERS, StdRng::seed_from_u64(self.seed))
            .init_method(KMeansInit::Random)
            .n_runs(self.config.n_runs)
            .max_n_iterations(self.config.max_iterations)
            .tolerance(self.config.tolerance)
            .fit(&dataset)
            .map_err(|e| AnalyticsError::DegenerateComputation(format!("k-means failed: {}", e)))?;

        let memberships: Array1<usize> = model.predict(&scaled);

        // Центроиды в исходных единицах, по фактическим участникам
        let mut sums = [[0.0_f64; 3]; N_CLUSTERS];
        let mut sizes = [0_usize; N_CLUSTERS];
        for (i, &cluster) in memberships.iter().enumerate() {
            let cluster = cluster.min(N_CLUSTERS - 1);
            sizes[cluster] += 1;
            for j in 0..3 {
                sums[cluster][j] += raw[[i, j]];
            }
        }
        let centroids: Vec<Option<ClusterCentroid>> = (0..N_CLUSTERS)
            .map(|c| {
                (sizes[c] > 0).then(|| {
                    let n = sizes[c] as f64;
                    ClusterCentroid {
                        attendance_rate: sums[c][0] / n,
                        performance_score: sums[c][1] / n,
                        leave_days: sums[c][2] / n,
                    }
                })
            })
            .collect();

        let ranks = Self::rank_clusters(&centroids);

        let assignments = employees
            .iter()
            .zip(memberships.iter())
            .map(|(employee, &cluster)| {
                let rank = ranks[cluster.min(N_CLUSTERS - 1)];
                ClusterAssignment {
                    employee_id: employee.employee_id,
                    cluster: rank,
                    label: ClusterLabel::from_rank(rank),
                }
            })
            .collect();

        let mut summaries: Vec<ClusterSummary> = (0..N_CLUSTERS)
            .map(|c| ClusterSummary {
                cluster: ranks[c],
                label: ClusterLabel::from_rank(ranks[c]),
                size: sizes[c],
                centroid: centroids[c],
            })
            .collect();
        summaries.sort_by_key(|s| s.cluster);

        tracing::debug!("Clustered {} employees, sizes {:?}", employees.len(), sizes);

        Ok(Clustering {
            assignments,
            summaries,
        })
    }

    /// Ранг каждого кластера: по убыванию средней оценки, затем по возрастанию
    /// дней отпуска. Пустые кластеры в конце. Индекс k-means не влияет на метку.
    fn rank_clusters(centroids: &[Option<ClusterCentroid>]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..centroids.len()).collect();
        order.sort_by(|&a, &b| match (&centroids[a], &centroids[b]) {
            (Some(ca), Some(cb)) => cb
                .performance_score
                .total_cmp(&ca.performance_score)
                .then(ca.leave_days.total_cmp(&cb.leave_days))
                .then(a.cmp(&b)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(&b),
        });

        let mut ranks = vec![0; centroids.len()];
        for (rank, &cluster) in order.iter().enumerate() {
            ranks[cluster] = rank;
        }
        ranks
    }
}

impl Default for EmployeeClusterer {
    fn default() -> Self {
        Self::new(ClusteringConfig::default(), 42)
    }
}
