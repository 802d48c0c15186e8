//! Регрессионное дерево (CART) и бэггинг-ансамбль деревьев

#![allow(non_snake_case)]

use std::time::{Duration, Instant};

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ForestConfig;
use crate::error::{AnalyticsError, Result};

enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Регрессионное дерево: разбиение по минимуму суммы квадратов отклонений
pub struct RegressionTree {
    max_depth: usize,
    min_samples_split: usize,
    root: Option<TreeNode>,
}

impl RegressionTree {
    pub fn new(max_depth: usize, min_samples_split: usize) -> Self {
        Self {
            max_depth,
            min_samples_split: min_samples_split.max(2),
            root: None,
        }
    }

    /// Обучение на подмножестве строк (индексы могут повторяться)
    pub fn fit_indices(&mut self, X: &Array2<f64>, y: &Array1<f64>, indices: Vec<usize>) -> Result<()> {
        if indices.is_empty() {
            return Err(AnalyticsError::InvalidInput("Empty dataset".to_string()));
        }
        self.root = Some(self.build_tree(X, y, 0, indices));
        Ok(())
    }

    pub fn fit(&mut self, X: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.fit_indices(X, y, (0..X.nrows()).collect())
    }

    fn build_tree(&self, X: &Array2<f64>, y: &Array1<f64>, depth: usize, indices: Vec<usize>) -> TreeNode {
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64;

        if depth >= self.max_depth || indices.len() < self.min_samples_split {
            return TreeNode::Leaf { value: mean };
        }

        let Some((feature, threshold)) = self.best_split(X, y, &indices) else {
            return TreeNode::Leaf { value: mean };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| X[[i, feature]] < threshold);

        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(self.build_tree(X, y, depth + 1, left_indices)),
            right: Box::new(self.build_tree(X, y, depth + 1, right_indices)),
        }
    }

    /// Перебор порогов посередине между соседними различными значениями
    fn best_split(&self, X: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Option<(usize, f64)> {
        let n = indices.len() as f64;
        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        let parent_sse = total_sq - total_sum * total_sum / n;

        let mut best: Option<(usize, f64)> = None;
        let mut best_sse = parent_sse - 1e-12;

        for feature in 0..X.ncols() {
            let mut sorted: Vec<usize> = indices.to_vec();
            sorted.sort_by(|&a, &b| X[[a, feature]].total_cmp(&X[[b, feature]]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for k in 0..sorted.len() - 1 {
                let value = y[sorted[k]];
                left_sum += value;
                left_sq += value * value;

                let current = X[[sorted[k], feature]];
                let next = X[[sorted[k + 1], feature]];
                if next - current < 1e-12 {
                    continue;
                }

                let left_n = (k + 1) as f64;
                let right_n = n - left_n;
                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;

                let sse = (left_sq - left_sum * left_sum / left_n)
                    + (right_sq - right_sum * right_sum / right_n);

                if sse < best_sse {
                    best_sse = sse;
                    best = Some((feature, (current + next) / 2.0));
                }
            }
        }

        best
    }

    pub fn predict_row(&self, sample: ArrayView1<f64>) -> Result<f64> {
        let mut node = self
            .root
            .as_ref()
            .ok_or_else(|| AnalyticsError::DegenerateComputation("Model not trained".to_string()))?;

        loop {
            match node {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] < *threshold { left } else { right };
                }
            }
        }
    }
}

/// Бэггинг регрессионных деревьев: каждое дерево учится на бутстрап-выборке,
/// прогноз = среднее по деревьям
pub struct RandomForest {
    config: ForestConfig,
    seed: u64,
    budget: Option<Duration>,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn new(config: ForestConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            budget: None,
            trees: Vec::new(),
        }
    }

    /// Лимит времени обучения; уже построенные деревья сохраняются
    pub fn with_budget(mut self, budget: Option<Duration>) -> Self {
        self.budget = budget;
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn fit(&mut self, X: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = X.nrows();
        if n_samples == 0 || X.ncols() == 0 {
            return Err(AnalyticsError::InvalidInput("Empty dataset".to_string()));
        }
        if n_samples != y.len() {
            return Err(AnalyticsError::InvalidInput(
                "Feature and target lengths differ".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let started = Instant::now();
        self.trees.clear();

        for _ in 0..self.config.n_trees {
            if let Some(budget) = self.budget {
                if !self.trees.is_empty() && started.elapsed() >= budget {
                    tracing::warn!(
                        "Training budget of {:?} exhausted after {} of {} trees",
                        budget,
                        self.trees.len(),
                        self.config.n_trees
                    );
                    break;
                }
            }

            let indices: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            let mut tree = RegressionTree::new(self.config.max_depth, self.config.min_samples_split);
            tree.fit_indices(X, y, indices)?;
            self.trees.push(tree);
        }

        Ok(())
    }

    pub fn predict_row(&self, sample: ArrayView1<f64>) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(AnalyticsError::DegenerateComputation("Model not trained".to_string()));
        }
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict_row(sample)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    pub fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>> {
        X.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }
}
