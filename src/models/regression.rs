//! Регрессия: полиномиальная (ridge) и линейный тренд

#![allow(non_snake_case)]

use linfa::traits::Fit;
use linfa::Dataset;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{AnalyticsError, Result};
use crate::preprocessing::DataNormalizer;

/// Полиномиальная регрессия степени `degree` с ridge-регуляризацией.
/// Признаки расширяются всеми мономами до заданной степени и нормализуются,
/// поэтому коллинеарные входы (индекс и месяц в пределах года) не ломают решение.
pub struct PolynomialRegression {
    degree: usize,
    alpha: f64,
    normalizer: DataNormalizer,
    weights: Option<Array1<f64>>,
    bias: f64,
}

impl PolynomialRegression {
    pub fn new(degree: usize, alpha: f64) -> Self {
        Self {
            degree: degree.max(1),
            alpha,
            normalizer: DataNormalizer::new(),
            weights: None,
            bias: 0.0,
        }
    }

    /// Все мономы степени 1..=degree (сочетания с повторениями)
    fn expand(&self, row: ArrayView1<f64>) -> Vec<f64> {
        let mut terms: Vec<(usize, f64)> = row.iter().enumerate().map(|(j, &v)| (j, v)).collect();
        let mut expanded: Vec<f64> = terms.iter().map(|(_, v)| *v).collect();

        for _ in 1..self.degree {
            let mut next = Vec::new();
            for &(last, value) in &terms {
                for j in last..row.len() {
                    next.push((j, value * row[j]));
                }
            }
            expanded.extend(next.iter().map(|(_, v)| *v));
            terms = next;
        }

        expanded
    }

    fn expand_matrix(&self, X: &Array2<f64>) -> Array2<f64> {
        let rows: Vec<Vec<f64>> = X.rows().into_iter().map(|row| self.expand(row)).collect();
        let n_terms = rows.first().map_or(0, Vec::len);
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        // Размеры согласованы по построению
        Array2::from_shape_vec((X.nrows(), n_terms), flat).unwrap_or_else(|_| Array2::zeros((0, 0)))
    }

    pub fn fit(&mut self, X: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if X.nrows() == 0 || X.ncols() == 0 {
            return Err(AnalyticsError::InvalidInput("Empty dataset".to_string()));
        }
        if X.nrows() != y.len() {
            return Err(AnalyticsError::InvalidInput(
                "Feature and target lengths differ".to_string(),
            ));
        }

        let expanded = self.expand_matrix(X);
        let Z = self.normalizer.fit_transform(&expanded)?;

        // Признаки центрированы, значит свободный член = среднее y
        let y_mean = y.mean().unwrap_or(0.0);
        let y_centered = y - y_mean;

        // Ridge: (Z^T Z + αI) w = Z^T y
        let mut ztz = Z.t().dot(&Z);
        for i in 0..ztz.nrows() {
            ztz[[i, i]] += self.alpha;
        }
        let zty = Z.t().dot(&y_centered);

        self.weights = Some(solve_linear_system(&ztz, &zty)?);
        self.bias = y_mean;
        Ok(())
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        let weights = self
            .weights
            .as_ref()
            .ok_or_else(|| AnalyticsError::DegenerateComputation("Model not trained".to_string()))?;
        let expanded = Array1::from(self.expand(row));
        let z = self.normalizer.transform_row(expanded.view())?;
        Ok(self.bias + z.dot(weights))
    }

    pub fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>> {
        X.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }
}

/// Решение системы методом Гаусса с выбором главного элемента
fn solve_linear_system(A: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = A.nrows();
    let mut augmented = Array2::<f64>::zeros((n, n + 1));
    augmented.slice_mut(ndarray::s![.., ..n]).assign(A);
    augmented.column_mut(n).assign(b);

    // Прямой ход
    for i in 0..n {
        let mut max_row = i;
        let mut max_val = augmented[[i, i]].abs();
        for k in (i + 1)..n {
            if augmented[[k, i]].abs() > max_val {
                max_val = augmented[[k, i]].abs();
                max_row = k;
            }
        }

        if max_row != i {
            for j in 0..=n {
                augmented.swap([i, j], [max_row, j]);
            }
        }

        let pivot = augmented[[i, i]];
        if pivot.abs() < 1e-12 {
            return Err(AnalyticsError::DegenerateComputation("Singular matrix".to_string()));
        }

        for k in (i + 1)..n {
            let factor = augmented[[k, i]] / pivot;
            for j in i..=n {
                augmented[[k, j]] -= factor * augmented[[i, j]];
            }
        }
    }

    // Обратный ход
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = augmented[[i, n]];
        for j in (i + 1)..n {
            sum -= augmented[[i, j]] * x[j];
        }
        x[i] = sum / augmented[[i, i]];
    }

    Ok(x)
}

/// Линейный тренд y(x): (наклон, свободный член)
pub fn linear_trend(x: &[f64], y: &[f64]) -> Result<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return Err(AnalyticsError::InvalidInput(
            "Trend needs at least two paired observations".to_string(),
        ));
    }

    let records = Array2::from_shape_vec((x.len(), 1), x.to_vec())
        .map_err(|e| AnalyticsError::InvalidInput(e.to_string()))?;
    let targets = Array1::from(y.to_vec());
    let dataset = Dataset::new(records, targets);

    let model = LinearRegression::new()
        .fit(&dataset)
        .map_err(|e| AnalyticsError::DegenerateComputation(format!("Trend fit failed: {}", e)))?;

    Ok((model.params()[0], model.intercept()))
}
