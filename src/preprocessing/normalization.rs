//! Нормализация признаков (z-score по столбцам)

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::error::{AnalyticsError, Result};

#[derive(Debug, Clone)]
pub struct DataNormalizer {
    mean: Option<Array1<f64>>,
    std: Option<Array1<f64>>,
}

impl DataNormalizer {
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
        }
    }

    pub fn fit(&mut self, X: &Array2<f64>) -> Result<()> {
        if X.nrows() == 0 {
            return Err(AnalyticsError::InvalidInput("Empty dataset".to_string()));
        }

        let mean = X
            .mean_axis(Axis(0))
            .ok_or_else(|| AnalyticsError::DegenerateComputation("Failed to compute mean".to_string()))?;
        let mut std = X.std_axis(Axis(0), 0.0);

        // Постоянный столбец не масштабируем, чтобы не делить на ноль
        std.mapv_inplace(|v| if v < 1e-10 { 1.0 } else { v });

        self.mean = Some(mean);
        self.std = Some(std);
        Ok(())
    }

    fn fitted(&self) -> Result<(&Array1<f64>, &Array1<f64>)> {
        match (&self.mean, &self.std) {
            (Some(mean), Some(std)) => Ok((mean, std)),
            _ => Err(AnalyticsError::DegenerateComputation(
                "Normalizer not fitted".to_string(),
            )),
        }
    }

    pub fn transform(&self, X: &Array2<f64>) -> Result<Array2<f64>> {
        let (mean, std) = self.fitted()?;
        if X.ncols() != mean.len() {
            return Err(AnalyticsError::InvalidInput(format!(
                "Expected {} features, got {}",
                mean.len(),
                X.ncols()
            )));
        }
        Ok((X - mean) / std)
    }

    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>> {
        let (mean, std) = self.fitted()?;
        if row.len() != mean.len() {
            return Err(AnalyticsError::InvalidInput(format!(
                "Expected {} features, got {}",
                mean.len(),
                row.len()
            )));
        }
        Ok((&row - mean) / std)
    }

    pub fn fit_transform(&mut self, X: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(X)?;
        self.transform(X)
    }
}

impl Default for DataNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
