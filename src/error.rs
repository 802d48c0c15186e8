//! Ошибки аналитического ядра

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    /// Выборка меньше минимума компонента. Нормальный исход, не эскалируется.
    #[error("Insufficient data for {component} (minimum {required} {unit} required, got {actual})")]
    InsufficientData {
        component: &'static str,
        unit: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate computation: {0}")]
    DegenerateComputation(String),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientData,
    InvalidInput,
    DegenerateComputation,
}

impl AnalyticsError {
    pub fn insufficient(
        component: &'static str,
        unit: &'static str,
        required: usize,
        actual: usize,
    ) -> Self {
        Self::InsufficientData {
            component,
            unit,
            required,
            actual,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientData { .. } => ErrorKind::InsufficientData,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::DegenerateComputation(_) => ErrorKind::DegenerateComputation,
        }
    }
}

/// Проверка минимального размера выборки перед обучением
pub fn ensure_min_samples(
    component: &'static str,
    unit: &'static str,
    required: usize,
    actual: usize,
) -> Result<()> {
    if actual < required {
        return Err(AnalyticsError::insufficient(component, unit, required, actual));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message_names_the_minimum() {
        let err = AnalyticsError::insufficient("leave prediction", "months", 6, 5);
        assert_eq!(
            err.to_string(),
            "Insufficient data for leave prediction (minimum 6 months required, got 5)"
        );
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn ensure_min_samples_accepts_boundary() {
        assert!(ensure_min_samples("x", "records", 6, 6).is_ok());
        assert!(ensure_min_samples("x", "records", 6, 5).is_err());
    }
}
