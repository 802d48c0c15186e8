//! Базовая статистика: среднее, отклонение, корреляция

pub struct Statistics;

impl Statistics {
    /// Среднее; для пустой выборки 0
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Несмещённое стандартное отклонение (n - 1); для n < 2 равно 0
    pub fn std_dev(values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let mean = Self::mean(values);
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
        variance.sqrt()
    }

    /// Корреляция Пирсона; 0 при нулевой дисперсии или разной длине
    pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
        if x.len() != y.len() || x.is_empty() {
            return 0.0;
        }
        let n = x.len() as f64;
        let sum_x: f64 = x.iter().sum();
        let sum_y: f64 = y.iter().sum();
        let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
        let sum_x2: f64 = x.iter().map(|a| a * a).sum();
        let sum_y2: f64 = y.iter().map(|b| b * b).sum();

        let numerator = n * sum_xy - sum_x * sum_y;
        let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();

        if denominator == 0.0 || !denominator.is_finite() {
            0.0
        } else {
            (numerator / denominator).clamp(-1.0, 1.0)
        }
    }

    /// Позиция значения в отсортированной выборке, 0..100.
    /// Индекс первого элемента >= value, делённый на размер; 100 если такого нет.
    pub fn percentile_rank(value: f64, sample: &[f64]) -> f64 {
        if sample.is_empty() {
            return 100.0;
        }
        let mut sorted = sample.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        match sorted.iter().position(|s| *s >= value) {
            Some(position) => position as f64 / sorted.len() as f64 * 100.0,
            None => 100.0,
        }
    }

    pub fn mse(predicted: &[f64], actual: &[f64]) -> f64 {
        if predicted.is_empty() || predicted.len() != actual.len() {
            return 0.0;
        }
        predicted
            .iter()
            .zip(actual)
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>()
            / predicted.len() as f64
    }

    /// Точность модели в процентах: max(0, 1 - MSE / 10000)
    pub fn model_accuracy(predicted: &[f64], actual: &[f64]) -> f64 {
        let mse = Self::mse(predicted, actual);
        ((1.0 - mse / 10_000.0).max(0.0) * 100.0).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std_guard_small_inputs() {
        assert_eq!(Statistics::mean(&[]), 0.0);
        assert_eq!(Statistics::std_dev(&[]), 0.0);
        assert_eq!(Statistics::std_dev(&[4.0]), 0.0);
        assert_eq!(Statistics::std_dev(&[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn std_dev_is_sample_deviation() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(Statistics::mean(&values), 5.0);
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((Statistics::std_dev(&values) - expected).abs() < 1e-12);
    }

    #[test]
    fn pearson_detects_linear_relation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((Statistics::pearson(&x, &[2.0, 4.0, 6.0, 8.0]) - 1.0).abs() < 1e-12);
        assert!((Statistics::pearson(&x, &[8.0, 6.0, 4.0, 2.0]) + 1.0).abs() < 1e-12);
        assert_eq!(Statistics::pearson(&x, &[5.0, 5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn percentile_rank_positions() {
        let market = [40_000.0, 50_000.0, 60_000.0, 70_000.0];
        assert_eq!(Statistics::percentile_rank(45_000.0, &market), 25.0);
        assert_eq!(Statistics::percentile_rank(30_000.0, &market), 0.0);
        assert_eq!(Statistics::percentile_rank(90_000.0, &market), 100.0);
    }
}
