//! Binary logistic regression with L2 regularisation.
//!
//! Trained by full-batch gradient descent from a zero start, so the same
//! samples always produce the same weights.

use serde::{Deserialize, Serialize};

use super::RiskError;

/// Inverse regularisation strength.
pub const DEFAULT_C: f64 = 1.0;
const LEARNING_RATE: f64 = 0.1;
const MAX_ITERATIONS: usize = 2_000;
const TOLERANCE: f64 = 1e-7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    intercept: f64,
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl LogisticRegression {
    /// Fit on dense rows `x` with labels `y` (true = paid).
    ///
    /// Minimises `C * Σ logloss + ½‖w‖²`; the intercept is not penalised.
    pub fn fit(x: &[Vec<f64>], y: &[bool], c: f64) -> Result<Self, RiskError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(RiskError::EmptyTrainingSet);
        }

        let dims = x[0].len();
        let n = x.len() as f64;
        let mut weights = vec![0.0; dims];
        let mut intercept = 0.0;

        for _ in 0..MAX_ITERATIONS {
            let mut grad_w: Vec<f64> = weights.clone();
            let mut grad_b = 0.0;

            for (row, &label) in x.iter().zip(y) {
                let z = intercept + dot(&weights, row);
                let err = sigmoid(z) - if label { 1.0 } else { 0.0 };
                for (g, xi) in grad_w.iter_mut().zip(row) {
                    *g += c * err * xi;
                }
                grad_b += c * err;
            }

            let mut step = 0.0f64;
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                let delta = LEARNING_RATE * g / n;
                *w -= delta;
                step = step.max(delta.abs());
            }
            let delta_b = LEARNING_RATE * grad_b / n;
            intercept -= delta_b;
            step = step.max(delta_b.abs());

            if step < TOLERANCE {
                break;
            }
        }

        Ok(Self { weights, intercept })
    }

    pub fn dims(&self) -> usize {
        self.weights.len()
    }

    /// Probability of the positive (paid) class.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.intercept + dot(&self.weights, features))
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
    }

    #[test]
    fn separable_data_is_learned() {
        let x = vec![
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
        ];
        let y = vec![true, true, false, false];
        let model = LogisticRegression::fit(&x, &y, DEFAULT_C).unwrap();

        assert!(model.predict_proba(&[1.0, 0.0]) > 0.5);
        assert!(model.predict_proba(&[0.0, 1.0]) < 0.5);
        assert_eq!(model.dims(), 2);
    }

    #[test]
    fn training_is_deterministic() {
        let x = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let y = vec![true, false];
        let a = LogisticRegression::fit(&x, &y, DEFAULT_C).unwrap();
        let b = LogisticRegression::fit(&x, &y, DEFAULT_C).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_or_mismatched_input_is_rejected() {
        assert!(matches!(
            LogisticRegression::fit(&[], &[], DEFAULT_C),
            Err(RiskError::EmptyTrainingSet)
        ));
        assert!(LogisticRegression::fit(&[vec![1.0]], &[true, false], DEFAULT_C).is_err());
    }

    #[test]
    fn probabilities_stay_in_unit_interval() {
        let x = vec![vec![1.0], vec![0.0]];
        let y = vec![true, false];
        let model = LogisticRegression::fit(&x, &y, DEFAULT_C).unwrap();
        for v in [-100.0, -1.0, 0.0, 1.0, 100.0] {
            let p = model.predict_proba(&[v]);
            assert!((0.0..=1.0).contains(&p));
        }
    }
}
