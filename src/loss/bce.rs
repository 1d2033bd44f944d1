/// Binary cross-entropy over sum-bit probabilities.
///
/// The adder is trained on the mean over every (step, row) pair, so one
/// wrong bit costs the same at every position and batch losses compare
/// across widths.
pub struct BceLoss;

/// Keeps `ln` finite at saturated probabilities.
const PROB_FLOOR: f64 = 1e-12;

impl BceLoss {
    /// -mean(y·ln(p) + (1-y)·ln(1-p)), both logs floored by `PROB_FLOOR`.
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        let total: f64 = predicted.iter().zip(expected.iter())
            .map(|(&p, &y)| {
                let on = y * (p + PROB_FLOOR).ln();
                let off = (1.0 - y) * (1.0 - p + PROB_FLOOR).ln();
                -(on + off)
            })
            .sum();
        total / predicted.len() as f64
    }

    /// Gradient of the mean BCE w.r.t. the pre-sigmoid logits.
    ///
    /// Sigmoid and BCE compose to `(p - y) / n`; the output step must not
    /// apply the sigmoid derivative again.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| (p - y) / n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_guess_costs_ln_two() {
        let loss = BceLoss::loss(&[0.5, 0.5], &[0.0, 1.0]);
        assert!((loss - std::f64::consts::LN_2).abs() < 1e-9);
    }

    #[test]
    fn confident_correct_predictions_cost_nothing() {
        assert!(BceLoss::loss(&[1.0, 0.0], &[1.0, 0.0]) < 1e-9);
        assert!(BceLoss::loss(&[0.0], &[1.0]) > 20.0);
    }

    #[test]
    fn gradient_is_mean_residual() {
        let grad = BceLoss::derivative(&[0.75, 0.25], &[1.0, 0.0]);
        assert_eq!(grad, vec![-0.125, 0.125]);
    }
}
