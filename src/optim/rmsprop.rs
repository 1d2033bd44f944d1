use crate::math::matrix::Matrix;
use crate::model::rnn::RnnParams;
use crate::optim::optimizer::Optimizer;

/// RMSProp: scales each step by a running RMS of that parameter's gradient.
///
/// ```text
/// s ← ρ·s + (1 − ρ)·g²
/// θ ← θ − lr · g / (√s + ε)
/// ```
pub struct RmsProp {
    pub learning_rate: f64,
    pub decay: f64,
    pub epsilon: f64,
    /// One accumulator per tensor, in `RnnParams::tensors` order.
    /// Empty until the first step.
    mean_square: Vec<Matrix>,
}

impl RmsProp {
    pub fn new(learning_rate: f64, decay: f64, epsilon: f64) -> RmsProp {
        RmsProp { learning_rate, decay, epsilon, mean_square: Vec::new() }
    }
}

impl Optimizer for RmsProp {
    fn step(&mut self, params: &mut RnnParams, grads: &RnnParams) {
        if self.mean_square.is_empty() {
            self.mean_square = grads.tensors()
                .iter()
                .map(|g| Matrix::zeros(g.rows, g.cols))
                .collect();
        }

        let tensors = params.tensors_mut().into_iter()
            .zip(grads.tensors())
            .zip(self.mean_square.iter_mut());
        for ((param, grad), acc) in tensors {
            for ((w, g), s) in param.iter_mut().zip(grad.iter()).zip(acc.iter_mut()) {
                *s = self.decay * *s + (1.0 - self.decay) * g * g;
                *w -= self.learning_rate * g / (s.sqrt() + self.epsilon);
            }
        }
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn first_step_is_normalised_by_gradient_magnitude() {
        let mut params = RnnParams::xavier(2, &mut StdRng::seed_from_u64(3));
        let start = params.b_o.data[0][0];
        let mut grads = params.zeros_like();
        grads.b_o.data[0][0] = 4.0;

        let mut opt = RmsProp::new(0.01, 0.9, 0.0);
        opt.step(&mut params, &grads);

        // s = 0.1 · 16, step = 0.01 · 4 / √1.6
        let expected = start - 0.01 * 4.0 / 1.6f64.sqrt();
        assert!((params.b_o.data[0][0] - expected).abs() < 1e-12);
    }

    #[test]
    fn zero_gradient_leaves_parameters_untouched() {
        let mut params = RnnParams::xavier(3, &mut StdRng::seed_from_u64(4));
        let before = params.clone();
        let grads = params.zeros_like();
        let mut opt = RmsProp::new(0.01, 0.9, 1e-7);
        opt.step(&mut params, &grads);
        opt.step(&mut params, &grads);
        assert_eq!(params, before);
    }

    #[test]
    fn accumulator_damps_repeated_large_gradients() {
        let mut params = RnnParams::xavier(2, &mut StdRng::seed_from_u64(5));
        let mut grads = params.zeros_like();
        grads.b_o.data[0][0] = 100.0;
        let mut opt = RmsProp::new(0.01, 0.9, 1e-7);

        let mut last = params.b_o.data[0][0];
        let mut steps = Vec::new();
        for _ in 0..5 {
            opt.step(&mut params, &grads);
            steps.push(last - params.b_o.data[0][0]);
            last = params.b_o.data[0][0];
        }
        // Steps shrink toward lr as the running mean square catches up.
        assert!(steps.windows(2).all(|w| w[1] < w[0]));
        assert!(steps.iter().all(|&s| s > 0.0 && s < 0.04));
    }
}
