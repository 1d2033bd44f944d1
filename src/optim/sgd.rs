use crate::model::rnn::RnnParams;
use crate::optim::optimizer::Optimizer;

pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    /// θ ← θ − lr · g
    fn step(&mut self, params: &mut RnnParams, grads: &RnnParams) {
        for (param, grad) in params.tensors_mut().into_iter().zip(grads.tensors()) {
            for (w, g) in param.iter_mut().zip(grad.iter()) {
                *w -= self.learning_rate * g;
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
    use crate::math::matrix::Matrix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn steps_against_the_gradient() {
        let mut params = RnnParams::xavier(2, &mut StdRng::seed_from_u64(1));
        let before = params.clone();
        let mut grads = params.zeros_like();
        grads.b_o = Matrix::from_data(vec![vec![2.0]]);

        Sgd::new(0.5).step(&mut params, &grads);

        assert_eq!(params.b_o.data[0][0], before.b_o.data[0][0] - 1.0);
        assert_eq!(params.w_hh, before.w_hh);
    }
}
