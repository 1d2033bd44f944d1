use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::codec::bits::{decode_probabilities, encode, Width};
use crate::data::generator::Batch;
use crate::error::Result;
use crate::loss::bce::BceLoss;
use crate::math::matrix::Matrix;

/// Weights of the recurrent adder. Also used to carry gradients, which share
/// the exact same shapes.
///
/// Shapes for hidden size `H`:
/// - `w_ih` 2 x H, `w_hh` H x H, `b_h` 1 x H
/// - `w_ho` H x 1, `b_o` 1 x 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnnParams {
    pub w_ih: Matrix,
    pub w_hh: Matrix,
    pub b_h: Matrix,
    pub w_ho: Matrix,
    pub b_o: Matrix,
}

impl RnnParams {
    /// Xavier weights, zero biases.
    pub fn xavier<R: Rng + ?Sized>(hidden_size: usize, rng: &mut R) -> RnnParams {
        RnnParams {
            w_ih: Matrix::xavier(2, hidden_size, rng),
            w_hh: Matrix::xavier(hidden_size, hidden_size, rng),
            b_h: Matrix::zeros(1, hidden_size),
            w_ho: Matrix::xavier(hidden_size, 1, rng),
            b_o: Matrix::zeros(1, 1),
        }
    }

    pub fn zeros_like(&self) -> RnnParams {
        let z = |m: &Matrix| Matrix::zeros(m.rows, m.cols);
        RnnParams {
            w_ih: z(&self.w_ih),
            w_hh: z(&self.w_hh),
            b_h: z(&self.b_h),
            w_ho: z(&self.w_ho),
            b_o: z(&self.b_o),
        }
    }

    /// Fixed ordering shared with `tensors_mut`, relied on by optimizers.
    pub fn tensors(&self) -> [&Matrix; 5] {
        [&self.w_ih, &self.w_hh, &self.b_h, &self.w_ho, &self.b_o]
    }

    pub fn tensors_mut(&mut self) -> [&mut Matrix; 5] {
        [&mut self.w_ih, &mut self.w_hh, &mut self.b_h, &mut self.w_ho, &mut self.b_o]
    }

    pub fn clip(&mut self, limit: f64) {
        for t in self.tensors_mut() {
            t.clip(limit);
        }
    }

    pub fn is_finite(&self) -> bool {
        self.tensors().iter().all(|t| t.iter().all(|x| x.is_finite()))
    }
}

/// Activations retained from a forward pass for backpropagation through time.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    pub initial: Matrix,
    /// Pre-activation `z[t]`, one `B x H` matrix per step.
    pub pre: Vec<Matrix>,
    /// Hidden state `h[t]`, one `B x H` matrix per step.
    pub hidden: Vec<Matrix>,
    /// Sum-bit probabilities, one `B x 1` matrix per step.
    pub probabilities: Vec<Matrix>,
}

impl ForwardPass {
    /// Probabilities flattened step-major, matching `flatten_steps`.
    pub fn flat_probabilities(&self) -> Vec<f64> {
        flatten_steps(&self.probabilities)
    }

    /// Per-row probabilities in LSB-first order.
    pub fn row_probabilities(&self, row: usize) -> Vec<f64> {
        self.probabilities.iter().map(|p| p.data[row][0]).collect()
    }
}

/// Single-layer Elman network reading one bit position of both operands per
/// step and emitting one sum-bit probability per step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RnnAdder {
    pub hidden_size: usize,
    pub activation: ActivationFunction,
    pub params: RnnParams,
}

impl RnnAdder {
    pub fn new<R: Rng + ?Sized>(hidden_size: usize, activation: ActivationFunction, rng: &mut R) -> RnnAdder {
        RnnAdder {
            hidden_size,
            activation,
            params: RnnParams::xavier(hidden_size, rng),
        }
    }

    /// Unrolls the cell over `inputs` (one `B x 2` matrix per step).
    ///
    /// `initial` defaults to the zero state.
    pub fn forward(&self, inputs: &[Matrix], initial: Option<&Matrix>) -> ForwardPass {
        let batch = inputs.first().map_or(0, |m| m.rows);
        let initial = initial.cloned().unwrap_or_else(|| Matrix::zeros(batch, self.hidden_size));
        let p = &self.params;

        let mut pre = Vec::with_capacity(inputs.len());
        let mut hidden: Vec<Matrix> = Vec::with_capacity(inputs.len());
        let mut probabilities = Vec::with_capacity(inputs.len());

        for x in inputs {
            let h_prev = hidden.last().unwrap_or(&initial);
            // h[t] = act(x[t]·W_ih + h[t-1]·W_hh + b_h)
            let z = (&(x * &p.w_ih) + &(h_prev * &p.w_hh)).add_row(&p.b_h);
            let h = z.map(|v| self.activation.function(v));
            // o[t] = sigmoid(h[t]·W_ho + b_o)
            let logit = (&h * &p.w_ho).add_row(&p.b_o);
            probabilities.push(logit.map(|v| ActivationFunction::Sigmoid.function(v)));
            pre.push(z);
            hidden.push(h);
        }

        ForwardPass { initial, pre, hidden, probabilities }
    }

    /// Mean BCE over every step and batch row.
    pub fn loss(&self, pass: &ForwardPass, targets: &[Matrix]) -> f64 {
        BceLoss::loss(&pass.flat_probabilities(), &flatten_steps(targets))
    }

    /// Backpropagation through time. Returns gradients of the mean BCE loss.
    pub fn backward(&self, pass: &ForwardPass, inputs: &[Matrix], targets: &[Matrix]) -> RnnParams {
        let p = &self.params;
        let steps = inputs.len();
        let batch = pass.initial.rows;

        let d_flat = BceLoss::derivative(&pass.flat_probabilities(), &flatten_steps(targets));
        let d_logits: Vec<Matrix> = d_flat.chunks(batch.max(1))
            .map(Matrix::column)
            .collect();

        let w_ho_t = p.w_ho.transpose();
        let w_hh_t = p.w_hh.transpose();
        let mut grads = p.zeros_like();
        let mut dh_next = Matrix::zeros(batch, self.hidden_size);

        for t in (0..steps).rev() {
            let d_logit = &d_logits[t];
            let h = &pass.hidden[t];
            let h_prev = if t == 0 { &pass.initial } else { &pass.hidden[t - 1] };

            grads.w_ho.add_assign(&(&h.transpose() * d_logit));
            grads.b_o.add_assign(&d_logit.sum_rows());

            // Error reaching h[t] from this step's output and from step t+1.
            let dh = &(d_logit * &w_ho_t) + &dh_next;
            let dz = dh.hadamard(&pass.pre[t].map(|v| self.activation.derivative(v)));

            grads.w_ih.add_assign(&(&inputs[t].transpose() * &dz));
            grads.w_hh.add_assign(&(&h_prev.transpose() * &dz));
            grads.b_h.add_assign(&dz.sum_rows());

            dh_next = &dz * &w_hh_t;
        }

        grads
    }

    /// Forward + loss + gradients for one batch.
    pub fn loss_and_gradients(&self, batch: &Batch) -> (f64, RnnParams) {
        let pass = self.forward(&batch.inputs, None);
        let loss = self.loss(&pass, &batch.targets);
        let grads = self.backward(&pass, &batch.inputs, &batch.targets);
        (loss, grads)
    }

    /// Per-bit sum probabilities (LSB first) for one operand pair.
    pub fn predict_probabilities(&self, x0: u64, x1: u64, width: Width) -> Result<Vec<f64>> {
        let a = encode(x0, width)?;
        let b = encode(x1, width)?;
        let inputs: Vec<Matrix> = a.iter().zip(b.iter())
            .map(|(&a, &b)| Matrix::from_data(vec![vec![f64::from(a), f64::from(b)]]))
            .collect();
        Ok(self.forward(&inputs, None).row_probabilities(0))
    }

    /// Predicted `(x0 + x1) mod 2^width`.
    pub fn predict(&self, x0: u64, x1: u64, width: Width) -> Result<u64> {
        decode_probabilities(&self.predict_probabilities(x0, x1, width)?, width)
    }
}

/// Flattens per-step `B x 1` matrices step-major into one slice.
fn flatten_steps(steps: &[Matrix]) -> Vec<f64> {
    steps.iter().flat_map(|m| m.iter().copied()).collect()
}
