use serde::{Serialize, Deserialize};

use crate::model::rnn::RnnParams;
use crate::optim::rmsprop::RmsProp;
use crate::optim::sgd::Sgd;

/// Applies one parameter update from a batch gradient.
///
/// Any per-parameter state (moving averages, step counts) lives inside the
/// optimizer, which the trainer owns alongside the model.
pub trait Optimizer {
    fn step(&mut self, params: &mut RnnParams, grads: &RnnParams);

    fn learning_rate(&self) -> f64;
}

/// Selects the update rule a `Trainer` builds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerKind {
    Sgd,
    RmsProp { decay: f64, epsilon: f64 },
}

impl OptimizerKind {
    pub fn build(self, learning_rate: f64) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Sgd => Box::new(Sgd::new(learning_rate)),
            OptimizerKind::RmsProp { decay, epsilon } => {
                Box::new(RmsProp::new(learning_rate, decay, epsilon))
            }
        }
    }
}

impl Default for OptimizerKind {
    fn default() -> Self {
        OptimizerKind::RmsProp { decay: 0.9, epsilon: 1e-7 }
    }
}
