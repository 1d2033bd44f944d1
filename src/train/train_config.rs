use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::codec::bits::Width;
use crate::data::generator::DataConfig;
use crate::error::{AdderError, Result};
use crate::optim::optimizer::OptimizerKind;

/// Every constant a training run is started with.
///
/// # Fields
/// - `width`               — integer width; also the sequence length
/// - `hidden_size`         — dimension of the recurrent state
/// - `activation`          — hidden-state non-linearity
/// - `learning_rate`       — step size handed to the optimizer
/// - `optimizer`           — update rule (`Sgd` or `RmsProp`)
/// - `samples`             — total generated pairs; must be a multiple of `batch_size`
/// - `batch_size`          — pairs per gradient step
/// - `validation_fraction` — share of batches held out, in `[0, 1)`
/// - `epochs`              — full passes over the training batches
/// - `grad_clip`           — optional element-wise gradient bound
/// - `seed`                — fixes weight init, data and shuffling when set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub width: Width,
    pub hidden_size: usize,
    pub activation: ActivationFunction,
    pub learning_rate: f64,
    pub optimizer: OptimizerKind,
    pub samples: usize,
    pub batch_size: usize,
    pub validation_fraction: f64,
    pub epochs: usize,
    pub grad_clip: Option<f64>,
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            width: Width::W32,
            hidden_size: 16,
            activation: ActivationFunction::Tanh,
            learning_rate: 0.01,
            optimizer: OptimizerKind::default(),
            samples: 10_000,
            batch_size: 50,
            validation_fraction: 0.2,
            epochs: 20,
            grad_clip: Some(5.0),
            seed: None,
        }
    }
}

impl TrainConfig {
    pub fn data_config(&self) -> DataConfig {
        DataConfig {
            width: self.width,
            samples: self.samples,
            batch_size: self.batch_size,
            validation_fraction: self.validation_fraction,
        }
    }

    /// Seeded generator when `seed` is set, entropy-seeded otherwise.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Rejects configurations that cannot train.
    pub fn validate(&self) -> Result<()> {
        if self.hidden_size == 0 {
            return Err(AdderError::invalid_config("hidden size must be at least 1"));
        }
        if self.epochs == 0 {
            return Err(AdderError::invalid_config("epochs must be at least 1"));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(AdderError::invalid_config(format!(
                "learning rate {} must be positive and finite",
                self.learning_rate
            )));
        }
        if let OptimizerKind::RmsProp { decay, epsilon } = self.optimizer {
            if !(0.0..1.0).contains(&decay) || !(epsilon >= 0.0) {
                return Err(AdderError::invalid_config(format!(
                    "RMSProp needs decay in [0, 1) and epsilon >= 0, got {decay} and {epsilon}"
                )));
            }
        }
        if let Some(limit) = self.grad_clip {
            if !(limit > 0.0) {
                return Err(AdderError::invalid_config(format!(
                    "gradient clip {limit} must be positive"
                )));
            }
        }
        self.data_config().validate()
    }
}
