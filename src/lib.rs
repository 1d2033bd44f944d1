pub mod error;
pub mod logging;
pub mod math;
pub mod activation;
pub mod codec;
pub mod data;
pub mod loss;
pub mod model;
pub mod optim;
pub mod train;
pub mod calculator;

// Convenience re-exports
pub use error::{AdderError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use codec::bits::Width;
pub use data::generator::{generate, Dataset, DataConfig};
pub use model::rnn::RnnAdder;
pub use optim::optimizer::{Optimizer, OptimizerKind};
pub use train::{Trainer, TrainConfig, TrainReport};
pub use calculator::repl::Calculator;
