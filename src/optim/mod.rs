pub mod optimizer;
pub mod sgd;
pub mod rmsprop;

pub use optimizer::{Optimizer, OptimizerKind};
pub use sgd::Sgd;
pub use rmsprop::RmsProp;
