pub mod trainer;
pub mod epoch_stats;
pub mod train_config;

pub use trainer::{evaluate, Trainer};
pub use epoch_stats::{EpochStats, Evaluation, TrainReport};
pub use train_config::TrainConfig;
