pub mod generator;

pub use generator::{generate, Batch, DataConfig, Dataset, Sample};
