pub mod repl;

pub use repl::{Calculator, Prediction};
