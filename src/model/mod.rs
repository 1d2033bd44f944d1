pub mod rnn;

pub use rnn::{ForwardPass, RnnAdder, RnnParams};
