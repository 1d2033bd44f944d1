pub mod bits;

pub use bits::{decode, decode_probabilities, encode, modular_sum, Width};
