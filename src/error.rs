//! Error types shared by the codec, the data generator and the trainer.

use thiserror::Error;

/// Errors raised by the library.
///
/// Configuration problems are reported through this type so the binary can
/// abort at startup instead of training on an undefined setup.
#[derive(Debug, Error)]
pub enum AdderError {
    /// Only 8, 16 and 32 bit integers are modelled.
    #[error("Unsupported width: {0} bits (expected 8, 16 or 32)")]
    UnsupportedWidth(u32),

    /// Integer does not fit the configured width.
    #[error("Value {value} is out of range [0, {max}]")]
    ValueOutOfRange { value: u64, max: u64 },

    /// Bit vector length differs from the configured width.
    #[error("Bit length mismatch: expected {expected}, actual {actual}")]
    BitLengthMismatch { expected: usize, actual: usize },

    /// A bit vector held something other than 0 or 1.
    #[error("Invalid bit value: {0}")]
    InvalidBit(u8),

    /// Calculator input that does not parse as an unsigned integer.
    #[error("'{input}' is not a non-negative integer")]
    InvalidNumber { input: String },

    /// Sample count must split evenly into batches.
    #[error("Sample count {samples} is not a multiple of batch size {batch_size}")]
    BatchSizeMismatch { samples: usize, batch_size: usize },

    /// Any other rejected hyperparameter.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl AdderError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_offending_values() {
        let err = AdderError::BatchSizeMismatch { samples: 10, batch_size: 3 };
        assert_eq!(err.to_string(), "Sample count 10 is not a multiple of batch size 3");

        let err = AdderError::ValueOutOfRange { value: 300, max: 255 };
        assert_eq!(err.to_string(), "Value 300 is out of range [0, 255]");

        let err = AdderError::invalid_config("epochs must be at least 1");
        assert!(err.to_string().contains("epochs must be at least 1"));
    }
}
