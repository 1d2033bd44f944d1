use serde::{Serialize, Deserialize};

use crate::error::{AdderError, Result};

/// Fixed unsigned integer width the network adds in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Width {
    W8,
    W16,
    W32,
}

impl Width {
    /// Number of bits, which is also the sequence length.
    pub fn bits(self) -> usize {
        match self {
            Width::W8 => 8,
            Width::W16 => 16,
            Width::W32 => 32,
        }
    }

    /// Largest representable value, `2^width - 1`.
    pub fn max_value(self) -> u64 {
        (1u64 << self.bits()) - 1
    }
}

impl TryFrom<u32> for Width {
    type Error = AdderError;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(Width::W8),
            16 => Ok(Width::W16),
            32 => Ok(Width::W32),
            other => Err(AdderError::UnsupportedWidth(other)),
        }
    }
}

impl From<Width> for u32 {
    fn from(width: Width) -> u32 {
        width.bits() as u32
    }
}

impl std::fmt::Display for Width {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Encodes `value` as `width` bits, least-significant bit first.
pub fn encode(value: u64, width: Width) -> Result<Vec<u8>> {
    let max = width.max_value();
    if value > max {
        return Err(AdderError::ValueOutOfRange { value, max });
    }
    Ok((0..width.bits()).map(|i| ((value >> i) & 1) as u8).collect())
}

/// Decodes an LSB-first bit vector of exactly `width` bits.
pub fn decode(bits: &[u8], width: Width) -> Result<u64> {
    if bits.len() != width.bits() {
        return Err(AdderError::BitLengthMismatch {
            expected: width.bits(),
            actual: bits.len(),
        });
    }
    bits.iter()
        .enumerate()
        .try_fold(0u64, |acc, (i, &bit)| match bit {
            0 => Ok(acc),
            1 => Ok(acc | (1u64 << i)),
            other => Err(AdderError::InvalidBit(other)),
        })
}

/// Rounds per-bit probabilities to {0, 1} (0.5 rounds up).
pub fn round_probabilities(probabilities: &[f64]) -> Vec<u8> {
    probabilities.iter().map(|&p| u8::from(p >= 0.5)).collect()
}

/// Rounds per-bit probabilities and decodes them back to an integer.
pub fn decode_probabilities(probabilities: &[f64], width: Width) -> Result<u64> {
    decode(&round_probabilities(probabilities), width)
}

/// `(x0 + x1) mod 2^width`, the wrapping sum of fixed-width unsigned integers.
pub fn modular_sum(x0: u64, x1: u64, width: Width) -> u64 {
    x0.wrapping_add(x1) & width.max_value()
}

/// Renders bits most-significant first, the way integers are usually written.
pub fn format_msb_first(bits: &[u8]) -> String {
    bits.iter().rev().map(|&b| if b == 1 { '1' } else { '0' }).collect()
}
