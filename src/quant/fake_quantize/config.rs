//! Bit-width configuration for fake quantization.

use serde::{Deserialize, Serialize};

use crate::{CalibError, Result};

/// Floating-point micro-format (exponent/mantissa split)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FloatFormat {
    /// Exponent bits (4 for E4M3)
    pub exponent_bits: u32,
    /// Mantissa bits (3 for E4M3)
    pub mantissa_bits: u32,
}

impl FloatFormat {
    /// FP8 E4M3 without infinities (max normal 448)
    pub const E4M3: Self = Self { exponent_bits: 4, mantissa_bits: 3 };
    /// FP8 E5M2 with IEEE infinities (max normal 57344)
    pub const E5M2: Self = Self { exponent_bits: 5, mantissa_bits: 2 };

    pub fn new(exponent_bits: u32, mantissa_bits: u32) -> Result<Self> {
        let format = Self { exponent_bits, mantissa_bits };
        format.max_normal()?;
        Ok(format)
    }

    /// Exponent bias: 2^(E-1) - 1
    pub fn bias(&self) -> i32 {
        (1i32 << (self.exponent_bits - 1)) - 1
    }

    /// Smallest normal exponent (unbiased)
    pub fn min_exponent(&self) -> i32 {
        1 - self.bias()
    }

    /// Largest finite magnitude of the format
    pub fn max_normal(&self) -> Result<f32> {
        match (self.exponent_bits, self.mantissa_bits) {
            (4, 3) => Ok(448.0),
            (5, 2) => Ok(57344.0),
            (e, m) => Err(CalibError::Config(format!(
                "unsupported float format E{e}M{m} (supported: E4M3, E5M2)"
            ))),
        }
    }
}

/// Number of quantization bits.
///
/// Either an integer bit width for uniform affine quantization, or a
/// floating-point micro-format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumBits {
    Integer(u32),
    Float(FloatFormat),
}

impl NumBits {
    /// Check the bit width is usable. Integer widths must be in `2..=16`.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Integer(bits) if (2..=16).contains(bits) => Ok(()),
            Self::Integer(bits) => Err(CalibError::Config(format!(
                "invalid num_bits {bits} (must be in 2..=16)"
            ))),
            Self::Float(format) => format.max_normal().map(|_| ()),
        }
    }

    /// Integer bit width, if this is an integer format
    pub fn as_integer(&self) -> Option<u32> {
        match self {
            Self::Integer(bits) => Some(*bits),
            Self::Float(_) => None,
        }
    }
}

impl Default for NumBits {
    fn default() -> Self {
        Self::Integer(8)
    }
}

impl From<u32> for NumBits {
    fn from(bits: u32) -> Self {
        Self::Integer(bits)
    }
}

impl From<FloatFormat> for NumBits {
    fn from(format: FloatFormat) -> Self {
        Self::Float(format)
    }
}

impl std::fmt::Display for NumBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(bits) => write!(f, "{bits}"),
            Self::Float(format) => write!(f, "({}, {})", format.exponent_bits, format.mantissa_bits),
        }
    }
}
