//! Type definitions for threshold search

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CalibError, Result};

/// Default percentile for percentile calibration
pub const DEFAULT_PERCENTILE: f64 = 99.99;

/// Threshold search objective
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    /// Minimize KL divergence between original and quantized distributions
    Entropy,
    /// Minimize counts-weighted mean squared quantization error
    Mse,
    /// Clip at the given percentile (in `[0, 100]`) of the collected mass
    Percentile(f64),
}

impl SearchMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Entropy => "entropy",
            Self::Mse => "mse",
            Self::Percentile(_) => "percentile",
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percentile(p) => write!(f, "percentile({p})"),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for SearchMethod {
    type Err = CalibError;

    /// Parse `entropy`, `mse`, or `percentile` (at [`DEFAULT_PERCENTILE`])
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "entropy" => Ok(Self::Entropy),
            "mse" => Ok(Self::Mse),
            "percentile" => Ok(Self::Percentile(DEFAULT_PERCENTILE)),
            other => Err(CalibError::UnknownMethod(other.to_string())),
        }
    }
}

/// Candidate sampling for the entropy and MSE searches
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Step between candidate cut indices
    pub stride: usize,
    /// Smallest candidate cut index; keeps thresholds away from zero
    pub start_bin: usize,
}

impl SearchParams {
    pub fn validate(&self) -> Result<()> {
        if self.stride == 0 {
            return Err(CalibError::InvalidStride);
        }
        Ok(())
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self { stride: 1, start_bin: 128 }
    }
}
