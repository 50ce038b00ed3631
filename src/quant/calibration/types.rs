//! Type definitions for histogram calibration

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::quant::fake_quantize::NumBits;
use crate::quant::histogram::MAX_BINS;
use crate::{CalibError, Result};

/// Calibrator configuration, fixed at construction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibratorConfig {
    /// Quantization bit width or float micro-format
    pub num_bits: NumBits,
    /// Unsigned quantization (one extra level, no negative range)
    pub unsigned: bool,
    /// Number of bins of the first histogram
    pub num_bins: usize,
    /// Drop exact zeros before counting
    pub skip_zeros: bool,
    /// Quantization axis. Must be `None`; only per-tensor collection is supported.
    pub axis: Option<usize>,
}

impl CalibratorConfig {
    pub fn new(num_bits: impl Into<NumBits>, unsigned: bool) -> Self {
        Self { num_bits: num_bits.into(), unsigned, ..Self::default() }
    }

    pub fn with_num_bins(mut self, num_bins: usize) -> Self {
        self.num_bins = num_bins;
        self
    }

    pub fn with_skip_zeros(mut self, skip_zeros: bool) -> Self {
        self.skip_zeros = skip_zeros;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.axis.is_some() {
            return Err(CalibError::Config(
                "histogram collection only supports per tensor scaling (axis must be None)".into(),
            ));
        }
        if self.num_bins == 0 || self.num_bins > MAX_BINS {
            return Err(CalibError::Config(format!(
                "num_bins must be in 1..={MAX_BINS}, got {}",
                self.num_bins
            )));
        }
        self.num_bits.validate()
    }
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        Self {
            num_bits: NumBits::default(),
            unsigned: false,
            num_bins: 2048,
            skip_zeros: false,
            axis: None,
        }
    }
}

/// Non-fatal advisory attached to a calibration result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// Running under a process group; histograms are not synchronized across workers
    UnsynchronizedDistributed,
    /// Every collected value was zero, so amax is zero
    ZeroOnlyData,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsynchronizedDistributed => f.write_str(
                "amax computation does not synchronize histograms across data-parallel workers; \
                 use the same calibration dataset on every worker so amax matches",
            ),
            Self::ZeroOnlyData => f.write_str("all collected values were zero; amax is 0"),
        }
    }
}

/// Result of `compute_amax`
#[derive(Clone, Debug, PartialEq)]
pub struct Calibration {
    /// Threshold, or `None` if nothing was collected
    pub amax: Option<f32>,
    pub diagnostics: Vec<Diagnostic>,
}
