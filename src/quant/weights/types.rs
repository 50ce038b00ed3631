//! Weight calibration type definitions

use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayD, ArrayViewD};
use serde::{Deserialize, Serialize};

use crate::quant::fake_quantize::NumBits;
use crate::quant::search::DEFAULT_PERCENTILE;
use crate::{CalibError, Result};

/// Threshold method for one-shot weight calibration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightMethod {
    /// Raw absolute maximum, no histogram
    Max,
    /// Minimize fake-quantization error over the slice histogram
    Mse,
    /// Clip `WeightCalibrationConfig::percentile` of the slice histogram
    #[default]
    Percentile,
}

impl WeightMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Mse => "mse",
            Self::Percentile => "percentile",
        }
    }
}

impl fmt::Display for WeightMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WeightMethod {
    type Err = CalibError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "max" => Ok(Self::Max),
            "mse" => Ok(Self::Mse),
            "percentile" => Ok(Self::Percentile),
            "entropy" => Err(CalibError::UnsupportedMethod {
                method: s.to_string(),
                context: "weight calibration".into(),
            }),
            other => Err(CalibError::UnknownMethod(other.to_string())),
        }
    }
}

/// One-shot weight calibration settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightCalibrationConfig {
    pub method: WeightMethod,
    /// One threshold per output channel instead of one per tensor
    pub per_channel: bool,
    /// Used by `WeightMethod::Percentile` only
    pub percentile: f64,
    /// Bins per slice histogram
    pub num_bins: usize,
}

impl Default for WeightCalibrationConfig {
    fn default() -> Self {
        Self {
            method: WeightMethod::default(),
            per_channel: true,
            percentile: DEFAULT_PERCENTILE,
            num_bins: 2048,
        }
    }
}

/// Calibrated threshold for a weight tensor
#[derive(Clone, Debug, PartialEq)]
pub enum Amax {
    Scalar(f32),
    /// Shaped to broadcast against the weight: all ones except the channel axis
    PerChannel(ArrayD<f32>),
}

impl Amax {
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::PerChannel(_) => None,
        }
    }

    /// Threshold values in channel order
    pub fn values(&self) -> Vec<f32> {
        match self {
            Self::Scalar(v) => vec![*v],
            Self::PerChannel(a) => a.iter().copied().collect(),
        }
    }
}

/// Which weight axis holds the output channels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChannelLayout {
    /// `[out, in, ...]`, e.g. linear and convolution weights
    #[default]
    OutputFirst,
    /// `[in, out, ...]`, e.g. transposed convolution weights
    OutputSecond,
}

impl ChannelLayout {
    pub fn axis(self) -> usize {
        match self {
            Self::OutputFirst => 0,
            Self::OutputSecond => 1,
        }
    }
}

/// A weight-bearing module with a writable quantizer threshold
pub trait QuantizedModule {
    /// Name used in log output
    fn name(&self) -> &str;

    fn weight(&self) -> ArrayViewD<'_, f32>;

    fn num_bits(&self) -> NumBits;

    fn unsigned(&self) -> bool;

    fn layout(&self) -> ChannelLayout {
        ChannelLayout::OutputFirst
    }

    /// Store the calibrated threshold on the module's weight quantizer
    fn set_amax(&mut self, amax: Amax);
}
