//! Calibration error types
//!
//! Every error is raised synchronously by the call that detects it. Nothing
//! is retried or downgraded to a warning.

use thiserror::Error;

/// Result type alias for calibration operations.
pub type Result<T> = std::result::Result<T, CalibError>;

/// Errors that can occur while collecting histograms or searching for amax.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalibError {
    /// Calibrator or quantizer configuration is not supported.
    #[error("Invalid calibration config: {0}")]
    Config(String),

    #[error("Invalid percentile: {0} (must be in range 0 <= percentile <= 100)")]
    InvalidPercentile(f64),

    #[error("Unknown calibration method: {0}")]
    UnknownMethod(String),

    /// Method is known but cannot be used in this context.
    #[error("Unsupported calibration method '{method}' for {context}")]
    UnsupportedMethod { method: String, context: String },

    #[error("Invalid stride: 0 (must be >= 1)")]
    InvalidStride,

    /// Candidate range of a threshold search is empty.
    #[error("No candidate cut points: start_bin {start_bin} is past histogram length {len}")]
    NoCandidates { start_bin: usize, len: usize },

    #[error("Non-finite value {value} at index {index} in calibration batch")]
    NonFiniteInput { index: usize, value: f32 },

    /// Range growth would need more bins than the histogram allows.
    #[error("Extending histogram range from {upper} to {max} needs more than {limit} bins")]
    HistogramTooLarge { upper: f32, max: f32, limit: usize },

    #[error("Axis {axis} out of range for tensor with {ndim} dimensions")]
    AxisOutOfRange { axis: usize, ndim: usize },

    /// Broken histogram invariant. Indicates a bug, not bad input.
    #[error("Internal calibration error: {0}")]
    Internal(String),
}

impl CalibError {
    /// Check if this error was caused by caller input rather than a defect.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}
