//! Quantization: PTQ amax calibration
//!
//! - Fake quantization used to score candidate thresholds
//! - Resizable histogram of absolute values
//! - Entropy, MSE and percentile threshold search
//! - Incremental histogram calibrator for activations
//! - One-shot per-channel weight calibration

pub mod calibration;
pub mod fake_quantize;
pub mod histogram;
pub mod search;
pub mod weights;

pub use calibration::{
    calibrate_batches, calibrate_percentile, Calibration, CalibratorConfig, Diagnostic,
    HistogramCalibrator, ProcessGroup, SingleProcess,
};
pub use fake_quantize::{
    fake_tensor_quant, scaled_float_quant, simulate, FloatFormat, NumBits, ZERO_AMAX_EPSILON,
};
pub use histogram::Histogram;
pub use search::{
    compute_amax_entropy, compute_amax_mse, compute_amax_percentile, search, SearchMethod,
    SearchParams, DEFAULT_PERCENTILE,
};
pub use weights::{
    calibrate_weight, calibrate_weights, Amax, ChannelLayout, QuantizedModule,
    WeightCalibrationConfig, WeightMethod,
};
