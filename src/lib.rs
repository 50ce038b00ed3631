//! amax-calib: histogram calibration for post-training quantization
//!
//! Derives the clipping threshold ("amax") that maps floating-point tensors
//! onto a low-bit integer grid:
//! - Incremental histogram collection over streamed activation batches
//! - Threshold search by KL divergence, MSE, or percentile
//! - One-shot per-channel weight calibration
//!
//! # Example
//!
//! ```
//! use amax_calib::quant::{CalibratorConfig, HistogramCalibrator, SearchMethod, SearchParams};
//!
//! let mut calibrator = HistogramCalibrator::new(CalibratorConfig::default()).unwrap();
//! calibrator.collect(&[-1.0, 0.5, 2.0, 2.0, 3.0]).unwrap();
//!
//! let params = SearchParams { start_bin: 0, ..SearchParams::default() };
//! let result = calibrator.compute_amax(&SearchMethod::Percentile(100.0), &params).unwrap();
//! assert!(result.amax.is_some());
//! ```

pub mod error;
pub mod quant;

pub use error::{CalibError, Result};
