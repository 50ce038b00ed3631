//! PTQ Histogram Calibration
//!
//! Collects a histogram of absolute activation values over many batches and
//! derives the clipping threshold from it:
//! - Entropy: minimize KL divergence to the quantized histogram
//! - MSE: minimize fake-quantization error
//! - Percentile: clip a fixed fraction of the mass
//!
//! Only per-tensor collection is supported. Histograms are local to one
//! process; results under a process group carry an advisory diagnostic.

mod calibrator;
mod distributed;
mod helpers;
mod types;


pub use calibrator::HistogramCalibrator;
pub use distributed::{ProcessGroup, SingleProcess};
pub use helpers::{calibrate_batches, calibrate_percentile};
pub use types::{Calibration, CalibratorConfig, Diagnostic};
