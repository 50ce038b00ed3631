//! Per-channel Weight Calibration
//!
//! One-shot thresholds for weight tensors:
//! - **Max**: raw absolute maximum per channel
//! - **MSE** / **Percentile**: histogram search per channel slice
//!
//! Per-channel results are shaped to broadcast against the weight along its
//! output-channel axis.

mod driver;
mod types;

pub use driver::{calibrate_weight, calibrate_weights};
pub use types::{Amax, ChannelLayout, QuantizedModule, WeightCalibrationConfig, WeightMethod};
