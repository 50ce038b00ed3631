//! Calibration histogram
//!
//! A histogram over absolute values whose range grows on demand:
//! - Initial range `[0, max]` split into a fixed number of bins
//! - New bins of the original width appended when a batch exceeds the range
//! - Previously collected counts preserved exactly as a prefix

#[allow(clippy::module_inception)]
mod histogram;


pub use histogram::{Histogram, MAX_BINS};
