//! Fake Quantization
//!
//! Simulates the effect of quantization while keeping values in floating point:
//! - Integer: uniform narrow-range rounding at a given amax
//! - Float micro-formats (E4M3, E5M2): scale to max-normal, round, scale back
//!
//! Only used to score candidate thresholds; nothing here stores quantized data.

mod config;
mod ops;


pub use config::{FloatFormat, NumBits};
pub use ops::{fake_tensor_quant, scaled_float_quant, simulate, ZERO_AMAX_EPSILON};
