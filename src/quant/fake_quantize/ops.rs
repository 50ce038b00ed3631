//! Fake quantization kernels: quantize → dequantize in floating point.
//!
//! Used as the scoring oracle of the MSE threshold search.

use crate::Result;

use super::config::{FloatFormat, NumBits};

/// Amax values at or below this are treated as zero (smallest fp16 subnormal).
pub const ZERO_AMAX_EPSILON: f32 = 1.0 / (1 << 24) as f32;

/// Integer fake quantization with narrow range.
///
/// For signed: levels `[-(2^(b-1) - 1), 2^(b-1) - 1]`.
/// For unsigned: levels `[0, 2^b - 1]`.
/// Rounding is half-to-even. Values beyond `amax` saturate. `bits` must be in
/// `2..=16`; [`simulate`] checks this.
pub fn fake_tensor_quant(values: &[f32], amax: f32, bits: u32, unsigned: bool) -> Vec<f32> {
    let max_bound = ((1u64 << (bits - 1 + u32::from(unsigned))) - 1) as f32;
    let min_bound = if unsigned { 0.0 } else { -max_bound };

    if amax <= ZERO_AMAX_EPSILON {
        return vec![0.0; values.len()];
    }

    let scale = max_bound / amax;
    values
        .iter()
        .map(|&x| (x * scale).round_ties_even().clamp(min_bound, max_bound) / scale)
        .collect()
}

/// Float micro-format fake quantization.
///
/// Values are scaled so that `amax` maps onto the format's largest finite
/// magnitude, rounded to the nearest representable value, then scaled back.
pub fn scaled_float_quant(values: &[f32], amax: f32, format: FloatFormat) -> Result<Vec<f32>> {
    let max_normal = format.max_normal()?;

    if amax <= ZERO_AMAX_EPSILON {
        return Ok(vec![0.0; values.len()]);
    }

    let scale = max_normal / amax;
    Ok(values
        .iter()
        .map(|&x| round_to_format(x * scale, format, max_normal) / scale)
        .collect())
}

/// Dispatch to the simulation matching `num_bits`
pub fn simulate(values: &[f32], amax: f32, num_bits: NumBits, unsigned: bool) -> Result<Vec<f32>> {
    num_bits.validate()?;
    match num_bits {
        NumBits::Integer(bits) => Ok(fake_tensor_quant(values, amax, bits, unsigned)),
        NumBits::Float(format) => scaled_float_quant(values, amax, format),
    }
}

/// Round a scaled value to the nearest representable value of `format`, saturating.
fn round_to_format(x: f32, format: FloatFormat, max_normal: f32) -> f32 {
    let magnitude = x.abs();
    if magnitude == 0.0 {
        return 0.0;
    }
    if magnitude >= max_normal {
        return max_normal.copysign(x);
    }

    // Subnormals share the step of the smallest normal binade.
    let exponent = floor_log2(magnitude).max(format.min_exponent());
    let step = 2.0f32.powi(exponent - format.mantissa_bits as i32);
    let rounded = ((magnitude / step).round_ties_even() * step).min(max_normal);
    rounded.copysign(x)
}

fn floor_log2(magnitude: f32) -> i32 {
    if magnitude < f32::MIN_POSITIVE {
        return f32::MIN_EXP - 1;
    }
    ((magnitude.to_bits() >> 23) & 0xff) as i32 - 127
}
