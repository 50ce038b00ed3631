//! Mean-squared-error threshold search

use crate::quant::fake_quantize::{simulate, NumBits};
use crate::quant::histogram::Histogram;
use crate::{CalibError, Result};

use super::types::SearchParams;

/// Returns the bin center that minimizes counts-weighted MSE of fake quantization.
///
/// Every bin center is fake-quantized at each candidate threshold
/// `centers[i]`; the score is `mean((q(c) - c)^2 * count)`. The first
/// minimum wins.
///
/// Returns `Ok(None)` when no histogram has been collected.
pub fn compute_amax_mse(
    hist: Option<&Histogram>,
    num_bits: NumBits,
    unsigned: bool,
    params: &SearchParams,
) -> Result<Option<f32>> {
    let Some(hist) = hist else {
        return Ok(None);
    };
    num_bits.validate()?;
    params.validate()?;

    let centers = hist.centers();
    let counts: Vec<f64> = hist.counts().iter().map(|&c| c as f64).collect();

    let candidates: Vec<usize> = (params.start_bin..centers.len()).step_by(params.stride).collect();
    if candidates.is_empty() {
        return Err(CalibError::NoCandidates { start_bin: params.start_bin, len: centers.len() });
    }

    let mut best: Option<(usize, f64)> = None;
    for &i in &candidates {
        let quantized = simulate(&centers, centers[i], num_bits, unsigned)?;
        let mse = weighted_mse(&centers, &quantized, &counts);
        if best.map_or(true, |(_, m)| mse < m) {
            best = Some((i, mse));
        }
    }

    let best_idx = best.map_or(candidates[0], |(i, _)| i);
    Ok(Some(centers[best_idx]))
}

fn weighted_mse(centers: &[f32], quantized: &[f32], counts: &[f64]) -> f64 {
    let sum: f64 = centers
        .iter()
        .zip(quantized)
        .zip(counts)
        .map(|((&c, &q), &n)| {
            let err = f64::from(q - c);
            err * err * n
        })
        .sum();
    sum / centers.len() as f64
}
