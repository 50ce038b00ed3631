//! KL-divergence (entropy) threshold search

use crate::quant::fake_quantize::NumBits;
use crate::quant::histogram::Histogram;
use crate::{CalibError, Result};

use super::types::SearchParams;

/// Returns the bin edge that minimizes KL divergence of the collected histogram.
///
/// For each candidate cut `i`, the reference distribution is the first `i`
/// bins with the tail mass folded into bin `i - 1`. The candidate distribution
/// merges those `i` bins into `2^(bits - 1 + unsigned)` groups and spreads
/// each group's mass evenly over its non-empty bins. Ties go to the largest cut.
///
/// Returns `Ok(None)` when no histogram has been collected.
pub fn compute_amax_entropy(
    hist: Option<&Histogram>,
    num_bits: NumBits,
    unsigned: bool,
    params: &SearchParams,
) -> Result<Option<f32>> {
    let Some(hist) = hist else {
        return Ok(None);
    };

    let bits = num_bits.as_integer().ok_or_else(|| CalibError::UnsupportedMethod {
        method: "entropy".into(),
        context: format!("float num_bits {num_bits}"),
    })?;
    num_bits.validate()?;
    params.validate()?;

    // Bin 0 collects the zero-valued mass; level it with bin 1.
    let mut bins = hist.counts().to_vec();
    if bins.len() > 1 {
        bins[0] = bins[1];
    }
    let total: u64 = bins.iter().sum();
    let levels = 1usize << (bits - 1 + u32::from(unsigned));

    let stop = bins.len();
    let candidates: Vec<usize> = (params.start_bin..=stop)
        .step_by(params.stride)
        .filter(|&i| i > 0)
        .collect();
    if candidates.is_empty() {
        return Err(CalibError::NoCandidates { start_bin: params.start_bin, len: stop });
    }

    let mut best: Option<(usize, f64)> = None;
    for &i in &candidates {
        let divergence = candidate_divergence(&bins, i, levels, total)?;
        if divergence.is_nan() {
            continue;
        }
        // `<=` so the last minimum wins
        if best.map_or(true, |(_, d)| divergence <= d) {
            best = Some((i, divergence));
        }
    }

    let cut = best.map_or(candidates[candidates.len() - 1], |(i, _)| i);
    Ok(Some(hist.edges()[cut]))
}

/// KL(reference || quantized) for a cut at bin `i`
fn candidate_divergence(bins: &[u64], i: usize, levels: usize, total: u64) -> Result<f64> {
    let tail: u64 = bins[i..].iter().sum();

    // space = linspace(0, i, levels + 1)
    let step = i as f64 / levels as f64;
    let mut space: Vec<f64> = (0..=levels).map(|k| k as f64 * step).collect();
    space[levels] = i as f64;

    let groups: Vec<Option<usize>> = (0..i)
        .map(|j| {
            if bins[j] == 0 {
                None
            } else {
                let j = j as f64;
                Some(space.partition_point(|&s| s <= j) - 1)
            }
        })
        .collect();

    let mut group_mass = vec![0.0f64; levels];
    let mut group_bins = vec![0usize; levels];
    for (j, group) in groups.iter().enumerate() {
        if let Some(g) = *group {
            group_mass[g] += bins[j] as f64;
            group_bins[g] += 1;
        }
    }

    let quantized: Vec<f64> = groups
        .iter()
        .map(|group| group.map_or(0.0, |g| group_mass[g] / group_bins[g] as f64))
        .collect();

    let mut reference: Vec<f64> = bins[..i].iter().map(|&c| c as f64).collect();
    reference[i - 1] += tail as f64;

    let total_new = quantized.iter().sum::<f64>() + tail as f64;
    let total_old = reference.iter().sum::<f64>();
    if total_new.round() != total as f64 || total_old.round() != total as f64 {
        return Err(CalibError::Internal(format!(
            "Count mismatch! total_counts_new={total_new}, total_counts_old={total_old}, total_data={total}"
        )));
    }

    Ok(kl_divergence(&reference, &quantized))
}

/// Relative entropy of `p` against `q` after normalizing both.
///
/// Terms with `p == 0` contribute 0; `p > 0` against `q == 0` is infinite.
/// An all-zero side yields NaN.
pub(crate) fn kl_divergence(p: &[f64], q: &[f64]) -> f64 {
    let p_sum: f64 = p.iter().sum();
    let q_sum: f64 = q.iter().sum();
    if p_sum == 0.0 || q_sum == 0.0 {
        return f64::NAN;
    }

    p.iter()
        .zip(q)
        .map(|(&pi, &qi)| {
            let pi = pi / p_sum;
            let qi = qi / q_sum;
            if pi == 0.0 {
                0.0
            } else if qi == 0.0 {
                f64::INFINITY
            } else {
                pi * (pi / qi).ln()
            }
        })
        .sum()
}
