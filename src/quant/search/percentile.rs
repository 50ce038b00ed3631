//! Percentile threshold search

use crate::quant::histogram::Histogram;
use crate::{CalibError, Result};

/// Returns the bin edge that clips `percentile` percent of the collected mass.
///
/// Picks the smallest index whose cumulative fraction reaches
/// `percentile / 100` and returns the edge at that index. The percentile is
/// validated before the histogram is inspected.
pub fn compute_amax_percentile(hist: Option<&Histogram>, percentile: f64) -> Result<Option<f32>> {
    if !(0.0..=100.0).contains(&percentile) {
        return Err(CalibError::InvalidPercentile(percentile));
    }
    let Some(hist) = hist else {
        return Ok(None);
    };

    let total = hist.total();
    if total == 0 {
        return Ok(Some(hist.edges()[0]));
    }

    let target = percentile / 100.0;
    let mut cumulative: u64 = 0;
    let idx = hist
        .counts()
        .iter()
        .position(|&c| {
            cumulative += c;
            cumulative as f64 / total as f64 >= target
        })
        .unwrap_or(hist.num_bins());

    Ok(Some(hist.edges()[idx]))
}
