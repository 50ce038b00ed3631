//! Convenience functions for one-shot histogram calibration

use crate::quant::search::{SearchMethod, SearchParams};
use crate::Result;

use super::calibrator::HistogramCalibrator;
use super::types::CalibratorConfig;

/// Collect every batch into a fresh calibrator and compute amax with `method`
pub fn calibrate_batches<'a, I>(
    batches: I,
    config: CalibratorConfig,
    method: &SearchMethod,
    params: &SearchParams,
) -> Result<Option<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut calibrator = HistogramCalibrator::new(config)?;
    for batch in batches {
        calibrator.collect(batch)?;
    }
    Ok(calibrator.compute_amax(method, params)?.amax)
}

/// Convenience function for percentile calibration of a single tensor
pub fn calibrate_percentile(
    data: &[f32],
    config: CalibratorConfig,
    percentile: f64,
) -> Result<Option<f32>> {
    calibrate_batches(
        [data],
        config,
        &SearchMethod::Percentile(percentile),
        &SearchParams::default(),
    )
}
