//! One-shot weight calibration
//!
//! Weights are seen once, so each channel slice gets its own fresh histogram
//! over `[0, max|slice|]` instead of going through the incremental collector.

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};

use crate::quant::fake_quantize::NumBits;
use crate::quant::histogram::Histogram;
use crate::quant::search::{search, SearchMethod, SearchParams};
use crate::{CalibError, Result};

use super::types::{Amax, QuantizedModule, WeightCalibrationConfig, WeightMethod};

/// Calibrate one weight tensor.
///
/// With `axis = None` the whole tensor yields a scalar. Otherwise each
/// `index_axis(axis, c)` slice yields one threshold and the result is shaped
/// to broadcast against `weight`; a single channel collapses to a scalar.
pub fn calibrate_weight(
    weight: ArrayViewD<'_, f32>,
    num_bits: NumBits,
    unsigned: bool,
    config: &WeightCalibrationConfig,
    axis: Option<usize>,
) -> Result<Amax> {
    num_bits.validate()?;
    if config.method == WeightMethod::Percentile && !(0.0..=100.0).contains(&config.percentile) {
        return Err(CalibError::InvalidPercentile(config.percentile));
    }
    if config.method != WeightMethod::Max && config.num_bins == 0 {
        return Err(CalibError::Config("num_bins must be > 0".into()));
    }
    if let Some((index, &value)) = weight.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(CalibError::NonFiniteInput { index, value });
    }

    let Some(axis) = axis else {
        let values: Vec<f32> = weight.iter().map(|v| v.abs()).collect();
        return slice_amax(&values, num_bits, unsigned, config).map(Amax::Scalar);
    };

    let ndim = weight.ndim();
    if axis >= ndim {
        return Err(CalibError::AxisOutOfRange { axis, ndim });
    }

    let amaxes = weight
        .axis_iter(Axis(axis))
        .map(|slice| {
            let values: Vec<f32> = slice.iter().map(|v| v.abs()).collect();
            slice_amax(&values, num_bits, unsigned, config)
        })
        .collect::<Result<Vec<f32>>>()?;

    if amaxes.len() == 1 {
        return Ok(Amax::Scalar(amaxes[0]));
    }

    let mut shape = vec![1; ndim];
    shape[axis] = amaxes.len();
    let amax = ArrayD::from_shape_vec(IxDyn(&shape), amaxes)
        .map_err(|e| CalibError::Internal(format!("per-channel amax reshape: {e}")))?;
    Ok(Amax::PerChannel(amax))
}

/// Calibrate every module and store each result through `set_amax`
pub fn calibrate_weights(
    modules: &mut [&mut dyn QuantizedModule],
    config: &WeightCalibrationConfig,
) -> Result<()> {
    for module in modules.iter_mut() {
        let axis = config.per_channel.then(|| module.layout().axis());
        let amax = calibrate_weight(module.weight(), module.num_bits(), module.unsigned(), config, axis)?;
        tracing::debug!(
            module = module.name(),
            method = %config.method,
            ?axis,
            channels = amax.values().len(),
            "calibrated weight amax"
        );
        module.set_amax(amax);
    }
    Ok(())
}

/// Threshold for one slice of absolute values
fn slice_amax(
    values: &[f32],
    num_bits: NumBits,
    unsigned: bool,
    config: &WeightCalibrationConfig,
) -> Result<f32> {
    let max = values.iter().copied().fold(0.0f32, f32::max);
    let method = match config.method {
        WeightMethod::Max => return Ok(max),
        WeightMethod::Mse => SearchMethod::Mse,
        WeightMethod::Percentile => SearchMethod::Percentile(config.percentile),
    };
    if max == 0.0 {
        return Ok(0.0);
    }

    let mut hist = Histogram::uniform(max, config.num_bins)?;
    hist.accumulate(values);

    search(Some(&hist), num_bits, unsigned, &method, &SearchParams::default())?
        .ok_or_else(|| CalibError::Internal("threshold search returned no amax".into()))
}
