//! Threshold Search Engine
//!
//! Pure functions from a finished histogram to a clipping threshold:
//! - Entropy: minimize KL divergence between original and quantized histograms
//! - MSE: minimize counts-weighted fake-quantization error over bin centers
//! - Percentile: clip a fixed fraction of the mass
//!
//! All searches return `Ok(None)` when no histogram exists.

mod entropy;
mod mse;
mod percentile;
mod types;

#[cfg(test)]
mod tests;

pub use entropy::compute_amax_entropy;
pub use mse::compute_amax_mse;
pub use percentile::compute_amax_percentile;
pub use types::{SearchMethod, SearchParams, DEFAULT_PERCENTILE};

use crate::quant::fake_quantize::NumBits;
use crate::quant::histogram::Histogram;
use crate::Result;

/// Run the search selected by `method`
pub fn search(
    hist: Option<&Histogram>,
    num_bits: NumBits,
    unsigned: bool,
    method: &SearchMethod,
    params: &SearchParams,
) -> Result<Option<f32>> {
    match method {
        SearchMethod::Entropy => compute_amax_entropy(hist, num_bits, unsigned, params),
        SearchMethod::Mse => compute_amax_mse(hist, num_bits, unsigned, params),
        SearchMethod::Percentile(p) => compute_amax_percentile(hist, *p),
    }
}
