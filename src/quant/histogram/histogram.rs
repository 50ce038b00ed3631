//! Histogram over absolute values with growable range.

use serde::{Deserialize, Serialize};

use crate::{CalibError, Result};

/// Upper bound on the number of bins, including bins added by extension
pub const MAX_BINS: usize = 1 << 20;

/// Frequency histogram with explicit bin edges.
///
/// Bins are half-open `[edges[i], edges[i+1])` except the last, which also
/// includes its upper edge. The first edge is always `0.0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    edges: Vec<f32>,
    counts: Vec<u64>,
}

impl Histogram {
    /// Empty histogram with `num_bins` equal-width bins over `[0, upper]`
    ///
    /// Edges are `upper * k / num_bins`, last edge pinned to `upper`. When
    /// `upper` is too small for `num_bins` bins of at least `f32::MIN_POSITIVE`
    /// width, the bin count is reduced to the largest that fits (at least 1).
    pub fn uniform(upper: f32, num_bins: usize) -> Result<Self> {
        if num_bins == 0 || num_bins > MAX_BINS {
            return Err(CalibError::Config(format!(
                "num_bins must be in 1..={MAX_BINS}, got {num_bins}"
            )));
        }
        if !(upper.is_finite() && upper > 0.0) {
            return Err(CalibError::Config(format!(
                "histogram upper edge must be finite and > 0, got {upper}"
            )));
        }

        let fit = (f64::from(upper) / f64::from(f32::MIN_POSITIVE)).floor() as usize;
        let num_bins = num_bins.min(fit.max(1));

        let step = f64::from(upper) / num_bins as f64;
        let mut edges: Vec<f32> = (0..=num_bins).map(|k| (k as f64 * step) as f32).collect();
        edges[num_bins] = upper;
        if edges.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(CalibError::Internal(format!(
                "uniform edges over [0, {upper}] with {num_bins} bins are not strictly increasing"
            )));
        }

        Ok(Self { edges, counts: vec![0; num_bins] })
    }

    /// Build from existing parts, checking the length and ordering invariants
    pub fn from_parts(edges: Vec<f32>, counts: Vec<u64>) -> Result<Self> {
        if edges.len() < 2 || counts.len() + 1 != edges.len() {
            return Err(CalibError::Config(format!(
                "histogram needs len(counts) + 1 == len(edges) >= 2, got {} counts and {} edges",
                counts.len(),
                edges.len()
            )));
        }
        if edges[0] != 0.0 {
            return Err(CalibError::Config(format!("first bin edge must be 0, got {}", edges[0])));
        }
        if edges.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(CalibError::Config("bin edges must be strictly increasing".into()));
        }
        Ok(Self { edges, counts })
    }

    pub fn edges(&self) -> &[f32] {
        &self.edges
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    /// Upper edge of the last bin
    pub fn upper(&self) -> f32 {
        self.edges[self.edges.len() - 1]
    }

    /// Width of the first bin, used as the width of appended bins
    pub fn bin_width(&self) -> f32 {
        self.edges[1] - self.edges[0]
    }

    /// Total number of counted values
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Bin centers `(edges[i] + edges[i+1]) / 2`
    pub fn centers(&self) -> Vec<f32> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    /// Bin index of `value`, or `None` when it falls outside the edges
    pub fn bin_index(&self, value: f32) -> Option<usize> {
        let last = self.edges.len() - 1;
        if !(value >= self.edges[0] && value <= self.edges[last]) {
            return None;
        }
        if value == self.edges[last] {
            return Some(last - 1);
        }
        // First edge strictly greater than value, minus one
        Some(self.edges.partition_point(|&e| e <= value) - 1)
    }

    /// Count `values` into the existing bins. Out-of-range values are ignored.
    pub fn accumulate(&mut self, values: &[f32]) {
        for &value in values {
            if let Some(idx) = self.bin_index(value) {
                self.counts[idx] += 1;
            }
        }
    }

    /// Add `count` to bin `idx` directly
    pub(crate) fn add_to_bin(&mut self, idx: usize, count: u64) {
        self.counts[idx] += count;
    }

    /// Append bins of the original width until the range covers `max`.
    ///
    /// Existing bins keep their edges and counts; new bins start empty.
    /// Returns the number of appended bins. Fails without modifying the
    /// histogram if the result would exceed [`MAX_BINS`].
    pub fn extend_to(&mut self, max: f32) -> Result<usize> {
        let upper = self.upper();
        if !(max > upper) {
            return Ok(0);
        }

        let width = self.bin_width();
        let needed = ((f64::from(max) - f64::from(upper)) / f64::from(width)).ceil();
        let room = MAX_BINS.saturating_sub(self.num_bins());
        if !(needed.is_finite() && needed <= room as f64) {
            return Err(CalibError::HistogramTooLarge { upper, max, limit: MAX_BINS });
        }
        let needed = needed as usize;

        let before = self.edges.len();
        for k in 1..=needed.max(1) + 1 {
            if self.upper() >= max {
                break;
            }
            let next = upper + k as f32 * width;
            // Skip edges that collapse below f32 resolution at this magnitude
            if next > self.upper() {
                self.edges.push(next);
            }
        }
        if self.upper() < max {
            self.edges.push(max);
        }

        self.counts.resize(self.edges.len() - 1, 0);
        Ok(self.edges.len() - before)
    }
}
