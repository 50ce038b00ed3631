//! Histogram calibrator implementation
//!
//! The `HistogramCalibrator` accumulates a histogram of absolute values over
//! many batches and derives amax from it on demand.

use std::fmt;

use ndarray::{ArrayBase, Data, Dimension};

use crate::quant::fake_quantize::NumBits;
use crate::quant::histogram::Histogram;
use crate::quant::search::{search, SearchMethod, SearchParams};
use crate::{CalibError, Result};

use super::distributed::{ProcessGroup, SingleProcess};
use super::types::{Calibration, CalibratorConfig, Diagnostic};

/// Collected state. Edges are set by the first batch with a non-zero max.
#[derive(Clone, Debug, PartialEq)]
enum CollectorState {
    Empty,
    /// Only zeros seen so far; they land in bin 0 once edges exist
    Zeros(u64),
    Histogram(Histogram),
}

/// Histogram calibrator for per-tensor amax
#[derive(Clone, Debug)]
pub struct HistogramCalibrator {
    config: CalibratorConfig,
    state: CollectorState,
    /// Number of batches that contributed values
    num_batches: usize,
}

impl HistogramCalibrator {
    /// Create a calibrator. Fails if `config.axis` is set.
    pub fn new(config: CalibratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, state: CollectorState::Empty, num_batches: 0 })
    }

    /// Collect one batch of values into the histogram.
    ///
    /// Values are counted by magnitude. A batch containing NaN or infinity is
    /// rejected without touching the collected state.
    pub fn collect(&mut self, batch: &[f32]) -> Result<()> {
        if let Some((index, &value)) = batch.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(CalibError::NonFiniteInput { index, value });
        }

        let skip_zeros = self.config.skip_zeros;
        let values: Vec<f32> =
            batch.iter().map(|v| v.abs()).filter(|&v| !(skip_zeros && v == 0.0)).collect();
        if values.is_empty() {
            return Ok(());
        }
        let max = values.iter().copied().fold(0.0f32, f32::max);

        let pending_zeros = match &self.state {
            CollectorState::Empty => Some(0),
            CollectorState::Zeros(n) => Some(*n),
            CollectorState::Histogram(_) => None,
        };

        match pending_zeros {
            Some(pending) if max == 0.0 => {
                self.state = CollectorState::Zeros(pending + values.len() as u64);
            }
            Some(pending) => {
                let hist = self.first_histogram(max, &values, pending)?;
                self.state = CollectorState::Histogram(hist);
            }
            None => {
                if let CollectorState::Histogram(hist) = &mut self.state {
                    if max > hist.upper() {
                        let old_bins = hist.num_bins();
                        let appended = hist.extend_to(max)?;
                        tracing::debug!(
                            old_bins,
                            new_bins = hist.num_bins(),
                            appended,
                            upper = hist.upper(),
                            "extended calibration histogram range"
                        );
                    }
                    hist.accumulate(&values);
                }
            }
        }

        self.num_batches += 1;
        Ok(())
    }

    /// Collect a tensor of any shape
    pub fn collect_array<S, D>(&mut self, x: &ArrayBase<S, D>) -> Result<()>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        match x.as_slice_memory_order() {
            Some(slice) => self.collect(slice),
            None => self.collect(&x.iter().copied().collect::<Vec<_>>()),
        }
    }

    /// Discard the collected histogram
    pub fn reset(&mut self) {
        self.state = CollectorState::Empty;
        self.num_batches = 0;
    }

    /// Compute amax from the collected histogram, assuming a single process
    pub fn compute_amax(&self, method: &SearchMethod, params: &SearchParams) -> Result<Calibration> {
        self.compute_amax_in(&SingleProcess, method, params)
    }

    /// Compute amax, flagging runs under an initialized process group.
    ///
    /// Histograms are never synchronized across workers.
    pub fn compute_amax_in(
        &self,
        group: &dyn ProcessGroup,
        method: &SearchMethod,
        params: &SearchParams,
    ) -> Result<Calibration> {
        let mut diagnostics = Vec::new();
        if group.is_initialized() {
            let diagnostic = Diagnostic::UnsynchronizedDistributed;
            tracing::warn!("{diagnostic}");
            diagnostics.push(diagnostic);
        }

        let (num_bits, unsigned) = (self.config.num_bits, self.config.unsigned);
        let amax = match &self.state {
            CollectorState::Empty => search(None, num_bits, unsigned, method, params)?,
            CollectorState::Zeros(_) => {
                search(None, num_bits, unsigned, method, params)?;
                diagnostics.push(Diagnostic::ZeroOnlyData);
                Some(0.0)
            }
            CollectorState::Histogram(hist) => search(Some(hist), num_bits, unsigned, method, params)?,
        };

        Ok(Calibration { amax, diagnostics })
    }

    /// Collected histogram, if edges have been established
    pub fn histogram(&self) -> Option<&Histogram> {
        match &self.state {
            CollectorState::Histogram(hist) => Some(hist),
            _ => None,
        }
    }

    /// Total number of values counted so far (including pending zeros)
    pub fn num_values(&self) -> u64 {
        match &self.state {
            CollectorState::Empty => 0,
            CollectorState::Zeros(n) => *n,
            CollectorState::Histogram(hist) => hist.total(),
        }
    }

    pub fn num_batches(&self) -> usize {
        self.num_batches
    }

    pub fn has_data(&self) -> bool {
        self.state != CollectorState::Empty
    }

    pub fn num_bits(&self) -> NumBits {
        self.config.num_bits
    }

    pub fn unsigned(&self) -> bool {
        self.config.unsigned
    }

    pub fn config(&self) -> &CalibratorConfig {
        &self.config
    }

    fn first_histogram(&self, max: f32, values: &[f32], pending_zeros: u64) -> Result<Histogram> {
        let mut hist = Histogram::uniform(max, self.config.num_bins)?;
        hist.accumulate(values);
        if pending_zeros > 0 {
            hist.add_to_bin(0, pending_zeros);
        }
        tracing::debug!(
            num_bins = hist.num_bins(),
            upper = hist.upper(),
            pending_zeros,
            "created calibration histogram"
        );
        Ok(hist)
    }
}

impl fmt::Display for HistogramCalibrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HistogramCalibrator(calib_bin_edges=")?;
        match self.histogram() {
            None => write!(f, "None")?,
            Some(hist) => {
                let edges = hist.edges();
                write!(f, "[{:.3}, ..., {:.3}]({})", edges[0], hist.upper(), edges.len())?;
            }
        }
        write!(f, ")")
    }
}
