//! Re-gridding Partials onto integer multiples of a sample interval.
//!
//! Dense resampling replaces a Partial's Breakpoints by one Breakpoint at
//! every multiple of the interval from the multiple nearest its start to
//! the multiple nearest its end. Sparse resampling moves each existing
//! Breakpoint to its nearest multiple instead. With phase correction on,
//! frequencies of the new Breakpoints are nudged so that the rendered
//! phase follows the stored phases.

use parcial_core::phase::{DEFAULT_MAX_FIX_PERCENT, fix_frequency};
use parcial_core::{Error, LinearEnvelope, Partial, Result, SHORTEST_SAFE_FADE_TIME};
use tracing::debug;

/// Resamples Partials onto a regular time grid.
///
/// # Example
///
/// ```rust
/// use parcial_core::{Breakpoint, Partial};
/// use parcial_transform::Resampler;
///
/// let mut p = Partial::new();
/// p.insert(0.012, Breakpoint::new(100.0, 0.1, 0.0, 0.0));
/// p.insert(0.051, Breakpoint::new(200.0, 0.1, 0.0, 0.0));
///
/// Resampler::new(0.01).unwrap().resample(&mut p);
/// let times: Vec<f64> = p.times().collect();
/// assert_eq!(times.len(), 5);
/// assert!((times[0] - 0.01).abs() < 1e-12);
/// assert!((times[4] - 0.05).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resampler {
    interval: f64,
    phase_correct: bool,
}

impl Resampler {
    /// Create a resampler with the given grid interval in seconds. Phase
    /// correction is off.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] unless `interval` is positive and
    /// finite.
    pub fn new(interval: f64) -> Result<Self> {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(Error::invalid_argument(format!(
                "resampling interval must be positive, got {interval}"
            )));
        }
        Ok(Self {
            interval,
            phase_correct: false,
        })
    }

    /// Builder form of [`set_phase_correct`](Self::set_phase_correct).
    pub fn with_phase_correct(mut self, phase_correct: bool) -> Self {
        self.phase_correct = phase_correct;
        self
    }

    /// Turn phase correction on or off.
    pub fn set_phase_correct(&mut self, phase_correct: bool) {
        self.phase_correct = phase_correct;
    }

    /// Grid interval in seconds.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Whether phase correction is on.
    pub fn phase_correct(&self) -> bool {
        self.phase_correct
    }

    /// Grid index nearest `time`; halves round away from zero.
    fn grid_index(&self, time: f64) -> i64 {
        (time / self.interval).round() as i64
    }

    fn grid_time(&self, index: i64) -> f64 {
        index as f64 * self.interval
    }

    fn finish(&self, p: &mut Partial, resampled: Partial) {
        *p = resampled;
        if self.phase_correct {
            fix_frequency(p, DEFAULT_MAX_FIX_PERCENT);
        }
    }

    /// Dense resampling: one Breakpoint at every grid time across the span.
    ///
    /// Grid times just outside the span get zero amplitude.
    pub fn resample(&self, p: &mut Partial) {
        if p.is_empty() {
            return;
        }
        let mut dense = Partial::with_label(p.label());
        for k in self.grid_index(p.start_time())..=self.grid_index(p.end_time()) {
            let t = self.grid_time(k);
            dense.insert(t, p.parameters_at_with_fade(t, SHORTEST_SAFE_FADE_TIME));
        }
        self.finish(p, dense);
    }

    /// Sparse resampling: move every Breakpoint to its nearest grid time.
    /// When several land on one grid time the last one wins.
    pub fn resample_sparse(&self, p: &mut Partial) {
        if p.is_empty() {
            return;
        }
        let mut sparse = Partial::with_label(p.label());
        for (t, bp) in p.iter() {
            sparse.insert(self.grid_time(self.grid_index(t)), *bp);
        }
        self.finish(p, sparse);
    }

    /// Warped resampling: at every grid time across the span of `timing`,
    /// place `p`'s parameters at source time `timing(t)`.
    ///
    /// Grid times whose source time falls outside `p` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `timing` has no points.
    pub fn resample_at(&self, p: &mut Partial, timing: &LinearEnvelope) -> Result<()> {
        let (Some((first, _)), Some((last, _))) = (timing.iter().next(), timing.iter().last())
        else {
            return Err(Error::invalid_argument("timing envelope has no points"));
        };
        if p.is_empty() {
            return Ok(());
        }
        let (start, end) = (p.start_time(), p.end_time());
        let mut warped = Partial::with_label(p.label());
        for k in self.grid_index(first)..=self.grid_index(last) {
            let t = self.grid_time(k);
            let source = timing.value_at(t);
            if (start..=end).contains(&source) {
                warped.insert(t, p.parameters_at(source));
            }
        }
        self.finish(p, warped);
        Ok(())
    }

    /// Dense-resample every Partial in a collection.
    pub fn resample_all(&self, partials: &mut [Partial]) {
        for p in partials.iter_mut() {
            self.resample(p);
        }
        debug!(
            "resample: {} Partials on a {} s grid (phase correct: {})",
            partials.len(),
            self.interval,
            self.phase_correct
        );
    }

    /// Sparse-resample every Partial in a collection.
    pub fn resample_sparse_all(&self, partials: &mut [Partial]) {
        for p in partials.iter_mut() {
            self.resample_sparse(p);
        }
        debug!("quantize: {} Partials to a {} s grid", partials.len(), self.interval);
    }
}
