//! Fundamental frequency tracking over a collection of Partials.
//!
//! At each query time the Partials that are sounding above an amplitude
//! floor contribute one spectral peak each (sinusoidal amplitude and
//! frequency), and [`F0Estimate`] picks the most likely fundamental.

use crate::f0::F0Estimate;
use parcial_core::{Error, LinearEnvelope, Partial, Result, SHORTEST_SAFE_FADE_TIME, partial_utils};
use tracing::debug;

/// Default refinement precision in Hz.
pub const DEFAULT_PRECISION: f64 = 0.1;

/// Default amplitude floor in dB relative to a full-scale sinusoid.
pub const DEFAULT_AMP_FLOOR_DB: f64 = -60.0;

/// Fundamental frequency estimator for sets of Partials.
///
/// # Example
///
/// ```rust
/// use parcial_analysis::FundamentalFromPartials;
/// use parcial_core::{Breakpoint, Partial};
///
/// let partials: Vec<Partial> = [200.0, 400.0, 600.0]
///     .iter()
///     .map(|&f| {
///         let mut p = Partial::new();
///         p.insert(0.0, Breakpoint::new(f, 0.1, 0.0, 0.0));
///         p.insert(1.0, Breakpoint::new(f, 0.1, 0.0, 0.0));
///         p
///     })
///     .collect();
///
/// let tracker = FundamentalFromPartials::default();
/// let est = tracker.estimate_at(&partials, 0.5, 150.0, 300.0).unwrap();
/// assert!((est.frequency() - 200.0).abs() < 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundamentalFromPartials {
    precision: f64,
    amp_floor_db: f64,
}

impl Default for FundamentalFromPartials {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            amp_floor_db: DEFAULT_AMP_FLOOR_DB,
        }
    }
}

impl FundamentalFromPartials {
    /// Create a tracker refining estimates to `precision` Hz.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `precision` is not positive.
    pub fn new(precision: f64) -> Result<Self> {
        if precision.is_nan() || precision <= 0.0 {
            return Err(Error::invalid_argument("F0 precision must be positive"));
        }
        Ok(Self {
            precision,
            ..Self::default()
        })
    }

    /// Set the amplitude floor in dB. Partials at or below it are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] unless `db` is negative.
    pub fn with_amp_floor(mut self, db: f64) -> Result<Self> {
        if db.is_nan() || db >= 0.0 {
            return Err(Error::invalid_argument(
                "amplitude floor must be negative dB relative to a full-scale sinusoid",
            ));
        }
        self.amp_floor_db = db;
        Ok(self)
    }

    /// Refinement precision in Hz.
    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// Amplitude floor in dB.
    pub fn amp_floor_db(&self) -> f64 {
        self.amp_floor_db
    }

    /// Amplitude floor as a linear amplitude.
    pub fn amp_floor(&self) -> f64 {
        10f64.powf(self.amp_floor_db / 20.0)
    }

    /// Sinusoidal amplitudes and frequencies of the Partials sounding at `t`.
    pub fn collect_peaks(&self, partials: &[Partial], t: f64) -> (Vec<f64>, Vec<f64>) {
        let floor = self.amp_floor();
        partials
            .iter()
            .filter_map(|p| {
                let a = p.amplitude_at_with_fade(t, SHORTEST_SAFE_FADE_TIME);
                (a > floor).then(|| {
                    let bw = p.bandwidth_at(t).clamp(0.0, 1.0);
                    ((1.0 - bw).sqrt() * a, p.frequency_at(t))
                })
            })
            .unzip()
    }

    /// Estimate the fundamental at time `t` within `[fmin, fmax]`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if no Partial is above the floor at `t`.
    /// - [`Error::NoCandidate`] if the estimate lies within `precision` of
    ///   the range boundary, or no candidate lies in range.
    pub fn estimate_at(
        &self,
        partials: &[Partial],
        t: f64,
        fmin: f64,
        fmax: f64,
    ) -> Result<F0Estimate> {
        let (amps, freqs) = self.collect_peaks(partials, t);
        if amps.is_empty() {
            return Err(Error::invalid_argument(format!(
                "no Partial has significant energy at {t} s"
            )));
        }
        self.estimate(&amps, &freqs, fmin, fmax)
    }

    fn estimate(&self, amps: &[f64], freqs: &[f64], fmin: f64, fmax: f64) -> Result<F0Estimate> {
        let (lo, hi) = if fmin > fmax { (fmax, fmin) } else { (fmin, fmax) };
        let est = F0Estimate::new(amps, freqs, lo, hi, self.precision)?;
        // an estimate pinned to the range edge is the edge, not a peak
        let f = est.frequency();
        if f - lo < self.precision || hi - f < self.precision {
            return Err(Error::no_candidate(format!(
                "estimate {f:.3} Hz lies on the boundary of [{lo}, {hi}]"
            )));
        }
        Ok(est)
    }

    /// Build an envelope of fundamental estimates sampled every `interval`
    /// seconds from `t0` to `t1` inclusive.
    ///
    /// Times where nothing is sounding, or where no reliable estimate exists,
    /// are skipped.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `interval` is not positive and
    ///   finite, or either end of the span is not finite.
    /// - [`Error::NoCandidate`] if no time produced an estimate.
    pub fn build_envelope(
        &self,
        partials: &[Partial],
        t0: f64,
        t1: f64,
        interval: f64,
        fmin: f64,
        fmax: f64,
    ) -> Result<LinearEnvelope> {
        if !interval.is_finite() || interval <= 0.0 {
            return Err(Error::invalid_argument("F0 sample interval must be positive"));
        }
        if !t0.is_finite() || !t1.is_finite() {
            return Err(Error::invalid_argument(format!(
                "F0 span must be finite, got {t0} to {t1} s"
            )));
        }
        let (t0, t1) = if t0 > t1 { (t1, t0) } else { (t0, t1) };

        let mut env = LinearEnvelope::new();
        let mut step = 0.0_f64;
        loop {
            let t = t0 + step * interval;
            if t > t1 {
                break;
            }
            let (amps, freqs) = self.collect_peaks(partials, t);
            if !amps.is_empty() {
                match self.estimate(&amps, &freqs, fmin, fmax) {
                    Ok(est) => env.insert(t, est.frequency()),
                    Err(e) => debug!("f0 at {t:.4} s skipped: {e}"),
                }
            }
            step += 1.0;
        }

        if env.is_empty() {
            return Err(Error::no_candidate(format!(
                "no reliable fundamental estimate between {t0} and {t1} s"
            )));
        }
        debug!("f0 envelope: {} estimates over {t0:.3}..{t1:.3} s", env.len());
        Ok(env)
    }

    /// [`build_envelope`](Self::build_envelope) over the time span of all
    /// the Partials.
    ///
    /// # Errors
    ///
    /// As [`build_envelope`](Self::build_envelope); also
    /// [`Error::InvalidArgument`] if every Partial is empty.
    pub fn build_envelope_over_span(
        &self,
        partials: &[Partial],
        interval: f64,
        fmin: f64,
        fmax: f64,
    ) -> Result<LinearEnvelope> {
        let (t0, t1) = partial_utils::time_span(partials)
            .ok_or_else(|| Error::invalid_argument("no Breakpoints to estimate from"))?;
        self.build_envelope(partials, t0, t1, interval, fmin, fmax)
    }
}
