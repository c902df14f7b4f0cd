//! Maximum-likelihood fundamental frequency estimation from spectral peaks.
//!
//! The likelihood of a candidate fundamental `f` given peaks `(a_i, f_i)` is
//!
//! ```text
//! Q(f) = Σ a_i² · cos(2π · f_i / f) / Σ a_i²
//! ```
//!
//! which is 1 when every peak is an exact harmonic of `f`. Candidates are the
//! integer divisors of the peak frequencies that fall in the search range;
//! the highest candidate within 85% of the best likelihood is refined with
//! the secant method on `Q'(f)`.

use parcial_core::{Error, Result};
use std::f64::consts::TAU;
use tracing::{debug, warn};

/// Fraction of the best likelihood a candidate must reach to be chosen.
/// Lower values risk octave errors.
const PEAK_THRESHOLD: f64 = 0.85;

/// Secant iteration cap.
pub const MAX_SECANT_ITERATIONS: usize = 20;

/// Lowest fundamental ever considered, in Hz.
const MIN_FUNDAMENTAL: f64 = 1.0;

/// Highest harmonic number a peak may have relative to a candidate.
/// Peaks further above the search range contribute no candidates.
pub const MAX_HARMONIC: f64 = 1000.0;

/// A fundamental frequency estimate and its likelihood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct F0Estimate {
    frequency: f64,
    confidence: f64,
}

impl F0Estimate {
    /// Estimate the fundamental of peaks with amplitudes `amps` and
    /// frequencies `freqs` within `[fmin, fmax]`.
    ///
    /// A reversed range is swapped and `fmin` is raised to 1 Hz. The
    /// secant refinement stops when its step is smaller than half of
    /// `resolution`. If it diverges, leaves the range, or does not converge
    /// within [`MAX_SECANT_ITERATIONS`], the unrefined candidate is kept.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the slices differ in length, are
    ///   empty, hold a negative or non-finite value, carry no energy, if
    ///   the range is not finite, or `resolution` is not positive.
    /// - [`Error::NoCandidate`] if no peak has an integer divisor in range.
    ///
    /// # Example
    ///
    /// ```rust
    /// use parcial_analysis::F0Estimate;
    ///
    /// let est = F0Estimate::new(&[1.0, 1.0, 1.0], &[200.0, 400.0, 600.0], 90.0, 250.0, 0.1)
    ///     .unwrap();
    /// assert!((est.frequency() - 200.0).abs() < 0.1);
    /// assert!(est.confidence() > 0.99);
    /// ```
    pub fn new(amps: &[f64], freqs: &[f64], fmin: f64, fmax: f64, resolution: f64) -> Result<Self> {
        if amps.len() != freqs.len() {
            return Err(Error::invalid_argument(format!(
                "F0 estimation needs one amplitude per frequency ({} amplitudes, {} frequencies)",
                amps.len(),
                freqs.len()
            )));
        }
        if amps.is_empty() {
            return Err(Error::invalid_argument("F0 estimation needs at least one peak"));
        }
        if resolution.is_nan() || resolution <= 0.0 {
            return Err(Error::invalid_argument("F0 resolution must be positive"));
        }
        if amps.iter().chain(freqs).any(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::invalid_argument(
                "F0 peak amplitudes and frequencies must be finite and non-negative",
            ));
        }
        if !fmin.is_finite() || !fmax.is_finite() {
            return Err(Error::invalid_argument(format!(
                "F0 search range must be finite, got [{fmin}, {fmax}]"
            )));
        }
        let energy: f64 = amps.iter().map(|a| a * a).sum();
        if energy.is_nan() || energy <= 0.0 {
            return Err(Error::invalid_argument("F0 estimation peaks carry no energy"));
        }

        let (fmin, fmax) = if fmin > fmax { (fmax, fmin) } else { (fmin, fmax) };
        let fmin = fmin.max(MIN_FUNDAMENTAL);

        let candidates = candidate_frequencies(freqs, fmin, fmax);
        if candidates.is_empty() {
            return Err(Error::no_candidate(format!(
                "no peak has an integer divisor between {fmin} and {fmax} Hz"
            )));
        }

        let q: Vec<f64> = candidates
            .iter()
            .map(|&f| likelihood(amps, freqs, f) / energy)
            .collect();
        let best = choose_candidate(&q);
        let candidate = candidates[best];

        debug!(
            "f0: {} candidates in [{fmin}, {fmax}], chose {candidate:.3} Hz (Q = {:.4})",
            candidates.len(),
            q[best]
        );

        let frequency = match secant_refine(amps, freqs, candidate, 0.5 * resolution) {
            Ok(f) if (fmin..=fmax).contains(&f) => {
                // a root of Q' can also be a trough
                if likelihood(amps, freqs, f) >= likelihood(amps, freqs, candidate) {
                    f
                } else {
                    candidate
                }
            }
            Ok(f) => {
                warn!("f0: refinement left [{fmin}, {fmax}] at {f:.3} Hz, keeping {candidate:.3} Hz");
                candidate
            }
            Err(e) => {
                warn!("f0: {e}, keeping {candidate:.3} Hz");
                candidate
            }
        };

        Ok(Self {
            frequency,
            confidence: likelihood(amps, freqs, frequency) / energy,
        })
    }

    /// Estimated fundamental in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Normalized likelihood at the estimate; 1.0 is a perfect harmonic fit.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Normalized likelihood `Q(f)` of fundamental `f` for the given peaks.
///
/// Returns 0 when the peaks carry no energy.
pub fn normalized_likelihood(amps: &[f64], freqs: &[f64], f: f64) -> f64 {
    let energy: f64 = amps.iter().map(|a| a * a).sum();
    if energy > 0.0 {
        likelihood(amps, freqs, f) / energy
    } else {
        0.0
    }
}

/// Unnormalized `Σ a² cos(2π f_i / f)`.
fn likelihood(amps: &[f64], freqs: &[f64], f: f64) -> f64 {
    amps.iter()
        .zip(freqs)
        .map(|(a, fi)| a * a * (TAU * fi / f).cos())
        .sum()
}

/// Derivative of the unnormalized likelihood with respect to `f`.
fn likelihood_slope(amps: &[f64], freqs: &[f64], f: f64) -> f64 {
    amps.iter()
        .zip(freqs)
        .map(|(a, fi)| {
            let arg = TAU * fi / f;
            a * a * arg.sin() * arg / f
        })
        .sum()
}

/// Sorted integer divisors of each peak frequency within `[fmin, fmax]`,
/// up to [`MAX_HARMONIC`]. Frequencies are finite and `fmin` is positive.
fn candidate_frequencies(freqs: &[f64], fmin: f64, fmax: f64) -> Vec<f64> {
    let mut out = Vec::new();
    for &peak in freqs.iter().filter(|f| **f >= fmin) {
        let first = (peak / fmax).ceil().max(1.0);
        let last = (peak / fmin).floor().min(MAX_HARMONIC);
        let mut div = first;
        while div <= last {
            let f = peak / div;
            if (fmin..=fmax).contains(&f) {
                out.push(f);
            }
            div += 1.0;
        }
    }
    out.sort_by(f64::total_cmp);
    out
}

/// Index of the highest-frequency candidate whose likelihood reaches the
/// threshold. `q` is non-empty and ordered by candidate frequency.
fn choose_candidate(q: &[f64]) -> usize {
    let max = q.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let threshold = PEAK_THRESHOLD * max;
    q.iter().rposition(|&v| v >= threshold).unwrap_or(q.len() - 1)
}

/// Secant-method root of `Q'(f)` starting from `start` and `0.98 · start`.
fn secant_refine(amps: &[f64], freqs: &[f64], start: f64, precision: f64) -> Result<f64> {
    let mut x_prev = 0.98 * start;
    let mut g_prev = likelihood_slope(amps, freqs, x_prev);
    let mut x = start;

    for _ in 0..MAX_SECANT_ITERATIONS {
        let g = likelihood_slope(amps, freqs, x);
        if g == 0.0 {
            return Ok(x);
        }
        let step = g * (x - x_prev) / (g - g_prev);
        if !step.is_finite() {
            return Err(Error::IteratorLimit(format!(
                "secant refinement diverged near {x:.3} Hz"
            )));
        }
        x_prev = x;
        g_prev = g;
        x -= step;
        if step.abs() < precision {
            return Ok(x);
        }
    }
    Err(Error::IteratorLimit(format!(
        "secant refinement did not converge in {MAX_SECANT_ITERATIONS} iterations"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_harmonics() {
        let est = F0Estimate::new(&[1.0, 1.0, 1.0], &[200.0, 400.0, 600.0], 90.0, 250.0, 0.1)
            .unwrap();
        assert!((est.frequency() - 200.0).abs() < 1e-6, "{}", est.frequency());
        assert!((est.confidence() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reversed_range_is_swapped() {
        let a = F0Estimate::new(&[1.0, 0.5], &[150.0, 300.0], 100.0, 200.0, 0.1).unwrap();
        let b = F0Estimate::new(&[1.0, 0.5], &[150.0, 300.0], 200.0, 100.0, 0.1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mistuned_harmonics_refine_between_candidates() {
        // Harmonics of 101 Hz, slightly stretched: refinement lands near 101.
        let freqs = [101.0, 202.2, 303.1, 404.5];
        let amps = [1.0, 0.8, 0.6, 0.4];
        let est = F0Estimate::new(&amps, &freqs, 60.0, 150.0, 0.01).unwrap();
        assert!((est.frequency() - 101.0).abs() < 0.5, "{}", est.frequency());
        assert!(est.confidence() > 0.95);
    }

    #[test]
    fn test_prefers_highest_consistent_candidate() {
        // 100 Hz and 200 Hz both explain the peaks perfectly; pick 200.
        let est = F0Estimate::new(&[1.0, 1.0], &[200.0, 400.0], 50.0, 250.0, 0.1).unwrap();
        assert!((est.frequency() - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_argument_errors() {
        assert!(matches!(
            F0Estimate::new(&[1.0], &[100.0, 200.0], 50.0, 150.0, 0.1),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            F0Estimate::new(&[], &[], 50.0, 150.0, 0.1),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            F0Estimate::new(&[1.0], &[100.0], 50.0, 150.0, 0.0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            F0Estimate::new(&[0.0], &[100.0], 50.0, 150.0, 0.1),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_and_negative_peaks() {
        for (amps, freqs) in [
            ([1.0, 1.0], [200.0, f64::INFINITY]),
            ([1.0, 1.0], [200.0, f64::NAN]),
            ([1.0, f64::INFINITY], [200.0, 400.0]),
            ([1.0, -1.0], [200.0, 400.0]),
            ([1.0, 1.0], [200.0, -400.0]),
        ] {
            assert!(
                matches!(
                    F0Estimate::new(&amps, &freqs, 50.0, 250.0, 0.1),
                    Err(Error::InvalidArgument(_))
                ),
                "amps {amps:?}, freqs {freqs:?}"
            );
        }
        assert!(matches!(
            F0Estimate::new(&[1.0], &[200.0], 50.0, f64::INFINITY, 0.1),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_far_peak_adds_no_candidates() {
        // 1e9 Hz is five million harmonics above 200 Hz
        assert!(candidate_frequencies(&[1e9], 1.0, 250.0).is_empty());
        let est = F0Estimate::new(&[1.0, 1.0, 0.01], &[200.0, 400.0, 1e9], 0.0, 250.0, 0.1)
            .unwrap();
        assert!((est.frequency() - 200.0).abs() < 0.1, "{}", est.frequency());
    }

    #[test]
    fn test_candidates_per_peak_are_bounded() {
        let c = candidate_frequencies(&[5000.0], 1.0, 5000.0);
        assert_eq!(c.len(), MAX_HARMONIC as usize);
        assert_eq!(c[0], 5.0);
    }

    #[test]
    fn test_no_candidate_in_range() {
        // 100 Hz has no integer divisor in [120, 180]
        assert!(matches!(
            F0Estimate::new(&[1.0], &[100.0], 120.0, 180.0, 0.1),
            Err(Error::NoCandidate(_))
        ));
    }

    #[test]
    fn test_candidate_frequencies() {
        let c = candidate_frequencies(&[600.0], 90.0, 250.0);
        assert_eq!(c, vec![100.0, 120.0, 150.0, 200.0]);
        assert!(candidate_frequencies(&[50.0], 90.0, 250.0).is_empty());
    }

    #[test]
    fn test_normalized_likelihood() {
        assert!((normalized_likelihood(&[1.0, 1.0], &[100.0, 200.0], 100.0) - 1.0).abs() < 1e-12);
        // 150 Hz: cos(2π·2/3) and cos(2π·4/3) are both -1/2
        assert!((normalized_likelihood(&[1.0, 1.0], &[100.0, 200.0], 150.0) + 0.5).abs() < 1e-12);
        assert_eq!(normalized_likelihood(&[0.0], &[100.0], 100.0), 0.0);
    }
}
