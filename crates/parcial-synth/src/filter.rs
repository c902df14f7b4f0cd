//! Direct Form II ARMA filter used to band-limit stochastic modulators.
//!
//! The difference equations, with feedback coefficients `ar` and
//! feed-forward coefficients `ma`, are:
//!
//! ```text
//! w[n] = x[n] + ar[1]·w[n-1] + ar[2]·w[n-2] + ...
//! y[n] = gain · (ma[0]·w[n] + ma[1]·w[n-1] + ...)
//! ```
//!
//! Note the sign convention: feedback terms are added, so `ar` holds the
//! negated denominator coefficients of the usual transfer function.
//!
//! # Reference
//!
//! Julius O. Smith III, "Introduction to Digital Filters with Audio
//! Applications", Section: Direct Form II.

use alloc::vec;
use alloc::vec::Vec;
use parcial_core::{Error, Result};

/// Feed-forward coefficients of the third-order Chebyshev lowpass that
/// shapes bandwidth-enhancement noise.
const NOISE_MA: [f64; 4] = [1.0, 3.0, 3.0, 1.0];

/// Feedback coefficients of the noise lowpass.
const NOISE_AR: [f64; 4] = [1.0, 2.9258684252, -2.8580608586, 0.9320209046];

/// Normalization of the noise lowpass: extra scaling over the DC gain.
const NOISE_GAIN: f64 = 6.0 / 4.663939184e4;

/// ARMA filter with its own delay line.
///
/// Cloning copies coefficients and delay-line state.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    ma: Vec<f64>,
    ar: Vec<f64>,
    delay: Vec<f64>,
    gain: f64,
}

impl Filter {
    /// Create a filter from feed-forward and feedback coefficients.
    ///
    /// Coefficients are normalized so that `ar[0] == 1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if either coefficient list is empty
    /// or `ar[0]` is zero.
    pub fn new(ma: &[f64], ar: &[f64], gain: f64) -> Result<Self> {
        if ma.is_empty() || ar.is_empty() {
            return Err(Error::invalid_argument("filter coefficient lists must be non-empty"));
        }
        let a0 = ar[0];
        if a0 == 0.0 {
            return Err(Error::invalid_argument(
                "filter feedback coefficient at zero delay must be non-zero",
            ));
        }

        let ma: Vec<f64> = ma.iter().map(|c| c / a0).collect();
        let mut ar: Vec<f64> = ar.iter().map(|c| c / a0).collect();
        ar[0] = 1.0;
        let order = ma.len().max(ar.len()) - 1;

        Ok(Self {
            ma,
            ar,
            delay: vec![0.0; order],
            gain,
        })
    }

    /// The third-order Chebyshev lowpass used for bandwidth-enhancement and
    /// jitter noise.
    pub fn noise_lowpass() -> Self {
        let order = NOISE_MA.len().max(NOISE_AR.len()) - 1;
        Self {
            ma: NOISE_MA.to_vec(),
            ar: NOISE_AR.to_vec(),
            delay: vec![0.0; order],
            gain: NOISE_GAIN,
        }
    }

    /// Filter one input sample.
    #[inline]
    pub fn sample(&mut self, input: f64) -> f64 {
        let w = input
            + self.ar[1..]
                .iter()
                .zip(&self.delay)
                .map(|(a, d)| a * d)
                .sum::<f64>();

        let output = self.ma[0] * w
            + self.ma[1..]
                .iter()
                .zip(&self.delay)
                .map(|(b, d)| b * d)
                .sum::<f64>();

        if !self.delay.is_empty() {
            self.delay.rotate_right(1);
            self.delay[0] = w;
        }

        output * self.gain
    }

    /// Zero the delay line.
    pub fn clear(&mut self) {
        self.delay.fill(0.0);
    }

    /// Filter order (delay-line length).
    pub fn order(&self) -> usize {
        self.delay.len()
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::noise_lowpass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_leading_feedback() {
        assert!(Filter::new(&[1.0], &[0.0, 1.0], 1.0).is_err());
        assert!(Filter::new(&[], &[1.0], 1.0).is_err());
    }

    #[test]
    fn test_identity_filter() {
        let mut f = Filter::new(&[1.0], &[1.0], 1.0).unwrap();
        assert_eq!(f.order(), 0);
        for x in [0.5, -1.0, 2.0] {
            assert_eq!(f.sample(x), x);
        }
    }

    #[test]
    fn test_normalizes_leading_coefficient() {
        let mut a = Filter::new(&[2.0, 2.0], &[2.0], 1.0).unwrap();
        let mut b = Filter::new(&[1.0, 1.0], &[1.0], 1.0).unwrap();
        for x in [1.0, 0.0, 0.0, 3.0] {
            assert_eq!(a.sample(x), b.sample(x));
        }
    }

    #[test]
    fn test_moving_average_impulse_response() {
        let mut f = Filter::new(&[1.0, 1.0, 1.0], &[1.0], 1.0 / 3.0).unwrap();
        let out: Vec<f64> = [1.0, 0.0, 0.0, 0.0].iter().map(|&x| f.sample(x)).collect();
        for (i, y) in out.iter().enumerate() {
            let expected = if i < 3 { 1.0 / 3.0 } else { 0.0 };
            assert!((y - expected).abs() < 1e-12, "sample {i}: {y}");
        }
    }

    #[test]
    fn test_noise_lowpass_dc_gain() {
        // MA sums to 8; feedback polynomial evaluated at z = 1
        let mut f = Filter::noise_lowpass();
        let mut y = 0.0;
        for _ in 0..20_000 {
            y = f.sample(1.0);
        }
        let dc = 8.0 / (1.0 - 2.9258684252 + 2.8580608586 - 0.9320209046);
        assert!((y - dc * NOISE_GAIN).abs() < 1e-6 * dc * NOISE_GAIN, "settled at {y}");
        assert!(y.is_finite());
    }

    #[test]
    fn test_clear_resets_state() {
        let mut f = Filter::noise_lowpass();
        let first = f.sample(1.0);
        for _ in 0..10 {
            f.sample(0.3);
        }
        f.clear();
        assert_eq!(f.sample(1.0), first);
    }
}
