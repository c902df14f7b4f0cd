//! Bandwidth-enhanced Breakpoint: the parameters of one Partial at one instant.
//!
//! A Breakpoint carries frequency (Hz), amplitude (linear), a bandwidth
//! coefficient in [0, 1], and phase (radians). The bandwidth coefficient is
//! the fraction of the Breakpoint's energy that is noise:
//!
//! ```text
//! total energy      e = a²
//! noise energy      n = a²·bw
//! sinusoidal energy s = a²·(1 − bw)
//! ```
//!
//! # Energy mixing
//!
//! [`Breakpoint::add_noise_energy`] moves energy into (or out of) the noise
//! part of a Breakpoint without ever reducing the sinusoidal energy. It is the
//! primitive underneath Partial fusion during distillation.

use crate::phase::{TWO_PI, wrap_two_pi};
use libm::sqrt;

/// Parameters of a bandwidth-enhanced sinusoid at one instant.
///
/// # Invariants
///
/// - `bandwidth` is always in [0, 1] (setters clamp)
/// - `amplitude` is non-negative when built through [`new`](Self::new)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Breakpoint {
    frequency: f64,
    amplitude: f64,
    bandwidth: f64,
    phase: f64,
}

impl Breakpoint {
    /// Create a Breakpoint.
    ///
    /// # Arguments
    ///
    /// * `frequency` - Frequency in Hz
    /// * `amplitude` - Linear amplitude (negative values are clamped to 0)
    /// * `bandwidth` - Noise fraction of the total energy (clamped to [0, 1])
    /// * `phase` - Phase in radians
    pub fn new(frequency: f64, amplitude: f64, bandwidth: f64, phase: f64) -> Self {
        Self {
            frequency,
            amplitude: amplitude.max(0.0),
            bandwidth: bandwidth.clamp(0.0, 1.0),
            phase,
        }
    }

    /// Frequency in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Linear amplitude.
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Bandwidth coefficient (noise energy / total energy).
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Phase in radians.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Set the frequency in Hz.
    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
    }

    /// Set the amplitude. Negative values are clamped to 0.
    pub fn set_amplitude(&mut self, amplitude: f64) {
        self.amplitude = amplitude.max(0.0);
    }

    /// Set the bandwidth coefficient, clamped to [0, 1].
    pub fn set_bandwidth(&mut self, bandwidth: f64) {
        self.bandwidth = bandwidth.clamp(0.0, 1.0);
    }

    /// Set the phase in radians.
    pub fn set_phase(&mut self, phase: f64) {
        self.phase = phase;
    }

    /// Total energy, `a²`.
    pub fn total_energy(&self) -> f64 {
        self.amplitude * self.amplitude
    }

    /// Noise energy, `a²·bw`.
    pub fn noise_energy(&self) -> f64 {
        self.total_energy() * self.bandwidth
    }

    /// Sinusoidal energy, `a²·(1 − bw)`.
    pub fn sinusoidal_energy(&self) -> f64 {
        self.total_energy() * (1.0 - self.bandwidth)
    }

    /// Amplitude of the sinusoidal part alone, `a·sqrt(1 − bw)`.
    pub fn sinusoidal_amplitude(&self) -> f64 {
        self.amplitude * sqrt(1.0 - self.bandwidth)
    }

    /// True if the amplitude is exactly zero.
    pub fn is_null(&self) -> bool {
        self.amplitude == 0.0
    }

    /// Add (or, if negative, remove) noise energy.
    ///
    /// With `e = a²` and `n = e·bw`: if `n + delta > 0` the bandwidth becomes
    /// `(n + delta) / (e + delta)` and the amplitude `sqrt(e + delta)`;
    /// otherwise all noise is removed, leaving `bw = 0` and `a = sqrt(e − n)`.
    /// The sinusoidal energy is never reduced.
    ///
    /// # Example
    ///
    /// ```rust
    /// use parcial_core::Breakpoint;
    ///
    /// let mut bp = Breakpoint::new(440.0, 1.0, 0.0, 0.0);
    /// bp.add_noise_energy(1.0);
    /// assert!((bp.amplitude() - 2.0_f64.sqrt()).abs() < 1e-12);
    /// assert!((bp.bandwidth() - 0.5).abs() < 1e-12);
    /// ```
    pub fn add_noise_energy(&mut self, delta: f64) {
        let e = self.total_energy();
        let n = (e * self.bandwidth).min(e);

        if n + delta > 0.0 {
            self.bandwidth = ((n + delta) / (e + delta)).clamp(0.0, 1.0);
            self.amplitude = sqrt(e + delta);
        } else {
            self.bandwidth = 0.0;
            self.amplitude = sqrt((e - n).max(0.0));
        }
    }

    /// Fuse another Breakpoint into this one, treating all of its energy as noise.
    ///
    /// The result has `a = sqrt(e1 + e2)` and `bw = (n1 + e2) / (e1 + e2)`.
    /// Frequency and phase are kept from `self`.
    pub fn absorb(&mut self, other: &Breakpoint) {
        self.add_noise_energy(other.total_energy());
    }
}

/// Zero-amplitude Breakpoint placed `fade_time` seconds before `bp`.
///
/// Frequency and bandwidth are copied; phase is rolled back by the phase the
/// oscillator travels at `bp`'s frequency over the fade.
pub fn make_null_before(bp: &Breakpoint, fade_time: f64) -> Breakpoint {
    let dp = TWO_PI * fade_time * bp.frequency;
    Breakpoint {
        amplitude: 0.0,
        phase: wrap_two_pi(bp.phase - dp),
        ..*bp
    }
}

/// Zero-amplitude Breakpoint placed `fade_time` seconds after `bp`.
///
/// Mirror of [`make_null_before`]: phase is rolled forward.
pub fn make_null_after(bp: &Breakpoint, fade_time: f64) -> Breakpoint {
    let dp = TWO_PI * fade_time * bp.frequency;
    Breakpoint {
        amplitude: 0.0,
        phase: wrap_two_pi(bp.phase + dp),
        ..*bp
    }
}
