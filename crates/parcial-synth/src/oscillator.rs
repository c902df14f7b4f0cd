//! Bandwidth-enhanced sinusoidal oscillator with optional phase jitter.
//!
//! The oscillator ramps its instantaneous state (radian frequency, amplitude,
//! bandwidth coefficient) linearly from its current value to a target
//! [`Breakpoint`] across a block of samples, integrating phase from the
//! ramped frequency. Each sample is
//!
//! ```text
//! (sqrt(1 - bw) + noise · sqrt(2 · bw)) · amp · cos(phase + pm)
//! ```
//!
//! where `noise` is band-limited gaussian noise, so the sinusoidal part
//! carries `amp²·(1 - bw)` of the energy and the noise part the rest.
//!
//! `pm` is the jitter phase modulation: a mix of a coherent noise stream,
//! identical for every Partial at a given sample index, and an incoherent
//! stream private to the oscillator, weighted by the coherence and scaled by
//! the jitter gain.

use crate::noise::NoiseGenerator;
use core::f64::consts::PI;
use libm::{cos, sqrt};
use parcial_core::{Breakpoint, TWO_PI, wrap_two_pi};

/// Seed of the bandwidth-enhancement modulator.
pub const BANDWIDTH_SEED: u32 = 1;

/// Seed of the shared coherent jitter stream.
pub const COHERENT_SEED: u32 = 8_675_309;

/// Seed of the per-oscillator incoherent jitter stream.
pub const INCOHERENT_SEED: u32 = 54_321;

/// State of one bandwidth-enhanced oscillator.
///
/// # Example
///
/// ```rust
/// use parcial_core::Breakpoint;
/// use parcial_synth::Oscillator;
///
/// let mut osc = Oscillator::new();
/// osc.reset_envelopes(&Breakpoint::new(440.0, 0.0, 0.0, 0.0), 48000.0);
///
/// let mut block = vec![0.0; 480];
/// osc.oscillate(&mut block, &Breakpoint::new(440.0, 0.5, 0.0, 0.0), 48000.0, 0.0, 0.0);
/// assert!(block.iter().any(|s| s.abs() > 0.1));
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    bw_modulator: NoiseGenerator,
    coherent: NoiseGenerator,
    incoherent: NoiseGenerator,

    /// Radians per sample.
    frequency: f64,
    amplitude: f64,
    bandwidth: f64,
    phase: f64,
    jitter: f64,
    coherence: f64,
    jitter_enabled: bool,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new()
    }
}

impl Oscillator {
    /// Oscillator with all state zeroed and jitter disabled.
    pub fn new() -> Self {
        Self {
            bw_modulator: NoiseGenerator::new(BANDWIDTH_SEED),
            coherent: NoiseGenerator::new(COHERENT_SEED),
            incoherent: NoiseGenerator::new(INCOHERENT_SEED),
            frequency: 0.0,
            amplitude: 0.0,
            bandwidth: 0.0,
            phase: 0.0,
            jitter: 0.0,
            coherence: 0.0,
            jitter_enabled: false,
        }
    }

    /// Instantaneous frequency in radians per sample.
    pub fn radian_frequency(&self) -> f64 {
        self.frequency
    }

    /// Instantaneous amplitude.
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Instantaneous bandwidth coefficient.
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Deterministic phase in radians, excluding jitter modulation.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Whether jitter streams are being consumed.
    pub fn jitter_enabled(&self) -> bool {
        self.jitter_enabled
    }

    /// Set the instantaneous state from `bp` and disable jitter.
    ///
    /// The sample rate converts the Breakpoint frequency to radians per
    /// sample. A frequency above Nyquist silences the oscillator.
    pub fn reset_envelopes(&mut self, bp: &Breakpoint, sample_rate: f64) {
        self.frequency = TWO_PI * bp.frequency() / sample_rate;
        self.amplitude = if self.frequency > PI { 0.0 } else { bp.amplitude() };
        self.bandwidth = bp.bandwidth().clamp(0.0, 1.0);
        self.phase = wrap_two_pi(bp.phase());
        self.jitter = 0.0;
        self.coherence = 0.0;
        self.jitter_enabled = false;
    }

    /// Enable jitter with the given starting gain and coherence.
    ///
    /// The coherent stream restarts from its seed and skips ahead to
    /// `starting_sample`, so every Partial reads the same coherent value at
    /// the same buffer position.
    pub fn reset_jitter(&mut self, gain: f64, coherence: f64, starting_sample: usize) {
        self.jitter = gain;
        self.coherence = coherence.clamp(0.0, 1.0);
        self.coherent.reset(COHERENT_SEED);
        NoiseGenerator::skip(&mut self.coherent, starting_sample);
        self.jitter_enabled = true;
    }

    /// Set the deterministic phase.
    ///
    /// Used when a Partial's amplitude reaches zero so that onsets keep the
    /// stored phase.
    pub fn reset_phase(&mut self, phase: f64) {
        self.phase = wrap_two_pi(phase);
    }

    /// Accumulate samples into `buffer` while ramping toward `target`.
    ///
    /// Every element of `buffer` receives one sample; the state arrives at
    /// the target values after the last one. Bandwidth is clamped to [0, 1]
    /// and a target frequency above Nyquist ramps the amplitude to zero.
    /// When the amplitude is zero at both ends nothing is written and the
    /// phase advances by the average frequency.
    pub fn oscillate(
        &mut self,
        buffer: &mut [f64],
        target: &Breakpoint,
        sample_rate: f64,
        target_jitter: f64,
        target_coherence: f64,
    ) {
        let target_freq = TWO_PI * target.frequency() / sample_rate;
        let target_amp = if target_freq > PI {
            0.0
        } else {
            target.amplitude()
        };
        let target_bw = target.bandwidth().clamp(0.0, 1.0);
        let target_coherence = target_coherence.clamp(0.0, 1.0);

        let n = buffer.len();
        if n > 0 && target_amp == 0.0 && self.amplitude == 0.0 {
            self.phase = wrap_two_pi(self.phase + 0.5 * (self.frequency + target_freq) * n as f64);
            if self.jitter_enabled {
                NoiseGenerator::skip(&mut self.coherent, n);
            }
        } else if n > 0 {
            let inv = 1.0 / n as f64;
            let d_freq = (target_freq - self.frequency) * inv;
            let d_amp = (target_amp - self.amplitude) * inv;
            let d_bw = (target_bw - self.bandwidth) * inv;
            let d_jitter = (target_jitter - self.jitter) * inv;
            let d_coherence = (target_coherence - self.coherence) * inv;

            let mut f = self.frequency;
            let mut a = self.amplitude;
            let mut b = self.bandwidth;
            let mut p = self.phase;
            let mut j = self.jitter;
            let mut c = self.coherence;

            for out in buffer.iter_mut() {
                let noise = self.bw_modulator.next_sample();
                let modulation = sqrt(1.0 - b) + noise * sqrt(2.0 * b);
                let pm = if self.jitter_enabled {
                    let coherent = self.coherent.next_sample();
                    let incoherent = self.incoherent.next_sample();
                    j * (c * coherent + (1.0 - c) * incoherent)
                } else {
                    0.0
                };

                *out += modulation * a * cos(p + pm);

                p += f;
                f += d_freq;
                a += d_amp;
                b = (b + d_bw).clamp(0.0, 1.0);
                j += d_jitter;
                c += d_coherence;
            }

            self.phase = wrap_two_pi(p);
        }

        // land exactly on the targets; ramp accumulation can overshoot
        self.frequency = target_freq;
        self.amplitude = target_amp;
        self.bandwidth = target_bw;
        self.jitter = target_jitter;
        self.coherence = target_coherence;
    }

    /// Generate one sample at the current state without ramping.
    ///
    /// Entry point for hosts that drive the oscillator a sample at a time
    /// after setting the state with [`reset_envelopes`](Self::reset_envelopes).
    pub fn render_sample(&mut self) -> f64 {
        let target = Breakpoint::new(
            self.frequency / TWO_PI,
            self.amplitude,
            self.bandwidth,
            self.phase,
        );
        let mut out = [0.0];
        let (jitter, coherence) = (self.jitter, self.coherence);
        self.oscillate(&mut out, &target, 1.0, jitter, coherence);
        out[0]
    }
}
