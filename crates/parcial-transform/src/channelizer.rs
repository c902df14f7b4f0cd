//! Harmonic channel labeling against a reference frequency envelope.
//!
//! Channel `k` is centered on `k / ref_label` times the reference
//! frequency, so the reference envelope itself tracks channel `ref_label`.
//! A Partial's channel is the amplitude-weighted mean of its frequency
//! ratio to the channel-1 frequency, rounded to the nearest integer (halves
//! round away from zero). Weights are sinusoidal amplitudes
//! `a · sqrt(1 − bw)`, so noisy Breakpoints count for less.

use parcial_core::{Envelope, Error, Label, Partial, Result};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Assigns channel labels to Partials.
///
/// # Example
///
/// ```rust
/// use parcial_core::{Breakpoint, Envelope, Partial};
/// use parcial_transform::Channelizer;
///
/// let mut p = Partial::new();
/// p.insert(0.0, Breakpoint::new(330.0, 0.2, 0.0, 0.0));
/// p.insert(0.5, Breakpoint::new(331.0, 0.2, 0.0, 0.0));
///
/// let channelizer = Channelizer::new(Envelope::Constant(110.0), 1).unwrap();
/// channelizer.channelize_partial(&mut p);
/// assert_eq!(p.label(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Channelizer {
    reference: Envelope,
    ref_label: Label,
}

impl Channelizer {
    /// Create a channelizer whose `reference` envelope tracks channel
    /// `ref_label`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `ref_label` is not positive.
    pub fn new(reference: impl Into<Envelope>, ref_label: Label) -> Result<Self> {
        if ref_label <= 0 {
            return Err(Error::invalid_argument(format!(
                "channelizer reference label must be positive, got {ref_label}"
            )));
        }
        Ok(Self {
            reference: reference.into(),
            ref_label,
        })
    }

    /// Reference frequency envelope.
    pub fn reference(&self) -> &Envelope {
        &self.reference
    }

    /// Channel tracked by the reference envelope.
    pub fn ref_label(&self) -> Label {
        self.ref_label
    }

    /// Channel number `p` belongs to, without relabeling it.
    ///
    /// Returns 0 when no Breakpoint carries sinusoidal energy or when the
    /// reference is not positive wherever the Partial is.
    pub fn channel_of(&self, p: &Partial) -> Label {
        let mut weighted = 0.0;
        let mut total = 0.0;
        for (t, bp) in p.iter() {
            let reference = self.reference.value_at(t);
            if reference.is_nan() || reference <= 0.0 {
                continue;
            }
            let ratio = f64::from(self.ref_label) * bp.frequency() / reference;
            let weight = bp.sinusoidal_amplitude();
            weighted += weight * ratio;
            total += weight;
        }
        if total > 0.0 {
            // saturating cast
            (weighted / total).round() as Label
        } else {
            0
        }
    }

    /// Label one Partial with its channel. Returns the new label.
    pub fn channelize_partial(&self, p: &mut Partial) -> Label {
        let label = self.channel_of(p);
        trace!(
            "channelize: {:.3}..{:.3} s -> label {label}",
            p.start_time(),
            p.end_time()
        );
        p.set_label(label);
        label
    }

    /// Label every Partial. Returns the number of distinct nonzero channels
    /// found.
    pub fn channelize(&self, partials: &mut [Partial]) -> usize {
        let found: BTreeSet<Label> = partials
            .iter_mut()
            .map(|p| self.channelize_partial(p))
            .filter(|&label| label != 0)
            .collect();
        debug!(
            "channelize: {} Partials into {} nonzero channels",
            partials.len(),
            found.len()
        );
        found.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcial_core::{Breakpoint, LinearEnvelope};

    fn tone(freqs: &[(f64, f64, f64)]) -> Partial {
        let mut p = Partial::new();
        for &(t, f, a) in freqs {
            p.insert(t, Breakpoint::new(f, a, 0.0, 0.0));
        }
        p
    }

    #[test]
    fn test_rejects_non_positive_reference_label() {
        assert!(matches!(
            Channelizer::new(100.0, 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(Channelizer::new(100.0, -3).is_err());
    }

    #[test]
    fn test_tracks_moving_reference() {
        // reference sweeps 200 -> 400 and is channel 2, so channel 1 is half
        let reference = LinearEnvelope::from_points([(0.0, 200.0), (1.0, 400.0)]);
        let ch = Channelizer::new(reference, 2).unwrap();
        let mut p = tone(&[(0.0, 300.0, 0.1), (0.5, 450.0, 0.1), (1.0, 600.0, 0.1)]);
        assert_eq!(ch.channelize_partial(&mut p), 3);
        assert_eq!(p.frequency_at(0.5), 450.0, "frequencies are untouched");
    }

    #[test]
    fn test_loud_breakpoints_dominate() {
        let ch = Channelizer::new(100.0, 1).unwrap();
        // ratio 2 at amplitude 0.9, ratio 5 at amplitude 0.1: mean 2.3
        let p = tone(&[(0.0, 200.0, 0.9), (1.0, 500.0, 0.1)]);
        assert_eq!(ch.channel_of(&p), 2);
    }

    #[test]
    fn test_noise_breakpoints_have_no_vote() {
        let ch = Channelizer::new(100.0, 1).unwrap();
        let mut p = tone(&[(0.0, 300.0, 0.5)]);
        p.insert(1.0, Breakpoint::new(900.0, 0.5, 1.0, 0.0));
        assert_eq!(ch.channel_of(&p), 3);
    }

    #[test]
    fn test_half_rounds_away_from_zero() {
        let ch = Channelizer::new(100.0, 1).unwrap();
        let p = tone(&[(0.0, 250.0, 0.5)]);
        assert_eq!(ch.channel_of(&p), 3);
    }

    #[test]
    fn test_silent_partial_gets_label_zero() {
        let ch = Channelizer::new(100.0, 1).unwrap();
        let mut p = tone(&[(0.0, 300.0, 0.0), (1.0, 300.0, 0.0)]);
        p.set_label(7);
        assert_eq!(ch.channelize_partial(&mut p), 0);
        assert_eq!(p.label(), 0);
    }

    #[test]
    fn test_channelize_counts_channels() {
        let ch = Channelizer::new(100.0, 1).unwrap();
        let mut partials = vec![
            tone(&[(0.0, 100.0, 0.1)]),
            tone(&[(0.0, 201.0, 0.1)]),
            tone(&[(0.0, 199.0, 0.1)]),
            tone(&[(0.0, 300.0, 0.0)]),
        ];
        assert_eq!(ch.channelize(&mut partials), 2);
        let labels: Vec<Label> = partials.iter().map(Partial::label).collect();
        assert_eq!(labels, vec![1, 2, 2, 0]);
    }
}
