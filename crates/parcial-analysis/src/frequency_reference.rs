//! Reference frequency envelopes drawn from the longest Partial in a band.
//!
//! Channelization needs a smooth estimate of one harmonic's frequency over
//! time. A good source is the longest Partial whose frequency, at the moment
//! of its peak sinusoidal amplitude `a · sqrt(1 − bw)`, lies in the band.

use parcial_core::{Envelope, Error, LinearEnvelope, Partial, Result};
use tracing::debug;

/// Target spacing between reference samples, in seconds.
pub const SAMPLE_INTERVAL: f64 = 0.03;

/// Fewest samples in a default reference envelope.
pub const MIN_SAMPLES: usize = 10;

/// Frequency envelope sampled from one Partial.
///
/// # Example
///
/// ```rust
/// use parcial_analysis::FrequencyReference;
/// use parcial_core::{Breakpoint, Partial};
///
/// let mut p = Partial::with_label(1);
/// p.insert(0.0, Breakpoint::new(100.0, 0.5, 0.0, 0.0));
/// p.insert(1.0, Breakpoint::new(110.0, 0.5, 0.0, 0.0));
///
/// let reference = FrequencyReference::new(&[p], 90.0, 120.0).unwrap();
/// assert!((reference.value_at(0.5) - 105.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyReference {
    envelope: LinearEnvelope,
}

impl FrequencyReference {
    /// Sample the reference Partial about every 30 ms, at least 10 times.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCandidate`] if no Partial peaks inside the band.
    pub fn new(partials: &[Partial], min_freq: f64, max_freq: f64) -> Result<Self> {
        let longest = find_longest_in_band(partials, min_freq, max_freq)?;
        let count = ((longest.duration() / SAMPLE_INTERVAL) as usize).max(MIN_SAMPLES);
        Ok(Self::sample(longest, count))
    }

    /// Sample the reference Partial `num_samples` times at even spacing
    /// strictly inside its span.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `num_samples` is zero.
    /// - [`Error::NoCandidate`] if no Partial peaks inside the band.
    pub fn with_sample_count(
        partials: &[Partial],
        min_freq: f64,
        max_freq: f64,
        num_samples: usize,
    ) -> Result<Self> {
        if num_samples == 0 {
            return Err(Error::invalid_argument(
                "a frequency reference needs at least one sample",
            ));
        }
        let longest = find_longest_in_band(partials, min_freq, max_freq)?;
        Ok(Self::sample(longest, num_samples))
    }

    /// Copy the reference Partial's frequency at every one of its
    /// Breakpoints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCandidate`] if no Partial peaks inside the band.
    pub fn at_breakpoints(partials: &[Partial], min_freq: f64, max_freq: f64) -> Result<Self> {
        let longest = find_longest_in_band(partials, min_freq, max_freq)?;
        let envelope = longest.iter().map(|(t, bp)| (t, bp.frequency())).collect();
        Ok(Self { envelope })
    }

    fn sample(p: &Partial, count: usize) -> Self {
        let dt = p.duration() / (count + 1) as f64;
        let envelope = (0..count)
            .map(|i| {
                let t = p.start_time() + (i + 1) as f64 * dt;
                (t, p.frequency_at(t))
            })
            .collect();
        Self { envelope }
    }

    /// Reference frequency at `time`.
    pub fn value_at(&self, time: f64) -> f64 {
        self.envelope.value_at(time)
    }

    /// Sampled points.
    pub fn envelope(&self) -> &LinearEnvelope {
        &self.envelope
    }

    /// Convert into a reference [`Envelope`].
    pub fn into_envelope(self) -> Envelope {
        Envelope::Reference(self.envelope)
    }
}

impl From<FrequencyReference> for Envelope {
    fn from(reference: FrequencyReference) -> Self {
        reference.into_envelope()
    }
}

/// Time at which `p` reaches its largest sinusoidal amplitude; the earliest
/// such time on ties. `p` must be non-empty.
fn time_of_peak_energy(p: &Partial) -> f64 {
    let mut best_time = p.start_time();
    let mut best = f64::NEG_INFINITY;
    for (t, bp) in p.iter() {
        let a = bp.sinusoidal_amplitude();
        if a > best {
            best = a;
            best_time = t;
        }
    }
    best_time
}

/// Longest Partial whose frequency at peak energy lies in the band; the
/// first one on ties.
fn find_longest_in_band(partials: &[Partial], min_freq: f64, max_freq: f64) -> Result<&Partial> {
    let (lo, hi) = if min_freq > max_freq {
        (max_freq, min_freq)
    } else {
        (min_freq, max_freq)
    };

    let mut longest: Option<&Partial> = None;
    for p in partials.iter().filter(|p| !p.is_empty()) {
        let f = p.frequency_at(time_of_peak_energy(p));
        if !(lo..=hi).contains(&f) {
            continue;
        }
        if longest.is_none_or(|best| p.duration() > best.duration()) {
            longest = Some(p);
        }
    }

    let found = longest.ok_or_else(|| {
        Error::no_candidate(format!(
            "no Partial reaches its peak sinusoidal energy between {lo} and {hi} Hz"
        ))
    })?;
    debug!(
        "frequency reference: label {} spanning {:.3}..{:.3} s",
        found.label(),
        found.start_time(),
        found.end_time()
    );
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcial_core::Breakpoint;

    fn glide(label: i32, start: f64, end: f64, f0: f64, f1: f64) -> Partial {
        let mut p = Partial::with_label(label);
        p.insert(start, Breakpoint::new(f0, 0.2, 0.0, 0.0));
        p.insert(end, Breakpoint::new(f1, 0.2, 0.0, 0.0));
        p
    }

    #[test]
    fn test_picks_longest_in_band() {
        let partials = vec![
            glide(1, 0.0, 0.5, 100.0, 100.0),
            glide(2, 0.0, 2.0, 100.0, 120.0),
            glide(3, 0.0, 5.0, 400.0, 400.0),
        ];
        let r = FrequencyReference::new(&partials, 80.0, 150.0).unwrap();
        // longest in band is label 2: 2 s / 30 ms = 66 samples
        assert_eq!(r.envelope().len(), 66);
        assert!((r.value_at(1.0) - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_minimum_sample_count() {
        let partials = vec![glide(1, 0.0, 0.1, 200.0, 200.0)];
        let r = FrequencyReference::new(&partials, 100.0, 300.0).unwrap();
        assert_eq!(r.envelope().len(), MIN_SAMPLES);
        let times: Vec<f64> = r.envelope().iter().map(|(t, _)| t).collect();
        assert!(times[0] > 0.0 && times[MIN_SAMPLES - 1] < 0.1, "samples stay inside the span");
    }

    #[test]
    fn test_explicit_sample_count() {
        let partials = vec![glide(1, 1.0, 2.0, 200.0, 300.0)];
        let r = FrequencyReference::with_sample_count(&partials, 100.0, 400.0, 3).unwrap();
        let points: Vec<(f64, f64)> = r.envelope().iter().collect();
        assert_eq!(points.len(), 3);
        assert!((points[1].0 - 1.5).abs() < 1e-12);
        assert!((points[1].1 - 250.0).abs() < 1e-9);

        assert!(matches!(
            FrequencyReference::with_sample_count(&partials, 100.0, 400.0, 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_band_uses_peak_energy_frequency() {
        // Loud at 500 Hz, quiet at 150 Hz: peak frequency is outside the band.
        let mut p = Partial::with_label(1);
        p.insert(0.0, Breakpoint::new(150.0, 0.01, 0.0, 0.0));
        p.insert(1.0, Breakpoint::new(500.0, 0.9, 0.0, 0.0));
        assert!(matches!(
            FrequencyReference::new(&[p], 100.0, 200.0),
            Err(Error::NoCandidate(_))
        ));
    }

    #[test]
    fn test_at_breakpoints_and_envelope_conversion() {
        let partials = vec![glide(1, 0.0, 1.0, 100.0, 200.0), Partial::new()];
        let r = FrequencyReference::at_breakpoints(&partials, 200.0, 50.0).unwrap();
        assert_eq!(r.envelope().len(), 2);
        let env: Envelope = r.into();
        assert!(matches!(env, Envelope::Reference(_)));
        assert_eq!(env.value_at(0.5), 150.0);
    }
}
