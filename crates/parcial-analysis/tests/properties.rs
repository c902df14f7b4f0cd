//! Property-based tests for parcial-analysis pitch estimation.
//!
//! Tests fundamental recovery from harmonic peak sets and reference
//! envelope bounds using proptest for randomized input generation.

use parcial_analysis::{F0Estimate, FrequencyReference, normalized_likelihood};
use parcial_core::{Breakpoint, Partial};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// For any fundamental and any roughly 1/k harmonic rolloff, the
    /// estimate over [0.75·f0, 1.5·f0] recovers f0 with near-perfect
    /// confidence.
    #[test]
    fn harmonic_series_recovers_fundamental(
        f0 in 50.0f64..1000.0,
        weights in prop::collection::vec(0.5f64..1.0, 2..12),
    ) {
        let amps: Vec<f64> = weights.iter().enumerate().map(|(i, w)| w / (i + 1) as f64).collect();
        let freqs: Vec<f64> = (1..=amps.len()).map(|k| f0 * k as f64).collect();
        let est = F0Estimate::new(&amps, &freqs, 0.75 * f0, 1.5 * f0, 0.01).unwrap();
        prop_assert!(
            (est.frequency() - f0).abs() < 0.01 * f0,
            "f0 {} estimated as {}", f0, est.frequency()
        );
        prop_assert!(est.confidence() > 0.99, "confidence {}", est.confidence());
    }

    /// Normalized likelihood never leaves [-1, 1].
    #[test]
    fn likelihood_is_normalized(
        f in 20.0f64..2000.0,
        peaks in prop::collection::vec((0.0f64..1.0, 20.0f64..10000.0), 1..16),
    ) {
        let (amps, freqs): (Vec<f64>, Vec<f64>) = peaks.into_iter().unzip();
        let q = normalized_likelihood(&amps, &freqs, f);
        prop_assert!((-1.0 - 1e-12..=1.0 + 1e-12).contains(&q), "Q = {}", q);
    }

    /// Reference samples stay inside the chosen Partial's span and take its
    /// frequencies.
    #[test]
    fn reference_samples_lie_within_partial(
        start in 0.0f64..2.0,
        dur in 0.01f64..3.0,
        f_start in 100.0f64..200.0,
        f_end in 100.0f64..200.0,
        count in 1usize..64,
    ) {
        let mut p = Partial::with_label(1);
        p.insert(start, Breakpoint::new(f_start, 0.3, 0.0, 0.0));
        p.insert(start + dur, Breakpoint::new(f_end, 0.3, 0.0, 0.0));
        let r = FrequencyReference::with_sample_count(&[p], 100.0, 200.0, count).unwrap();

        prop_assert_eq!(r.envelope().len(), count);
        let (lo, hi) = (f_start.min(f_end), f_start.max(f_end));
        for (t, f) in r.envelope().iter() {
            prop_assert!(t > start && t < start + dur);
            prop_assert!(f >= lo - 1e-9 && f <= hi + 1e-9);
        }
    }
}
