//! Integration tests for parcial-transform crate.
//!
//! Tests cover sieving of colliding Partials, fundamental-driven
//! channelization, the channelize/sift/distill pipeline on a fragmented
//! harmonic sound, time dilation followed by resampling, and morphing two
//! distilled sounds through to rendered samples.

use parcial_analysis::{F0Estimate, FrequencyReference, FundamentalFromPartials};
use parcial_core::{Breakpoint, Label, LinearEnvelope, Partial, TWO_PI};
use parcial_synth::{Synthesizer, SynthesizerParams};
use parcial_transform::{Channelizer, Dilator, Distiller, Morpher, Resampler, Sieve};

/// Harmonic `k` of a 220 Hz tone with 1% vibrato at 5 Hz, sampled every
/// 10 ms over the given index range.
fn vibrato_harmonic(k: i32, steps: impl IntoIterator<Item = i32>) -> Partial {
    let mut p = Partial::new();
    for i in steps {
        let t = f64::from(i) * 0.01;
        let f = f64::from(k) * 220.0 * (1.0 + 0.01 * (TWO_PI * 5.0 * t).sin());
        p.insert(t, Breakpoint::new(f, 0.2 / f64::from(k), 0.05, 0.0));
    }
    p
}

fn steady(label: Label, freq: f64, start: f64, end: f64, amp: f64) -> Partial {
    let mut p = Partial::with_label(label);
    p.insert(start, Breakpoint::new(freq, amp, 0.0, 0.0));
    p.insert(end, Breakpoint::new(freq, amp, 0.0, 0.0));
    p
}

fn labels(partials: &[Partial]) -> Vec<Label> {
    partials.iter().map(Partial::label).collect()
}

// ---------------------------------------------------------------------------
// 1. Sieving
// ---------------------------------------------------------------------------

#[test]
fn sift_unlabels_shorter_touching_partial() {
    let mut partials = vec![
        steady(1, 200.0, 0.5, 0.8, 0.1),
        steady(2, 400.0, 0.0, 1.0, 0.1),
        steady(1, 200.0, 0.0, 0.5, 0.1),
    ];
    let struck = Sieve::new(0.01).unwrap().sift(&mut partials);
    assert_eq!(struck, 1);

    let survivors: Vec<&Partial> = partials.iter().filter(|p| p.label() == 1).collect();
    assert_eq!(survivors.len(), 1, "exactly one label-1 Partial survives");
    assert_eq!(survivors[0].duration(), 0.5, "the longer one survives");
    let unlabeled: Vec<&Partial> = partials.iter().filter(|p| p.label() == 0).collect();
    assert_eq!(unlabeled.len(), 1);
    assert_eq!(unlabeled[0].start_time(), 0.5);
    assert_eq!(partials.iter().filter(|p| p.label() == 2).count(), 1, "label 2 untouched");
}

// ---------------------------------------------------------------------------
// 2. Fundamental estimation and channelization
// ---------------------------------------------------------------------------

#[test]
fn f0_of_exact_harmonics() {
    let est = F0Estimate::new(&[1.0, 1.0, 1.0], &[200.0, 400.0, 600.0], 90.0, 250.0, 0.01).unwrap();
    assert!((est.frequency() - 200.0).abs() < 0.01, "estimated {}", est.frequency());
    assert!(est.confidence() > 0.9999, "confidence {}", est.confidence());
}

#[test]
fn tracked_fundamental_channelizes_harmonics() {
    let mut partials: Vec<Partial> = (1..=3).map(|k| vibrato_harmonic(k, 0..=100)).collect();

    let tracker = FundamentalFromPartials::default();
    let est = tracker.estimate_at(&partials, 0.5, 150.0, 300.0).unwrap();
    assert!((est.frequency() - 220.0).abs() < 1.0, "estimated {}", est.frequency());

    let f0 = tracker
        .build_envelope_over_span(&partials, 0.02, 150.0, 300.0)
        .unwrap();
    let channels = Channelizer::new(f0, 1).unwrap().channelize(&mut partials);
    assert_eq!(channels, 3);
    assert_eq!(labels(&partials), vec![1, 2, 3]);
}

// ---------------------------------------------------------------------------
// 3. Channelize, sift, distill
// ---------------------------------------------------------------------------

#[test]
fn fragmented_harmonics_distill_to_one_partial_each() {
    let mut partials = vec![
        vibrato_harmonic(2, 55..=100),
        vibrato_harmonic(1, 0..=100),
        vibrato_harmonic(3, 0..=100),
        vibrato_harmonic(2, 0..=45),
    ];

    let reference = FrequencyReference::new(&partials, 200.0, 240.0).unwrap();
    Channelizer::new(reference, 1).unwrap().channelize(&mut partials);
    let mut sorted = labels(&partials);
    sorted.sort_unstable();
    assert_eq!(sorted, vec![1, 2, 2, 3]);

    assert_eq!(Sieve::new(0.0001).unwrap().sift(&mut partials), 0, "fragments do not collide");

    let distilled = Distiller::default().distill(partials);
    assert_eq!(labels(&distilled), vec![1, 2, 3]);
    for p in &distilled {
        assert_eq!(p.start_time(), 0.0);
        assert_eq!(p.end_time(), 1.0);
    }
    let second = &distilled[1];
    assert_eq!(second.amplitude_at(0.5), 0.0, "gap between fragments stays silent");
    assert!((second.frequency_at(0.2) - vibrato_harmonic(2, 0..=45).frequency_at(0.2)).abs() < 1e-9);

    let again = Distiller::default().distill(distilled.clone());
    assert_eq!(again, distilled, "distillation is idempotent");
}

// ---------------------------------------------------------------------------
// 4. Dilation and resampling
// ---------------------------------------------------------------------------

#[test]
fn dilate_then_resample() {
    let mut p = Partial::with_label(1);
    p.insert(0.0, Breakpoint::new(100.0, 0.1, 0.0, 0.0));
    p.insert(0.5, Breakpoint::new(200.0, 0.2, 0.0, 0.0));
    p.insert(1.0, Breakpoint::new(100.0, 0.1, 0.0, 0.0));
    let original = p.clone();

    Dilator::new(&[0.0, 1.0], &[0.0, 2.0]).unwrap().dilate(&mut p);
    let times: Vec<f64> = p.times().collect();
    assert_eq!(times, vec![0.0, 1.0, 2.0]);

    Resampler::new(0.25).unwrap().resample(&mut p);
    assert_eq!(p.len(), 9);
    for k in 0..=8 {
        let t = f64::from(k) * 0.25;
        assert!(
            (p.frequency_at(t) - original.frequency_at(t / 2.0)).abs() < 1e-9,
            "frequency at {t}"
        );
    }
}

#[test]
fn identity_dilation_keeps_times() {
    let mut partials: Vec<Partial> = (1..=3).map(|k| vibrato_harmonic(k, 0..=50)).collect();
    let before = partials.clone();
    let markers = [0.0, 0.13, 0.5];
    Dilator::new(&markers, &markers).unwrap().dilate_all(&mut partials);
    for (p, q) in partials.iter().zip(&before) {
        for (t, _) in q.iter() {
            assert!(p.times().any(|u| u == t), "time {t} kept");
        }
    }
}

// ---------------------------------------------------------------------------
// 5. Morphing
// ---------------------------------------------------------------------------

#[test]
fn morph_renders_between_sources() {
    let src0: Vec<Partial> = (1..=3)
        .map(|k| steady(k, 200.0 * f64::from(k), 0.0, 0.5, 0.1))
        .collect();
    let src1: Vec<Partial> = (1..=2)
        .map(|k| steady(k, 300.0 * f64::from(k), 0.0, 0.5, 0.1))
        .collect();
    let weight = LinearEnvelope::from_points([(0.0, 0.0), (0.5, 1.0)]);
    let morphed = Morpher::uniform(weight).morph(&src0, &src1).unwrap();

    assert_eq!(labels(&morphed), vec![1, 2, 3]);
    assert_eq!(morphed[0].frequency_at(0.25), 250.0);
    assert_eq!(morphed[1].frequency_at(0.25), 500.0);
    assert!((morphed[2].amplitude_at(0.25) - 0.05).abs() < 1e-12, "label 3 fades out");
    assert_eq!(morphed[2].amplitude_at(0.5), 0.0);

    let mut synth = Synthesizer::new(SynthesizerParams::new(44100.0).unwrap()).unwrap();
    let mut buffer = Vec::new();
    assert_eq!(synth.synthesize_all(&morphed, &mut buffer).unwrap(), 3);
    let peak = buffer.iter().fold(0.0, |m: f64, s| m.max(s.abs()));
    assert!(peak > 0.1 && peak <= 0.3 + 1e-9, "peak {peak}");
}
