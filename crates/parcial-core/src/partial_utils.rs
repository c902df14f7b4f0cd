//! Whole-Partial and collection-level edits and statistics.
//!
//! Parameter scaling functions take an [`Envelope`] evaluated at each
//! Breakpoint time, so a constant factor and a time-varying one use the same
//! call:
//!
//! ```rust
//! use parcial_core::{Breakpoint, Envelope, Partial, partial_utils};
//!
//! let mut p = Partial::new();
//! p.insert(0.0, Breakpoint::new(220.0, 0.5, 0.0, 0.0));
//! partial_utils::scale_amplitude(&mut p, &Envelope::Constant(0.5));
//! assert_eq!(p.amplitude_at(0.0), 0.25);
//! ```

use crate::envelope::Envelope;
use crate::partial::{Label, Partial};
use libm::pow;

/// Keep only the portion of `p` within `[t0, t1]`.
///
/// If the Partial extends past either bound, a Breakpoint with the
/// interpolated parameters is inserted exactly at that bound before the
/// outside Breakpoints are removed. A Partial entirely outside the window
/// ends up empty.
pub fn crop(p: &mut Partial, t0: f64, t1: f64) {
    let (t0, t1) = if t0 > t1 { (t1, t0) } else { (t0, t1) };
    if p.is_empty() {
        return;
    }
    if p.end_time() < t0 || p.start_time() > t1 {
        p.erase(0..p.len());
        return;
    }

    if p.start_time() < t0 {
        let bp = p.parameters_at(t0);
        p.insert(t0, bp);
    }
    if p.end_time() > t1 {
        let bp = p.parameters_at(t1);
        p.insert(t1, bp);
    }

    let last_kept = p.find_after(t1);
    let end = if p.breakpoint(last_kept).is_some_and(|(t, _)| t == t1) {
        last_kept + 1
    } else {
        last_kept
    };
    p.erase(end..p.len());
    let first_kept = p.find_after(t0);
    p.erase(0..first_kept);
}

/// Shift every Breakpoint time by `offset` seconds.
pub fn shift_time(p: &mut Partial, offset: f64) {
    p.shift_times(offset);
}

/// Transpose by a (time-varying) number of cents.
pub fn shift_pitch(p: &mut Partial, cents: &Envelope) {
    for (t, bp) in p.iter_mut() {
        let ratio = pow(2.0, cents.value_at(t) / 1200.0);
        bp.set_frequency(bp.frequency() * ratio);
    }
}

/// Multiply amplitudes by `factor(t)`.
pub fn scale_amplitude(p: &mut Partial, factor: &Envelope) {
    for (t, bp) in p.iter_mut() {
        bp.set_amplitude(bp.amplitude() * factor.value_at(t));
    }
}

/// Multiply bandwidth coefficients by `factor(t)`, clamped to [0, 1].
pub fn scale_bandwidth(p: &mut Partial, factor: &Envelope) {
    for (t, bp) in p.iter_mut() {
        bp.set_bandwidth(bp.bandwidth() * factor.value_at(t));
    }
}

/// Multiply frequencies by `factor(t)`.
pub fn scale_frequency(p: &mut Partial, factor: &Envelope) {
    for (t, bp) in p.iter_mut() {
        bp.set_frequency(bp.frequency() * factor.value_at(t));
    }
}

/// Earliest start and latest end over a collection, ignoring empty Partials.
pub fn time_span(partials: &[Partial]) -> Option<(f64, f64)> {
    partials
        .iter()
        .filter(|p| !p.is_empty())
        .fold(None, |span, p| match span {
            None => Some((p.start_time(), p.end_time())),
            Some((lo, hi)) => Some((lo.min(p.start_time()), hi.max(p.end_time()))),
        })
}

/// Largest Breakpoint amplitude (0 if empty).
pub fn peak_amplitude(p: &Partial) -> f64 {
    p.iter().map(|(_, bp)| bp.amplitude()).fold(0.0, f64::max)
}

/// Mean Breakpoint amplitude (0 if empty).
pub fn average_amplitude(p: &Partial) -> f64 {
    if p.is_empty() {
        return 0.0;
    }
    p.iter().map(|(_, bp)| bp.amplitude()).sum::<f64>() / p.len() as f64
}

/// Amplitude-weighted mean frequency.
///
/// Falls back to the plain mean when every Breakpoint is null, and to 0 for
/// an empty Partial.
pub fn average_frequency(p: &Partial) -> f64 {
    if p.is_empty() {
        return 0.0;
    }
    let (weighted, total) = p.iter().fold((0.0, 0.0), |(w, a), (_, bp)| {
        (w + bp.amplitude() * bp.frequency(), a + bp.amplitude())
    });
    if total > 0.0 {
        weighted / total
    } else {
        p.iter().map(|(_, bp)| bp.frequency()).sum::<f64>() / p.len() as f64
    }
}

/// Stable sort by label, ascending.
pub fn sort_by_label(partials: &mut [Partial]) {
    partials.sort_by_key(Partial::label);
}

/// Stable sort by duration, longest first.
pub fn sort_by_duration_descending(partials: &mut [Partial]) {
    partials.sort_by(|a, b| b.duration().total_cmp(&a.duration()));
}

/// Smallest and largest label in a collection.
pub fn label_range(partials: &[Partial]) -> Option<(Label, Label)> {
    let min = partials.iter().map(Partial::label).min()?;
    let max = partials.iter().map(Partial::label).max()?;
    Some((min, max))
}

/// Number of Partials carrying `label`.
pub fn count_label(partials: &[Partial], label: Label) -> usize {
    partials.iter().filter(|p| p.label() == label).count()
}
