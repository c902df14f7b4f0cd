//! Partial: a labeled, time-ordered sequence of Breakpoints.
//!
//! A Partial is the trajectory of one bandwidth-enhanced sinusoidal
//! component. Breakpoints are stored sorted by time in a contiguous vector,
//! and lookups are binary searches, so the common case of appending in time
//! order is O(1) while random insertion stays O(n).
//!
//! # Queries
//!
//! [`frequency_at`](Partial::frequency_at), [`amplitude_at`](Partial::amplitude_at)
//! and [`bandwidth_at`](Partial::bandwidth_at) interpolate linearly between the
//! two Breakpoints bracketing the query time and hold the boundary value
//! outside `[start_time, end_time]`:
//!
//! ```rust
//! use parcial_core::{Breakpoint, Partial};
//!
//! let mut p = Partial::new();
//! p.insert(0.0, Breakpoint::new(100.0, 0.1, 0.0, 0.0));
//! p.insert(1.0, Breakpoint::new(200.0, 0.1, 0.0, 0.0));
//!
//! assert_eq!(p.frequency_at(0.5), 150.0);
//! assert_eq!(p.frequency_at(-5.0), 100.0);
//! assert_eq!(p.frequency_at(5.0), 200.0);
//! ```
//!
//! Phase is different: it is integrated from frequency, see
//! [`phase_at`](Partial::phase_at).
//!
//! Queries on an empty Partial return 0.

use crate::breakpoint::Breakpoint;
use crate::error::{Error, Result};
use crate::phase::{TWO_PI, wrap_two_pi};
use alloc::vec::Vec;
use core::ops::Range;

/// Integer identity shared by corresponding Partials. 0 means unlabeled.
pub type Label = i32;

/// Fade used by [`Partial::amplitude_at_with_fade`] callers that only want
/// "zero outside the span" without a perceptible ramp.
pub const SHORTEST_SAFE_FADE_TIME: f64 = 1.0e-9;

/// A labeled trajectory of Breakpoints with strictly increasing times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partial {
    label: Label,
    breakpoints: Vec<(f64, Breakpoint)>,
}

/// Position of a query time relative to the stored Breakpoints.
enum Bracket<'a> {
    Empty,
    Before(f64, &'a Breakpoint),
    After(f64, &'a Breakpoint),
    Between {
        lo_time: f64,
        lo: &'a Breakpoint,
        hi_time: f64,
        hi: &'a Breakpoint,
        alpha: f64,
    },
}

impl Partial {
    /// Create an empty, unlabeled Partial.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty Partial with a label.
    pub fn with_label(label: Label) -> Self {
        Self {
            label,
            breakpoints: Vec::new(),
        }
    }

    /// Build a Partial from `(time, Breakpoint)` pairs in any order.
    ///
    /// Later pairs replace earlier ones at the same time.
    pub fn from_breakpoints(
        label: Label,
        breakpoints: impl IntoIterator<Item = (f64, Breakpoint)>,
    ) -> Self {
        let mut p = Self::with_label(label);
        for (time, bp) in breakpoints {
            p.insert(time, bp);
        }
        p
    }

    /// The Partial's label.
    pub fn label(&self) -> Label {
        self.label
    }

    /// Set the label.
    pub fn set_label(&mut self, label: Label) {
        self.label = label;
    }

    /// Number of Breakpoints.
    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    /// True if the Partial has no Breakpoints.
    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Iterate over `(time, &Breakpoint)` in time order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (f64, &Breakpoint)> + ExactSizeIterator {
        self.breakpoints.iter().map(|(t, bp)| (*t, bp))
    }

    /// Iterate over `(time, &mut Breakpoint)` in time order.
    ///
    /// Times are read-only; use [`insert`](Self::insert) and
    /// [`remove`](Self::remove) to move Breakpoints.
    pub fn iter_mut(
        &mut self,
    ) -> impl DoubleEndedIterator<Item = (f64, &mut Breakpoint)> + ExactSizeIterator {
        self.breakpoints.iter_mut().map(|(t, bp)| (*t, bp))
    }

    /// Breakpoint times in order.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.breakpoints.iter().map(|(t, _)| *t)
    }

    /// The Breakpoint at `index`, with its time.
    pub fn breakpoint(&self, index: usize) -> Option<(f64, &Breakpoint)> {
        self.breakpoints.get(index).map(|(t, bp)| (*t, bp))
    }

    /// The Breakpoint at `index`, with its time, for mutation.
    pub fn breakpoint_mut(&mut self, index: usize) -> Option<(f64, &mut Breakpoint)> {
        self.breakpoints.get_mut(index).map(|(t, bp)| (*t, bp))
    }

    pub(crate) fn entries(&self) -> &[(f64, Breakpoint)] {
        &self.breakpoints
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [(f64, Breakpoint)] {
        &mut self.breakpoints
    }

    /// Insert a Breakpoint at `time`, replacing any Breakpoint already there.
    ///
    /// Returns the index of the inserted Breakpoint.
    pub fn insert(&mut self, time: f64, bp: Breakpoint) -> usize {
        let idx = self.find_after(time);
        match self.breakpoints.get_mut(idx) {
            Some(slot) if slot.0 == time => slot.1 = bp,
            _ => self.breakpoints.insert(idx, (time, bp)),
        }
        idx
    }

    /// Remove and return the Breakpoint at `index`.
    pub fn remove(&mut self, index: usize) -> Result<(f64, Breakpoint)> {
        if index >= self.breakpoints.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.breakpoints.len(),
            });
        }
        Ok(self.breakpoints.remove(index))
    }

    /// Remove the Breakpoints in an index range. Out-of-range ends are
    /// clamped to the Partial's length.
    pub fn erase(&mut self, range: Range<usize>) {
        let len = self.breakpoints.len();
        let end = range.end.min(len);
        let start = range.start.min(end);
        self.breakpoints.drain(start..end);
    }

    /// Index of the first Breakpoint at or after `time`, or `len()` if none.
    pub fn find_after(&self, time: f64) -> usize {
        self.breakpoints.partition_point(|(t, _)| *t < time)
    }

    /// Index of the Breakpoint nearest in time to `time`, preferring the later
    /// one on a tie. `None` for an empty Partial.
    pub fn find_nearest(&self, time: f64) -> Option<usize> {
        if self.breakpoints.is_empty() {
            return None;
        }
        let pos = self.find_after(time);
        if pos > 0 {
            let prev = pos - 1;
            if pos == self.breakpoints.len()
                || self.breakpoints[pos].0 - time > time - self.breakpoints[prev].0
            {
                return Some(prev);
            }
        }
        Some(pos)
    }

    /// First Breakpoint.
    pub fn first(&self) -> Option<&Breakpoint> {
        self.breakpoints.first().map(|(_, bp)| bp)
    }

    /// Last Breakpoint.
    pub fn last(&self) -> Option<&Breakpoint> {
        self.breakpoints.last().map(|(_, bp)| bp)
    }

    /// Time of the first Breakpoint (0 if empty).
    pub fn start_time(&self) -> f64 {
        self.breakpoints.first().map_or(0.0, |(t, _)| *t)
    }

    /// Time of the last Breakpoint (0 if empty).
    pub fn end_time(&self) -> f64 {
        self.breakpoints.last().map_or(0.0, |(t, _)| *t)
    }

    /// `end_time - start_time`, or 0 if empty.
    pub fn duration(&self) -> f64 {
        self.end_time() - self.start_time()
    }

    /// Phase of the first Breakpoint (0 if empty).
    pub fn initial_phase(&self) -> f64 {
        self.first().map_or(0.0, Breakpoint::phase)
    }

    fn bracket(&self, time: f64) -> Bracket<'_> {
        if self.breakpoints.is_empty() {
            return Bracket::Empty;
        }
        let idx = self.find_after(time);
        if idx == 0 {
            let (t, bp) = &self.breakpoints[0];
            Bracket::Before(*t, bp)
        } else if idx == self.breakpoints.len() {
            let (t, bp) = &self.breakpoints[idx - 1];
            Bracket::After(*t, bp)
        } else {
            let (lo_time, lo) = &self.breakpoints[idx - 1];
            let (hi_time, hi) = &self.breakpoints[idx];
            Bracket::Between {
                lo_time: *lo_time,
                lo,
                hi_time: *hi_time,
                hi,
                alpha: (time - lo_time) / (hi_time - lo_time),
            }
        }
    }

    fn interpolate(&self, time: f64, param: impl Fn(&Breakpoint) -> f64) -> f64 {
        match self.bracket(time) {
            Bracket::Empty => 0.0,
            Bracket::Before(_, bp) | Bracket::After(_, bp) => param(bp),
            Bracket::Between { lo, hi, alpha, .. } => {
                alpha * param(hi) + (1.0 - alpha) * param(lo)
            }
        }
    }

    /// Interpolated frequency in Hz, flat outside the span.
    pub fn frequency_at(&self, time: f64) -> f64 {
        self.interpolate(time, Breakpoint::frequency)
    }

    /// Interpolated amplitude, flat outside the span.
    pub fn amplitude_at(&self, time: f64) -> f64 {
        self.interpolate(time, Breakpoint::amplitude)
    }

    /// Interpolated bandwidth coefficient, flat outside the span.
    pub fn bandwidth_at(&self, time: f64) -> f64 {
        self.interpolate(time, Breakpoint::bandwidth)
    }

    /// Interpolated amplitude that ramps to zero outside the span.
    ///
    /// Before the start (after the end) the boundary amplitude is scaled by
    /// `max(0, 1 − distance / fade_time)`. With `fade_time == 0` the
    /// amplitude drops to zero immediately outside the span.
    pub fn amplitude_at_with_fade(&self, time: f64, fade_time: f64) -> f64 {
        match self.bracket(time) {
            Bracket::Empty => 0.0,
            Bracket::Before(t, bp) => fade_alpha(t - time, fade_time) * bp.amplitude(),
            Bracket::After(t, bp) => fade_alpha(time - t, fade_time) * bp.amplitude(),
            Bracket::Between { lo, hi, alpha, .. } => {
                alpha * hi.amplitude() + (1.0 - alpha) * lo.amplitude()
            }
        }
    }

    /// Phase in radians at `time`, wrapped to [0, 2π).
    ///
    /// Phase is integrated rather than interpolated. Before the start it is
    /// rolled back from the first Breakpoint at the first frequency; after
    /// the end it is rolled forward from the last at the last frequency.
    /// Between two Breakpoints, the interpolated frequency is integrated from
    /// whichever Breakpoint is nearer in time.
    pub fn phase_at(&self, time: f64) -> f64 {
        match self.bracket(time) {
            Bracket::Empty => 0.0,
            Bracket::Before(t, bp) => {
                wrap_two_pi(bp.phase() - TWO_PI * (t - time) * bp.frequency())
            }
            Bracket::After(t, bp) => {
                wrap_two_pi(bp.phase() + TWO_PI * (time - t) * bp.frequency())
            }
            Bracket::Between {
                lo_time,
                lo,
                hi_time,
                hi,
                alpha,
            } => {
                let favg = alpha * hi.frequency() + (1.0 - alpha) * lo.frequency();
                if alpha < 0.5 {
                    wrap_two_pi(lo.phase() + TWO_PI * (time - lo_time) * favg)
                } else {
                    wrap_two_pi(hi.phase() - TWO_PI * (hi_time - time) * favg)
                }
            }
        }
    }

    /// All four parameters at `time` as a Breakpoint, flat outside the span.
    pub fn parameters_at(&self, time: f64) -> Breakpoint {
        Breakpoint::new(
            self.frequency_at(time),
            self.amplitude_at(time),
            self.bandwidth_at(time),
            self.phase_at(time),
        )
    }

    /// All four parameters at `time`, with amplitude faded outside the span
    /// as in [`amplitude_at_with_fade`](Self::amplitude_at_with_fade).
    pub fn parameters_at_with_fade(&self, time: f64, fade_time: f64) -> Breakpoint {
        Breakpoint::new(
            self.frequency_at(time),
            self.amplitude_at_with_fade(time, fade_time),
            self.bandwidth_at(time),
            self.phase_at(time),
        )
    }

    /// Absorb another Partial's energy as noise.
    ///
    /// Every non-null Breakpoint of `self` that lies within `other`'s span
    /// gains `other.amplitude_at(t)²` of noise energy. Null Breakpoints mark
    /// phase resets and are left alone.
    pub fn absorb(&mut self, other: &Partial) {
        if other.is_empty() {
            return;
        }
        let start = other.start_time();
        let end = other.end_time();
        let from = self.find_after(start);
        for (t, bp) in self.breakpoints[from..].iter_mut() {
            if *t > end {
                break;
            }
            if !bp.is_null() {
                let a = other.amplitude_at(*t);
                bp.add_noise_energy(a * a);
            }
        }
    }

    /// Split at `index`: Breakpoints from `index` onward move into a new
    /// Partial with the same label, which is returned.
    pub fn split(&mut self, index: usize) -> Partial {
        let index = index.min(self.breakpoints.len());
        Partial {
            label: self.label,
            breakpoints: self.breakpoints.split_off(index),
        }
    }

    /// Copy of the Breakpoints in an index range, with this Partial's label.
    pub fn slice(&self, range: Range<usize>) -> Partial {
        let end = range.end.min(self.breakpoints.len());
        let start = range.start.min(end);
        Partial {
            label: self.label,
            breakpoints: self.breakpoints[start..end].to_vec(),
        }
    }

    /// Add `offset` seconds to every Breakpoint time.
    pub fn shift_times(&mut self, offset: f64) {
        for (t, _) in &mut self.breakpoints {
            *t += offset;
        }
    }
}

fn fade_alpha(distance: f64, fade_time: f64) -> f64 {
    if fade_time > 0.0 {
        (1.0 - distance / fade_time).max(0.0)
    } else if distance > 0.0 {
        0.0
    } else {
        1.0
    }
}
