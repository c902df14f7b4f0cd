//! Distillation: one Partial per label.
//!
//! Analysis often breaks one harmonic into several Partials, and
//! channelization gives all of them the same label. Distillation fuses each
//! label's Partials into one. The longest Partial is the base; each shorter
//! one contributes the Breakpoints that fall where the base is silent
//! (framed by null Breakpoints so the fused Partial fades cleanly), and the
//! rest of its energy is absorbed into the base as noise. Unlabeled
//! Partials are collated rather than fused.

use crate::collator::{Collator, DEFAULT_FADE_TIME, DEFAULT_GAP_TIME};
use parcial_core::{
    Breakpoint, Error, Label, Partial, Result, SHORTEST_SAFE_FADE_TIME, make_null_after, make_null_before,
    partial_utils,
};
use std::ops::Range;
use tracing::debug;

/// Fuses same-labeled Partials.
///
/// # Example
///
/// ```rust
/// use parcial_core::{Breakpoint, Partial};
/// use parcial_transform::Distiller;
///
/// let piece = |start: f64, end: f64| {
///     let mut p = Partial::with_label(1);
///     p.insert(start, Breakpoint::new(440.0, 0.2, 0.0, 0.0));
///     p.insert(end, Breakpoint::new(440.0, 0.2, 0.0, 0.0));
///     p
/// };
///
/// let distilled = Distiller::default().distill(vec![piece(0.0, 0.5), piece(1.0, 1.2)]);
/// assert_eq!(distilled.len(), 1);
/// assert_eq!(distilled[0].start_time(), 0.0);
/// assert_eq!(distilled[0].end_time(), 1.2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distiller {
    fade_time: f64,
    gap_time: f64,
    collator: Collator,
}

impl Default for Distiller {
    fn default() -> Self {
        Self {
            fade_time: DEFAULT_FADE_TIME,
            gap_time: DEFAULT_GAP_TIME,
            collator: Collator::default(),
        }
    }
}

impl Distiller {
    /// Create a distiller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if either time is negative.
    pub fn new(fade_time: f64, gap_time: f64) -> Result<Self> {
        if fade_time.is_nan() || fade_time < 0.0 {
            return Err(Error::invalid_argument("distiller fade time must be non-negative"));
        }
        if gap_time.is_nan() || gap_time < 0.0 {
            return Err(Error::invalid_argument("distiller gap time must be non-negative"));
        }
        Ok(Self {
            fade_time,
            gap_time,
            collator: Collator::new(fade_time, gap_time)?,
        })
    }

    /// Fade time in seconds.
    pub fn fade_time(&self) -> f64 {
        self.fade_time
    }

    /// Gap time in seconds.
    pub fn gap_time(&self) -> f64 {
        self.gap_time
    }

    /// Distill a collection.
    ///
    /// The result holds one Partial per nonzero label, in ascending label
    /// order, followed by the collated unlabeled Partials, which are
    /// numbered from one above the highest label (and from 1 at least).
    pub fn distill(&self, mut partials: Vec<Partial>) -> Vec<Partial> {
        let before = partials.len();
        partial_utils::sort_by_label(&mut partials);
        let max_label = partials.last().map_or(0, Partial::label);

        let mut out = Vec::new();
        let mut unlabeled = Vec::new();
        let mut rest = partials.into_iter().peekable();
        while let Some(first) = rest.next() {
            let label = first.label();
            let mut group = vec![first];
            while let Some(p) = rest.next_if(|p| p.label() == label) {
                group.push(p);
            }

            if label == 0 {
                unlabeled = group;
            } else if group.len() > 1 {
                debug!("distill: fusing {} Partials labeled {label}", group.len());
                out.push(self.distill_one(group, label));
            } else {
                out.extend(group);
            }
        }

        if !unlabeled.is_empty() {
            let start_label = max_label.saturating_add(1).max(1);
            out.extend(self.collator.collate_unlabeled(unlabeled, start_label));
        }

        debug!("distill: {} Partials from {before}", out.len());
        out
    }

    /// Fuse a group of Partials into one labeled `label`.
    pub fn distill_one(&self, mut group: Vec<Partial>, label: Label) -> Partial {
        partial_utils::sort_by_duration_descending(&mut group);
        let mut parts = group.into_iter();
        let Some(mut base) = parts.next() else {
            return Partial::with_label(label);
        };
        base.set_label(label);

        for p in parts {
            let range = self.find_contribution(&p, &base);
            if range.is_empty() {
                base.absorb(&p);
                continue;
            }
            if range.start > 0 {
                base.absorb(&p.slice(0..range.start + 1));
            }
            if range.end < p.len() {
                base.absorb(&p.slice(range.end - 1..p.len()));
            }
            self.merge(p.slice(range), &mut base);
        }
        base
    }

    /// First run of `short`'s Breakpoints during which `long` is silent, now
    /// and one clearance later.
    fn find_contribution(&self, short: &Partial, long: &Partial) -> Range<usize> {
        let clearance = self.fade_time + self.gap_time;
        let silent = |t: f64| {
            long.amplitude_at_with_fade(t, SHORTEST_SAFE_FADE_TIME) == 0.0
                && long.amplitude_at_with_fade(t + clearance, SHORTEST_SAFE_FADE_TIME) == 0.0
        };
        let times: Vec<f64> = short.times().collect();
        let begin = times.iter().position(|&t| silent(t)).unwrap_or(times.len());
        let end = times[begin..]
            .iter()
            .position(|&t| !silent(t))
            .map_or(times.len(), |n| begin + n);
        begin..end
    }

    /// Splice `piece` into `dest`, clearing `dest` around it and framing
    /// both sides of every seam with null Breakpoints.
    fn merge(&self, mut piece: Partial, dest: &mut Partial) {
        piece.absorb(dest);
        let fade = self.fade_time;
        let clearance = fade + self.gap_time;
        let sounding = |bp: &Breakpoint| bp.amplitude() > 0.0;

        // dest Breakpoints in [erase_from, erase_to) are replaced by `piece`
        let mut erase_to = f64::INFINITY;
        let after = dest.find_after(piece.end_time() + clearance);
        if let Some((t_after, bp_after)) = dest.breakpoint(after).map(|(t, bp)| (t, *bp)) {
            if let Some(last) = piece.last().copied().filter(sounding) {
                piece.insert(piece.end_time() + fade, make_null_after(&last, fade));
            }
            erase_to = t_after;
            if sounding(&bp_after) {
                erase_to = t_after - fade;
                dest.insert(erase_to, make_null_before(&bp_after, fade));
            }
        }

        let from = dest.find_after(piece.start_time() - clearance);
        let erase_from = dest.breakpoint(from).map_or(f64::INFINITY, |(t, _)| t);
        if from > 0 {
            if let Some(first) = piece.first().copied().filter(sounding) {
                piece.insert(piece.start_time() - fade, make_null_before(&first, fade));
            }
            let before = dest.breakpoint(from - 1).map(|(t, bp)| (t, *bp));
            if let Some((t_before, bp_before)) = before.filter(|(_, bp)| sounding(bp)) {
                dest.insert(t_before + fade, make_null_after(&bp_before, fade));
            }
        }

        let lo = dest.find_after(erase_from);
        let hi = dest.find_after(erase_to);
        if lo < hi {
            dest.erase(lo..hi);
        }
        for (t, bp) in piece.iter() {
            dest.insert(t, *bp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady(label: Label, start: f64, end: f64, amp: f64) -> Partial {
        let mut p = Partial::with_label(label);
        let n = 10;
        for i in 0..=n {
            let t = start + (end - start) * f64::from(i) / f64::from(n);
            p.insert(t, Breakpoint::new(300.0, amp, 0.0, 0.0));
        }
        p
    }

    #[test]
    fn test_rejects_negative_times() {
        assert!(Distiller::new(-1.0, 0.0).is_err());
        assert!(Distiller::new(0.0, -1.0).is_err());
    }

    #[test]
    fn test_single_partials_pass_through() {
        let partials = vec![steady(2, 0.0, 1.0, 0.1), steady(1, 0.0, 1.0, 0.1)];
        let out = Distiller::default().distill(partials.clone());
        assert_eq!(out, vec![partials[1].clone(), partials[0].clone()]);
    }

    #[test]
    fn test_disjoint_pieces_are_joined_with_nulls() {
        let out = Distiller::default().distill(vec![steady(1, 1.0, 1.2, 0.3), steady(1, 0.0, 0.5, 0.3)]);
        assert_eq!(out.len(), 1);
        let p = &out[0];
        assert_eq!(p.label(), 1);
        assert_eq!(p.start_time(), 0.0);
        assert_eq!(p.end_time(), 1.2);
        assert_eq!(p.amplitude_at(0.5 + DEFAULT_FADE_TIME), 0.0, "null after the base");
        assert_eq!(p.amplitude_at(1.0 - DEFAULT_FADE_TIME), 0.0, "null before the piece");
        assert!((p.amplitude_at(1.1) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_overlapping_piece_is_absorbed_as_noise() {
        let base = steady(1, 0.0, 1.0, 0.4);
        let inner = steady(1, 0.2, 0.4, 0.3);
        let out = Distiller::default().distill(vec![inner, base]);
        assert_eq!(out.len(), 1);
        let p = &out[0];
        assert_eq!(p.len(), 11, "no Breakpoints added");
        let (_, bp) = p.breakpoint(3).unwrap();
        // 0.3 s lies inside the absorbed Partial: energy 0.16 + 0.09
        assert!((bp.amplitude() - 0.5).abs() < 1e-12);
        assert!((bp.bandwidth() - 0.09 / 0.25).abs() < 1e-12);
        let (_, bp) = p.breakpoint(8).unwrap();
        assert_eq!(bp.bandwidth(), 0.0, "outside the absorbed span");
    }

    #[test]
    fn test_partly_overlapping_piece_contributes_its_tail() {
        let base = steady(1, 0.0, 1.0, 0.4);
        let tail = steady(1, 0.8, 1.5, 0.2);
        let out = Distiller::default().distill(vec![base, tail]);
        let p = &out[0];
        assert_eq!(p.end_time(), 1.5);
        assert_eq!(p.start_time(), 0.0);
        let times: Vec<f64> = p.times().collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(p.amplitude_at(1.0 + DEFAULT_FADE_TIME), 0.0);
        assert!((p.amplitude_at(1.4) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_unlabeled_collated_above_highest_label() {
        let out = Distiller::default().distill(vec![
            steady(0, 0.0, 0.1, 0.1),
            steady(3, 0.0, 1.0, 0.1),
            steady(0, 0.5, 0.6, 0.1),
        ]);
        let labels: Vec<Label> = out.iter().map(Partial::label).collect();
        assert_eq!(labels, vec![3, 4]);
    }

    #[test]
    fn test_only_unlabeled_starts_at_one() {
        let out = Distiller::default().distill(vec![steady(0, 0.0, 0.1, 0.1), steady(0, 0.05, 0.2, 0.1)]);
        let labels: Vec<Label> = out.iter().map(Partial::label).collect();
        assert_eq!(labels, vec![1, 2]);
    }

    #[test]
    fn test_distill_is_idempotent() {
        let once = Distiller::default().distill(vec![
            steady(1, 0.0, 0.5, 0.3),
            steady(1, 0.7, 1.0, 0.3),
            steady(2, 0.0, 1.0, 0.2),
            steady(0, 0.0, 0.1, 0.1),
        ]);
        let twice = Distiller::default().distill(once.clone());
        assert_eq!(once, twice);
    }
}
