//! Collation of unlabeled Partials into as few Partials as possible.
//!
//! Unlabeled Partials are usually short noise fragments. Collation joins
//! fragments that do not overlap in time (with room for a fade out, a fade
//! in, and a gap between them) into one longer Partial, joined through a
//! pair of null Breakpoints, and gives each result a fresh label.

use parcial_core::{Breakpoint, Error, Label, Partial, Result};
use tracing::debug;

/// Default fade time in seconds.
pub const DEFAULT_FADE_TIME: f64 = 0.001;

/// Default minimum silent gap between joined Partials, in seconds.
pub const DEFAULT_GAP_TIME: f64 = 0.0001;

/// Joins non-overlapping unlabeled Partials.
///
/// # Example
///
/// ```rust
/// use parcial_core::{Breakpoint, Partial};
/// use parcial_transform::Collator;
///
/// let fragment = |start: f64| {
///     let mut p = Partial::new();
///     p.insert(start, Breakpoint::new(1000.0, 0.1, 0.5, 0.0));
///     p.insert(start + 0.1, Breakpoint::new(1000.0, 0.1, 0.5, 0.0));
///     p
/// };
///
/// let collated = Collator::default().collate(vec![fragment(0.0), fragment(0.5)]);
/// assert_eq!(collated.len(), 1);
/// assert_eq!(collated[0].label(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collator {
    fade_time: f64,
    gap_time: f64,
}

impl Default for Collator {
    fn default() -> Self {
        Self {
            fade_time: DEFAULT_FADE_TIME,
            gap_time: DEFAULT_GAP_TIME,
        }
    }
}

impl Collator {
    /// Create a collator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if either time is negative.
    pub fn new(fade_time: f64, gap_time: f64) -> Result<Self> {
        if fade_time.is_nan() || fade_time < 0.0 {
            return Err(Error::invalid_argument("collator fade time must be non-negative"));
        }
        if gap_time.is_nan() || gap_time < 0.0 {
            return Err(Error::invalid_argument("collator gap time must be non-negative"));
        }
        Ok(Self {
            fade_time,
            gap_time,
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

    /// Collate the unlabeled Partials of a collection.
    ///
    /// Labeled Partials come first, in their original order, followed by the
    /// collated ones, whose labels start one above the highest label present
    /// (and at 1 at least).
    pub fn collate(&self, partials: Vec<Partial>) -> Vec<Partial> {
        let max_label = partials.iter().map(Partial::label).max().unwrap_or(0);
        let (unlabeled, mut out): (Vec<Partial>, Vec<Partial>) =
            partials.into_iter().partition(|p| p.label() == 0);
        out.extend(self.collate_unlabeled(unlabeled, max_label.saturating_add(1).max(1)));
        out
    }

    /// Collate `partials` regardless of their labels, numbering the results
    /// from `start_label`. Empty Partials are dropped.
    pub fn collate_unlabeled(&self, partials: Vec<Partial>, start_label: Label) -> Vec<Partial> {
        let mut pending: Vec<Partial> = partials.into_iter().filter(|p| !p.is_empty()).collect();
        pending.sort_by(|a, b| a.end_time().total_cmp(&b.end_time()));
        let count = pending.len();

        let clearance = 2.0 * self.fade_time + self.gap_time;
        let mut next_label = start_label;
        let mut collated: Vec<Partial> = Vec::new();

        for mut addme in pending {
            let earliest_end = addme.start_time() - clearance;
            match collated.iter_mut().find(|c| c.end_time() < earliest_end) {
                Some(host) => self.join(host, &addme),
                None => {
                    addme.set_label(next_label);
                    next_label = next_label.saturating_add(1);
                    collated.push(addme);
                }
            }
        }

        debug!("collate: {count} unlabeled Partials into {}", collated.len());
        collated
    }

    /// Append `addme` to `host` through a null Breakpoint after `host` ends
    /// and another before `addme` starts.
    fn join(&self, host: &mut Partial, addme: &Partial) {
        let t_out = host.end_time() + self.fade_time;
        let null_out = Breakpoint::new(
            host.frequency_at(t_out),
            0.0,
            host.bandwidth_at(t_out),
            host.phase_at(t_out),
        );
        host.insert(t_out, null_out);

        let t_in = addme.start_time() - self.fade_time;
        let null_in = Breakpoint::new(
            addme.frequency_at(t_in),
            0.0,
            addme.bandwidth_at(t_in),
            addme.phase_at(t_in),
        );
        host.insert(t_in, null_in);

        for (t, bp) in addme.iter() {
            host.insert(t, *bp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(start: f64, end: f64, freq: f64) -> Partial {
        let mut p = Partial::new();
        p.insert(start, Breakpoint::new(freq, 0.2, 0.3, 0.0));
        p.insert(end, Breakpoint::new(freq, 0.2, 0.3, 0.0));
        p
    }

    #[test]
    fn test_rejects_negative_times() {
        assert!(Collator::new(-0.1, 0.0).is_err());
        assert!(Collator::new(0.0, -0.1).is_err());
        assert!(Collator::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_disjoint_fragments_join_through_nulls() {
        let c = Collator::default();
        let out = c.collate_unlabeled(vec![fragment(1.0, 1.5, 500.0), fragment(0.0, 0.5, 400.0)], 3);
        assert_eq!(out.len(), 1);
        let p = &out[0];
        assert_eq!(p.label(), 3);
        assert_eq!(p.len(), 6);
        assert_eq!(p.amplitude_at(0.5 + DEFAULT_FADE_TIME), 0.0);
        assert_eq!(p.amplitude_at(1.0 - DEFAULT_FADE_TIME), 0.0);
        assert_eq!(p.frequency_at(0.25), 400.0);
        assert_eq!(p.frequency_at(1.25), 500.0);
    }

    #[test]
    fn test_overlapping_fragments_stay_apart() {
        let c = Collator::default();
        let out = c.collate_unlabeled(vec![fragment(0.0, 0.5, 400.0), fragment(0.4, 0.9, 500.0)], 1);
        assert_eq!(out.len(), 2);
        let labels: Vec<Label> = out.iter().map(Partial::label).collect();
        assert_eq!(labels, vec![1, 2]);
    }

    #[test]
    fn test_clearance_includes_both_fades_and_gap() {
        let c = Collator::new(0.01, 0.01).unwrap();
        // 0.025 s apart, clearance is 0.03
        let out = c.collate_unlabeled(vec![fragment(0.0, 0.5, 400.0), fragment(0.525, 0.9, 400.0)], 1);
        assert_eq!(out.len(), 2);
        let out = c.collate_unlabeled(vec![fragment(0.0, 0.5, 400.0), fragment(0.535, 0.9, 400.0)], 1);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_collate_numbers_above_existing_labels() {
        let mut labeled = fragment(0.0, 1.0, 100.0);
        labeled.set_label(4);
        let out = Collator::default().collate(vec![
            fragment(0.0, 0.2, 900.0),
            labeled,
            fragment(0.5, 0.7, 950.0),
            Partial::new(),
        ]);
        let labels: Vec<Label> = out.iter().map(Partial::label).collect();
        assert_eq!(labels, vec![4, 5]);
    }
}
