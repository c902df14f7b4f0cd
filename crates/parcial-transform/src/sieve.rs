//! Sieving: strike out shorter Partials that collide with a longer
//! same-labeled Partial.
//!
//! Two Partials collide when their spans come within `min_gap_time` of each
//! other. The shorter one loses its label (it becomes unlabeled noise) but
//! stays in the collection, so no energy is discarded. Equal durations are
//! both kept.

use parcial_core::{Error, Partial, Result, partial_utils};
use tracing::{debug, trace};

/// Relabels colliding same-labeled Partials.
///
/// # Example
///
/// ```rust
/// use parcial_core::{Breakpoint, Partial};
/// use parcial_transform::Sieve;
///
/// let span = |start: f64, end: f64| {
///     let mut p = Partial::with_label(1);
///     p.insert(start, Breakpoint::new(200.0, 0.1, 0.0, 0.0));
///     p.insert(end, Breakpoint::new(200.0, 0.1, 0.0, 0.0));
///     p
/// };
///
/// let mut partials = vec![span(0.0, 0.3), span(0.2, 1.0)];
/// let struck = Sieve::new(0.01).unwrap().sift(&mut partials);
/// assert_eq!(struck, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sieve {
    min_gap_time: f64,
}

impl Sieve {
    /// Create a sieve.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] unless `min_gap_time` is positive.
    pub fn new(min_gap_time: f64) -> Result<Self> {
        if min_gap_time.is_nan() || min_gap_time <= 0.0 {
            return Err(Error::invalid_argument(format!(
                "sieve gap time must be positive, got {min_gap_time}"
            )));
        }
        Ok(Self { min_gap_time })
    }

    /// Minimum gap between same-labeled Partials, in seconds.
    pub fn min_gap_time(&self) -> f64 {
        self.min_gap_time
    }

    /// True if `a` and `b` come within the gap time of each other.
    pub fn collide(&self, a: &Partial, b: &Partial) -> bool {
        a.start_time() <= b.end_time() + self.min_gap_time
            && a.end_time() + self.min_gap_time >= b.start_time()
    }

    /// Sift a collection in place and return the number of Partials whose
    /// label was zeroed.
    ///
    /// On return the collection is sorted by label, and by decreasing
    /// duration within each label.
    pub fn sift(&self, partials: &mut [Partial]) -> usize {
        partial_utils::sort_by_duration_descending(partials);
        partial_utils::sort_by_label(partials);

        let mut struck = 0;
        let mut lo = 0;
        while lo < partials.len() {
            let label = partials[lo].label();
            let hi = lo + partials[lo..].iter().take_while(|p| p.label() == label).count();
            if label != 0 {
                for i in lo + 1..hi {
                    let src = &partials[i];
                    let longer = partials[lo..i].iter().find(|other| {
                        other.label() != 0
                            && src.duration() < other.duration()
                            && self.collide(src, other)
                    });
                    if let Some(other) = longer {
                        trace!(
                            "sift: label {label} {:.3}..{:.3} s struck by {:.3}..{:.3} s",
                            src.start_time(),
                            src.end_time(),
                            other.start_time(),
                            other.end_time()
                        );
                        partials[i].set_label(0);
                        struck += 1;
                    }
                }
            }
            lo = hi;
        }

        debug!("sift: relabeled {struck} of {} Partials", partials.len());
        struck
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcial_core::{Breakpoint, Label};

    fn span(label: Label, start: f64, end: f64) -> Partial {
        let mut p = Partial::with_label(label);
        p.insert(start, Breakpoint::new(100.0, 0.1, 0.0, 0.0));
        p.insert(end, Breakpoint::new(100.0, 0.1, 0.0, 0.0));
        p
    }

    fn labels(partials: &[Partial]) -> Vec<Label> {
        partials.iter().map(Partial::label).collect()
    }

    #[test]
    fn test_rejects_non_positive_gap() {
        assert!(Sieve::new(0.0).is_err());
        assert!(Sieve::new(-0.5).is_err());
        assert!(Sieve::new(f64::NAN).is_err());
    }

    #[test]
    fn test_shorter_overlapping_partial_is_struck() {
        let mut partials = vec![span(1, 0.0, 0.3), span(1, 0.25, 0.75)];
        assert_eq!(Sieve::new(0.01).unwrap().sift(&mut partials), 1);
        assert_eq!(labels(&partials), vec![1, 0]);
        assert_eq!(partials[0].duration(), 0.5, "longest keeps its label");
    }

    #[test]
    fn test_gap_time_decides_collision() {
        let sieve = Sieve::new(0.05).unwrap();
        let mut near = vec![span(2, 0.0, 1.0), span(2, 1.04, 1.5)];
        assert_eq!(sieve.sift(&mut near), 1);
        let mut far = vec![span(2, 0.0, 1.0), span(2, 1.06, 1.5)];
        assert_eq!(sieve.sift(&mut far), 0);
    }

    #[test]
    fn test_equal_durations_are_kept() {
        let mut partials = vec![span(1, 0.0, 0.5), span(1, 0.25, 0.75)];
        assert_eq!(Sieve::new(0.01).unwrap().sift(&mut partials), 0);
        assert_eq!(labels(&partials), vec![1, 1]);
    }

    #[test]
    fn test_struck_partials_do_not_strike_others() {
        // B collides with A and C, A is longest; C only collides with B.
        let a = span(1, 0.0, 1.0);
        let b = span(1, 0.9, 1.8);
        let c = span(1, 1.7, 2.5);
        let mut partials = vec![c, b, a];
        assert_eq!(Sieve::new(0.01).unwrap().sift(&mut partials), 1);
        let starts: Vec<(f64, Label)> = partials.iter().map(|p| (p.start_time(), p.label())).collect();
        assert!(starts.contains(&(0.9, 0)));
        assert!(starts.contains(&(1.7, 1)));
    }

    #[test]
    fn test_unlabeled_partials_are_ignored() {
        let mut partials = vec![span(0, 0.0, 1.0), span(0, 0.0, 0.5), span(3, 0.2, 0.3)];
        assert_eq!(Sieve::new(0.01).unwrap().sift(&mut partials), 0);
        assert_eq!(labels(&partials), vec![0, 0, 3]);
    }
}
