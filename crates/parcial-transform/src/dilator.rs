//! Piecewise-linear time warping of Partials.
//!
//! A dilator holds paired time markers: `initial[i]` in the source is moved
//! to `target[i]`. Times between two markers are interpolated linearly;
//! times before the first or after the last marker continue the slope of
//! the nearest segment. Each marker that falls within a Partial also gets a
//! Breakpoint at its target time, so features at the markers land exactly
//! where they were sent.

use parcial_core::{Error, Partial, Result};
use tracing::debug;

/// Time warp defined by paired initial and target markers.
///
/// # Example
///
/// ```rust
/// use parcial_transform::Dilator;
///
/// // stretch the first second to two seconds, then run at normal speed
/// let dilator = Dilator::new(&[0.0, 1.0], &[0.0, 2.0]).unwrap();
/// assert_eq!(dilator.warp_time(0.5), 1.0);
/// assert_eq!(dilator.warp_time(1.5), 3.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dilator {
    initial: Vec<f64>,
    target: Vec<f64>,
}

impl Dilator {
    /// Create a dilator from parallel marker lists. Both lists are sorted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the lists differ in length or
    /// hold a non-finite time.
    pub fn new(initial: &[f64], target: &[f64]) -> Result<Self> {
        if initial.len() != target.len() {
            return Err(Error::invalid_argument(format!(
                "dilation needs one target per initial time ({} initial, {} target)",
                initial.len(),
                target.len()
            )));
        }
        if initial.iter().chain(target).any(|t| !t.is_finite()) {
            return Err(Error::invalid_argument("dilation times must be finite"));
        }
        let mut initial = initial.to_vec();
        let mut target = target.to_vec();
        initial.sort_by(f64::total_cmp);
        target.sort_by(f64::total_cmp);
        Ok(Self { initial, target })
    }

    /// Add a marker pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if either time is not finite.
    pub fn insert(&mut self, initial: f64, target: f64) -> Result<()> {
        if !initial.is_finite() || !target.is_finite() {
            return Err(Error::invalid_argument("dilation times must be finite"));
        }
        let i = self.initial.partition_point(|&t| t <= initial);
        self.initial.insert(i, initial);
        let j = self.target.partition_point(|&t| t <= target);
        self.target.insert(j, target);
        Ok(())
    }

    /// Number of marker pairs.
    pub fn len(&self) -> usize {
        self.initial.len()
    }

    /// True if there are no markers; dilation is then the identity.
    pub fn is_empty(&self) -> bool {
        self.initial.is_empty()
    }

    /// Initial marker times, sorted.
    pub fn initial(&self) -> &[f64] {
        &self.initial
    }

    /// Target marker times, sorted.
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    /// Slope of the segment from marker `i` to marker `j`, 1 if it has no
    /// length.
    fn slope(&self, i: usize, j: usize) -> f64 {
        let di = self.initial[j] - self.initial[i];
        if di > 0.0 {
            (self.target[j] - self.target[i]) / di
        } else {
            1.0
        }
    }

    /// Map a time through the warp.
    pub fn warp_time(&self, time: f64) -> f64 {
        let n = self.initial.len();
        if n == 0 {
            return time;
        }
        let idx = self.initial.partition_point(|&t| t < time);
        let (anchor, slope) = if idx == 0 {
            (0, if n > 1 { self.slope(0, 1) } else { 1.0 })
        } else if idx == n {
            (n - 1, if n > 1 { self.slope(n - 2, n - 1) } else { 1.0 })
        } else {
            // initial[idx - 1] < time <= initial[idx], so the segment has length
            (idx - 1, self.slope(idx - 1, idx))
        };
        // offset form, exact wherever a segment is unmoved
        let shift = self.target[anchor] - self.initial[anchor];
        time + shift + (time - self.initial[anchor]) * (slope - 1.0)
    }

    /// Warp every Breakpoint time of `p`, and add a Breakpoint at the target
    /// time of every marker inside `p`'s span.
    pub fn dilate(&self, p: &mut Partial) {
        if self.is_empty() || p.is_empty() {
            return;
        }
        let mut warped = Partial::with_label(p.label());
        for (t, bp) in p.iter() {
            warped.insert(self.warp_time(t), *bp);
        }
        let (start, end) = (p.start_time(), p.end_time());
        for (&i, &t) in self.initial.iter().zip(&self.target) {
            if i < start {
                continue;
            }
            if i > end {
                break;
            }
            warped.insert(t, p.parameters_at(i));
        }
        *p = warped;
    }

    /// Dilate every Partial in a collection.
    pub fn dilate_all(&self, partials: &mut [Partial]) {
        for p in partials.iter_mut() {
            self.dilate(p);
        }
        debug!("dilate: {} Partials through {} markers", partials.len(), self.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcial_core::Breakpoint;

    fn ramp(times: &[f64]) -> Partial {
        let mut p = Partial::with_label(5);
        for (i, &t) in times.iter().enumerate() {
            p.insert(t, Breakpoint::new(100.0 * (i + 1) as f64, 0.1, 0.0, 0.0));
        }
        p
    }

    #[test]
    fn test_mismatched_markers_rejected() {
        assert!(matches!(
            Dilator::new(&[0.0, 1.0], &[0.0]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(Dilator::new(&[f64::NAN], &[0.0]).is_err());
    }

    #[test]
    fn test_empty_dilator_is_identity() {
        let d = Dilator::default();
        let mut p = ramp(&[0.1, 0.2]);
        let before = p.clone();
        d.dilate(&mut p);
        assert_eq!(p, before);
        assert_eq!(d.warp_time(3.3), 3.3);
    }

    #[test]
    fn test_segments_and_end_slopes() {
        let d = Dilator::new(&[1.0, 2.0, 4.0], &[2.0, 2.5, 6.5]).unwrap();
        assert_eq!(d.warp_time(1.0), 2.0);
        assert_eq!(d.warp_time(1.5), 2.25);
        assert_eq!(d.warp_time(3.0), 4.5);
        // before: slope 0.5 of the first segment, after: slope 2 of the last
        assert_eq!(d.warp_time(0.0), 1.5);
        assert_eq!(d.warp_time(5.0), 8.5);
    }

    #[test]
    fn test_single_marker_shifts() {
        let d = Dilator::new(&[1.0], &[1.5]).unwrap();
        assert_eq!(d.warp_time(0.0), 0.5);
        assert_eq!(d.warp_time(3.0), 3.5);
    }

    #[test]
    fn test_duplicate_markers_pin_a_point() {
        let d = Dilator::new(&[0.0, 1.0, 1.0, 2.0], &[0.0, 1.0, 3.0, 4.0]).unwrap();
        assert_eq!(d.warp_time(0.5), 0.5);
        assert_eq!(d.warp_time(1.0), 1.0);
        assert_eq!(d.warp_time(1.5), 3.5);
    }

    #[test]
    fn test_markers_are_sorted() {
        let d = Dilator::new(&[2.0, 0.0], &[4.0, 0.0]).unwrap();
        assert_eq!(d.initial(), &[0.0, 2.0]);
        assert_eq!(d.warp_time(1.0), 2.0);

        let mut d = Dilator::default();
        d.insert(2.0, 4.0).unwrap();
        d.insert(0.0, 0.0).unwrap();
        assert_eq!(d.target(), &[0.0, 4.0]);
    }

    #[test]
    fn test_dilate_adds_breakpoints_at_markers() {
        let d = Dilator::new(&[0.0, 0.5, 2.0], &[0.0, 1.0, 2.5]).unwrap();
        let mut p = ramp(&[0.0, 1.0]);
        d.dilate(&mut p);
        let times: Vec<f64> = p.times().collect();
        // 1.0 maps into the second segment: 1.0 + 0.5 * (2.5 - 1.0) / 1.5
        assert_eq!(times, vec![0.0, 1.0, 1.5]);
        assert_eq!(p.label(), 5);
        assert!((p.frequency_at(1.0) - 150.0).abs() < 1e-9, "marker keeps source parameters");
    }
}
