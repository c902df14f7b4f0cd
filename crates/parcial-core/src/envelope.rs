//! Time-varying control functions.
//!
//! [`Envelope`] is the single "value at time" capability used by every
//! algorithm that takes a control function: channel reference frequencies,
//! morph weights, jitter gain and coherence, pitch shifts, and amplitude
//! scaling. Variants are resolved with a `match`, so a per-sample loop pays
//! for no dynamic dispatch.

use alloc::vec::Vec;

/// Piecewise-linear function of time.
///
/// Points are kept sorted by time with unique times. Evaluation interpolates
/// linearly between the bracketing points and holds the first (last) value
/// before the first (after the last) point. An empty envelope evaluates to 0.
///
/// # Example
///
/// ```rust
/// use parcial_core::LinearEnvelope;
///
/// let mut env = LinearEnvelope::new();
/// env.insert(0.0, 1.0);
/// env.insert(1.0, 3.0);
/// assert_eq!(env.value_at(0.5), 2.0);
/// assert_eq!(env.value_at(-1.0), 1.0);
/// assert_eq!(env.value_at(9.0), 3.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearEnvelope {
    points: Vec<(f64, f64)>,
}

impl LinearEnvelope {
    /// Create an empty envelope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an envelope holding a single point `(0, value)`.
    pub fn with_initial(value: f64) -> Self {
        Self {
            points: alloc::vec![(0.0, value)],
        }
    }

    /// Build an envelope from `(time, value)` pairs in any order.
    ///
    /// Later pairs replace earlier pairs at the same time.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut env = Self::new();
        for (time, value) in points {
            env.insert(time, value);
        }
        env
    }

    /// Insert a point, replacing any point already at `time`.
    pub fn insert(&mut self, time: f64, value: f64) {
        let idx = self.points.partition_point(|&(t, _)| t < time);
        match self.points.get_mut(idx) {
            Some(point) if point.0 == time => point.1 = value,
            _ => self.points.insert(idx, (time, value)),
        }
    }

    /// Evaluate the envelope at `time`.
    pub fn value_at(&self, time: f64) -> f64 {
        let Some(&(first_t, first_v)) = self.points.first() else {
            return 0.0;
        };
        let idx = self.points.partition_point(|&(t, _)| t < time);

        if idx == 0 || time <= first_t {
            first_v
        } else if idx == self.points.len() {
            self.points[idx - 1].1
        } else {
            let (t0, v0) = self.points[idx - 1];
            let (t1, v1) = self.points[idx];
            let alpha = (time - t0) / (t1 - t0);
            v0 + alpha * (v1 - v0)
        }
    }

    /// Multiply every value by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for point in &mut self.points {
            point.1 *= factor;
        }
    }

    /// Copy of the envelope with every value multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let mut env = self.clone();
        env.scale(factor);
        env
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the envelope has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over `(time, value)` pairs in time order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied()
    }
}

impl FromIterator<(f64, f64)> for LinearEnvelope {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        Self::from_points(iter)
    }
}

/// A control function of time.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// The same value at every time.
    Constant(f64),
    /// Piecewise-linear breakpoint function.
    Linear(LinearEnvelope),
    /// Frequency trajectory sampled from a reference Partial.
    Reference(LinearEnvelope),
}

impl Envelope {
    /// Evaluate the envelope at `time`.
    #[inline]
    pub fn value_at(&self, time: f64) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::Linear(env) | Self::Reference(env) => env.value_at(time),
        }
    }

    /// Copy of the envelope with every value multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        match self {
            Self::Constant(v) => Self::Constant(v * factor),
            Self::Linear(env) => Self::Linear(env.scaled(factor)),
            Self::Reference(env) => Self::Reference(env.scaled(factor)),
        }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::Constant(0.0)
    }
}

impl From<f64> for Envelope {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl From<LinearEnvelope> for Envelope {
    fn from(env: LinearEnvelope) -> Self {
        Self::Linear(env)
    }
}
