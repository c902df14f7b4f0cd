//! Sound morphing: interpolation between two distilled Partial collections.
//!
//! Partials are paired by label. Each pair is rendered onto the union of
//! both Breakpoint time sets; at each time the frequency, amplitude, and
//! bandwidth are blended with their own time-varying weight, where weight 0
//! is the first source and weight 1 the second. A label missing from one
//! source morphs against silence, so the Partial fades in or out with the
//! amplitude weight. Unlabeled Partials are never paired; they are faded
//! out (first source) or in (second source).

use parcial_core::{
    Breakpoint, Envelope, Error, Label, Partial, Result, SHORTEST_SAFE_FADE_TIME, wrap_pi, wrap_two_pi,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// Interpolates between two Partial collections.
///
/// # Example
///
/// ```rust
/// use parcial_core::{Breakpoint, Partial};
/// use parcial_transform::Morpher;
///
/// let tone = |freq: f64| {
///     let mut p = Partial::with_label(1);
///     p.insert(0.0, Breakpoint::new(freq, 0.2, 0.0, 0.0));
///     p.insert(1.0, Breakpoint::new(freq, 0.2, 0.0, 0.0));
///     p
/// };
///
/// let morpher = Morpher::uniform(0.5);
/// let morphed = morpher.morph(&[tone(200.0)], &[tone(300.0)]).unwrap();
/// assert_eq!(morphed.len(), 1);
/// assert_eq!(morphed[0].frequency_at(0.5), 250.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Morpher {
    frequency: Envelope,
    amplitude: Envelope,
    bandwidth: Envelope,
}

impl Morpher {
    /// Create a morpher with separate weight functions per parameter.
    pub fn new(
        frequency: impl Into<Envelope>,
        amplitude: impl Into<Envelope>,
        bandwidth: impl Into<Envelope>,
    ) -> Self {
        Self {
            frequency: frequency.into(),
            amplitude: amplitude.into(),
            bandwidth: bandwidth.into(),
        }
    }

    /// Create a morpher that uses one weight function for all parameters.
    pub fn uniform(weight: impl Into<Envelope>) -> Self {
        let weight = weight.into();
        Self {
            frequency: weight.clone(),
            amplitude: weight.clone(),
            bandwidth: weight,
        }
    }

    /// Frequency weight function.
    pub fn frequency_function(&self) -> &Envelope {
        &self.frequency
    }

    /// Amplitude weight function.
    pub fn amplitude_function(&self) -> &Envelope {
        &self.amplitude
    }

    /// Bandwidth weight function.
    pub fn bandwidth_function(&self) -> &Envelope {
        &self.bandwidth
    }

    /// Replace the frequency weight function.
    pub fn set_frequency_function(&mut self, weight: impl Into<Envelope>) {
        self.frequency = weight.into();
    }

    /// Replace the amplitude weight function.
    pub fn set_amplitude_function(&mut self, weight: impl Into<Envelope>) {
        self.amplitude = weight.into();
    }

    /// Replace the bandwidth weight function.
    pub fn set_bandwidth_function(&mut self, weight: impl Into<Envelope>) {
        self.bandwidth = weight.into();
    }

    /// Morph one pair of Partials into a new Partial labeled `label`.
    ///
    /// Either Partial may be empty, in which case the other fades with the
    /// amplitude weight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if both Partials are empty.
    pub fn morph_partial(&self, p0: &Partial, p1: &Partial, label: Label) -> Result<Partial> {
        if p0.is_empty() && p1.is_empty() {
            return Err(Error::invalid_argument("cannot morph two empty Partials"));
        }

        let mut out = Partial::with_label(label);
        for (t, bp0) in p0.iter() {
            out.insert(t, self.blend(t, Some(*bp0), sample(p1, t)));
        }
        for (t, bp1) in p1.iter() {
            out.insert(t, self.blend(t, sample(p0, t), Some(*bp1)));
        }
        trace!("morph: label {label}, {} + {} -> {} Breakpoints", p0.len(), p1.len(), out.len());
        Ok(out)
    }

    /// Blend the two sources' parameters at time `t`.
    fn blend(&self, t: f64, bp0: Option<Breakpoint>, bp1: Option<Breakpoint>) -> Breakpoint {
        let wa = self.amplitude.value_at(t);
        match (bp0, bp1) {
            (Some(b0), Some(b1)) => {
                let wf = self.frequency.value_at(t);
                let wb = self.bandwidth.value_at(t);
                Breakpoint::new(
                    lerp(b0.frequency(), b1.frequency(), wf),
                    lerp(b0.amplitude(), b1.amplitude(), wa),
                    lerp(b0.bandwidth(), b1.bandwidth(), wb),
                    blend_phase(&b0, &b1, wf),
                )
            }
            (Some(b0), None) => {
                let mut bp = b0;
                bp.set_amplitude((1.0 - wa) * b0.amplitude());
                bp
            }
            (None, Some(b1)) => {
                let mut bp = b1;
                bp.set_amplitude(wa * b1.amplitude());
                bp
            }
            (None, None) => Breakpoint::default(),
        }
    }

    /// Fade out the unlabeled Partials of `src0` and fade in those of
    /// `src1`. Results keep label 0.
    pub fn crossfade(&self, src0: &[Partial], src1: &[Partial]) -> Vec<Partial> {
        let silence = Partial::new();
        let fade_out = src0
            .iter()
            .filter(|p| p.label() == 0 && !p.is_empty())
            .filter_map(|p| self.morph_partial(p, &silence, 0).ok());
        let fade_in = src1
            .iter()
            .filter(|p| p.label() == 0 && !p.is_empty())
            .filter_map(|p| self.morph_partial(&silence, p, 0).ok());
        fade_out.chain(fade_in).collect()
    }

    /// Morph two distilled collections.
    ///
    /// The result holds one Partial per nonzero label present in either
    /// source, in ascending label order, followed by the crossfaded
    /// unlabeled Partials. The sources are not modified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a nonzero label occurs more
    /// than once in either source.
    pub fn morph(&self, src0: &[Partial], src1: &[Partial]) -> Result<Vec<Partial>> {
        let by_label0 = index_by_label(src0)?;
        let by_label1 = index_by_label(src1)?;
        let labels: BTreeSet<Label> = by_label0.keys().chain(by_label1.keys()).copied().collect();

        let silence = Partial::new();
        let mut out = Vec::with_capacity(labels.len());
        for label in labels {
            let p0 = by_label0.get(&label).copied().unwrap_or(&silence);
            let p1 = by_label1.get(&label).copied().unwrap_or(&silence);
            if p0.is_empty() && p1.is_empty() {
                continue;
            }
            out.push(self.morph_partial(p0, p1, label)?);
        }
        let paired = out.len();
        out.extend(self.crossfade(src0, src1));

        debug!("morph: {paired} labeled Partials, {} crossfaded", out.len() - paired);
        Ok(out)
    }
}

/// Parameters of `p` at `t`, amplitude faded outside its span; `None` if
/// `p` is empty.
fn sample(p: &Partial, t: f64) -> Option<Breakpoint> {
    (!p.is_empty()).then(|| p.parameters_at_with_fade(t, SHORTEST_SAFE_FADE_TIME))
}

#[inline]
fn lerp(v0: f64, v1: f64, weight: f64) -> f64 {
    v0 + weight * (v1 - v0)
}

/// Phase of a morphed Breakpoint. When both sources sound, blend along the
/// shorter arc; otherwise take the sounding source's phase.
fn blend_phase(b0: &Breakpoint, b1: &Breakpoint, wf: f64) -> f64 {
    let (sounds0, sounds1) = (b0.amplitude() > 0.0, b1.amplitude() > 0.0);
    match (sounds0, sounds1) {
        (true, true) => wrap_two_pi(b0.phase() + wf * wrap_pi(b1.phase() - b0.phase())),
        (true, false) => b0.phase(),
        (false, true) => b1.phase(),
        (false, false) if wf < 0.5 => b0.phase(),
        (false, false) => b1.phase(),
    }
}

fn index_by_label(partials: &[Partial]) -> Result<BTreeMap<Label, &Partial>> {
    let mut by_label = BTreeMap::new();
    for p in partials.iter().filter(|p| p.label() != 0) {
        if by_label.insert(p.label(), p).is_some() {
            return Err(Error::invalid_argument(format!(
                "label {} occurs more than once; distill before morphing",
                p.label()
            )));
        }
    }
    Ok(by_label)
}
