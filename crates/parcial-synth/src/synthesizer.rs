//! Partial synthesis into a caller-owned sample buffer.
//!
//! Each Partial is framed by zero-amplitude Breakpoints one fade time before
//! its start and after its end, then rendered segment by segment with a
//! single [`Oscillator`]. Samples are added to the buffer, never overwritten,
//! so any number of Partials can be superposed.

use crate::oscillator::Oscillator;
use alloc::vec::Vec;
use parcial_core::{Envelope, Error, Label, Partial, Result, make_null_after, make_null_before};

/// Default Partial fade time in seconds (1 ms).
pub const DEFAULT_FADE_TIME: f64 = 0.001;

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: f64 = 44_100.0;

/// Rendering parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesizerParams {
    /// Output sample rate in Hz, positive.
    pub sample_rate: f64,
    /// Fade in/out time added around each Partial, non-negative seconds.
    pub fade_time: f64,
}

impl Default for SynthesizerParams {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            fade_time: DEFAULT_FADE_TIME,
        }
    }
}

impl SynthesizerParams {
    /// Parameters at `sample_rate` with the default fade time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the sample rate is not positive.
    pub fn new(sample_rate: f64) -> Result<Self> {
        let params = Self {
            sample_rate,
            fade_time: DEFAULT_FADE_TIME,
        };
        params.validate()?;
        Ok(params)
    }

    /// Replace the fade time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `fade_time` is negative.
    pub fn with_fade_time(mut self, fade_time: f64) -> Result<Self> {
        self.fade_time = fade_time;
        self.validate()?;
        Ok(self)
    }

    /// Check the sample rate and fade time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(Error::invalid_argument(alloc::format!(
                "synthesizer sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if !(self.fade_time.is_finite() && self.fade_time >= 0.0) {
            return Err(Error::invalid_argument(alloc::format!(
                "synthesizer fade time must be non-negative, got {}",
                self.fade_time
            )));
        }
        Ok(())
    }
}

/// Jitter envelopes and the label cutoff for coherent jitter.
#[derive(Debug, Clone, PartialEq)]
pub struct JitterConfig {
    /// Phase modulation gain in radians over time.
    pub gain: Envelope,
    /// Fraction of the modulation drawn from the shared stream, in [0, 1].
    pub coherence: Envelope,
    /// Partials labeled in `(0, cutoff_label]` receive coherent jitter;
    /// all others are fully incoherent.
    pub cutoff_label: Label,
}

/// Renders Partials with a bandwidth-enhanced oscillator.
///
/// # Example
///
/// ```rust
/// use parcial_core::{Breakpoint, Partial};
/// use parcial_synth::{Synthesizer, SynthesizerParams};
///
/// let mut p = Partial::with_label(1);
/// p.insert(0.0, Breakpoint::new(440.0, 0.2, 0.0, 0.0));
/// p.insert(0.1, Breakpoint::new(440.0, 0.2, 0.0, 0.0));
///
/// let mut synth = Synthesizer::new(SynthesizerParams::new(8000.0).unwrap()).unwrap();
/// let mut buffer = Vec::new();
/// synth.synthesize(&p, &mut buffer).unwrap();
/// assert_eq!(buffer.len(), synth.required_length(&p));
/// ```
#[derive(Debug, Clone)]
pub struct Synthesizer {
    params: SynthesizerParams,
    oscillator: Oscillator,
    jitter: Option<JitterConfig>,
}

impl Synthesizer {
    /// Create a synthesizer without jitter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `params` fail validation.
    pub fn new(params: SynthesizerParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            oscillator: Oscillator::new(),
            jitter: None,
        })
    }

    /// Current parameters.
    pub fn params(&self) -> SynthesizerParams {
        self.params
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.params.sample_rate
    }

    /// Fade time in seconds.
    pub fn fade_time(&self) -> f64 {
        self.params.fade_time
    }

    /// Change the fade time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `fade_time` is negative; the
    /// previous fade time is kept.
    pub fn set_fade_time(&mut self, fade_time: f64) -> Result<()> {
        self.params = self.params.with_fade_time(fade_time)?;
        Ok(())
    }

    /// Enable jitter driven by `gain` and `coherence` envelopes.
    pub fn configure_jitter(&mut self, gain: Envelope, coherence: Envelope, cutoff_label: Label) {
        self.jitter = Some(JitterConfig {
            gain,
            coherence,
            cutoff_label,
        });
    }

    /// Disable jitter.
    pub fn clear_jitter(&mut self) {
        self.jitter = None;
    }

    /// Active jitter configuration, if any.
    pub fn jitter(&self) -> Option<&JitterConfig> {
        self.jitter.as_ref()
    }

    /// Buffer length needed to hold `p` including its fade-out.
    pub fn required_length(&self, p: &Partial) -> usize {
        if p.is_empty() {
            return 0;
        }
        self.sample_index(p.end_time() + self.params.fade_time) + 1
    }

    /// Render `p` and add it into `buffer`, growing the buffer as needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPartial`] if `p` has no Breakpoints or starts
    /// before time zero. The buffer is untouched on error.
    pub fn synthesize(&mut self, p: &Partial, buffer: &mut Vec<f64>) -> Result<()> {
        Self::check_partial(p)?;
        let (Some(first), Some(last)) = (p.first(), p.last()) else {
            return Err(Error::invalid_partial("cannot synthesize a Partial with no Breakpoints"));
        };

        let sr = self.params.sample_rate;
        let fade = self.params.fade_time;
        let end_samp = self.sample_index(p.end_time() + fade);
        if buffer.len() < end_samp + 1 {
            buffer.resize(end_samp + 1, 0.0);
        }

        let itime = (p.start_time() - fade).max(0.0);
        let mut current = self.sample_index(itime);
        let label = p.label();

        #[cfg(feature = "tracing")]
        tracing::trace!(
            "synthesize: label {label}, samples {current}..{end_samp}, {} breakpoints",
            p.len()
        );

        self.oscillator
            .reset_envelopes(&make_null_before(first, p.start_time() - itime), sr);
        if self.jitter.is_some() {
            let (gain, coherence) = (self.jitter_at(itime), self.coherence_at(itime, label));
            self.oscillator.reset_jitter(gain, coherence, current);
        }

        for (t, bp) in p.iter() {
            let target = self.sample_index(t).max(current);
            let (gain, coherence) = (self.jitter_at(t), self.coherence_at(t, label));
            self.oscillator
                .oscillate(&mut buffer[current..target], bp, sr, gain, coherence);
            // the oscillator has reached bp, so a silent target pins its phase
            if bp.amplitude() == 0.0 {
                self.oscillator.reset_phase(bp.phase());
            }
            current = target;
        }

        let end_time = end_samp as f64 / sr;
        let (gain, coherence) = (self.jitter_at(end_time), self.coherence_at(end_time, label));
        self.oscillator.oscillate(
            &mut buffer[current..end_samp],
            &make_null_after(last, fade),
            sr,
            gain,
            coherence,
        );
        Ok(())
    }

    /// Render every Partial in `partials` into `buffer`.
    ///
    /// All Partials are checked before any is rendered.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::InvalidPartial`] found; the buffer is
    /// untouched on error.
    pub fn synthesize_all<'a, I>(&mut self, partials: I, buffer: &mut Vec<f64>) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Partial>,
        I::IntoIter: Clone,
    {
        let iter = partials.into_iter();
        for p in iter.clone() {
            Self::check_partial(p)?;
        }
        let needed = iter.clone().map(|p| self.required_length(p)).max().unwrap_or(0);
        if buffer.len() < needed {
            buffer.resize(needed, 0.0);
        }

        let mut count = 0;
        for p in iter {
            self.synthesize(p, buffer)?;
            count += 1;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("synthesize_all: rendered {count} partials into {} samples", buffer.len());
        Ok(count)
    }

    fn check_partial(p: &Partial) -> Result<()> {
        if p.is_empty() {
            return Err(Error::invalid_partial("cannot synthesize a Partial with no Breakpoints"));
        }
        if p.start_time() < 0.0 {
            return Err(Error::invalid_partial(alloc::format!(
                "cannot synthesize a Partial starting before time zero ({})",
                p.start_time()
            )));
        }
        Ok(())
    }

    /// Sample index at or before `time` (truncating).
    fn sample_index(&self, time: f64) -> usize {
        (time * self.params.sample_rate) as usize
    }

    fn jitter_at(&self, time: f64) -> f64 {
        self.jitter.as_ref().map_or(0.0, |j| j.gain.value_at(time))
    }

    fn coherence_at(&self, time: f64, label: Label) -> f64 {
        match &self.jitter {
            Some(j) if label > 0 && label <= j.cutoff_label => j.coherence.value_at(time),
            _ => 0.0,
        }
    }
}
