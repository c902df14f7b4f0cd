//! Pipeline configuration file format.

use crate::error::ConfigError;
use parcial_core::{Label, LinearEnvelope};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for every stage of the channelize, sift, distill, resample and
/// render pipeline.
///
/// Every section and every field is optional in a file; missing values take
/// the defaults shown below.
///
/// # TOML Format
///
/// ```toml
/// name = "clarinet"
///
/// [synthesis]
/// sample_rate = 44100
/// fade_time = 0.001
/// bits_per_sample = 16
///
/// [channelize]
/// ref_label = 1
/// min_freq = 50.0
/// max_freq = 1000.0
///
/// [distill]
/// fade_time = 0.001
/// gap_time = 0.0001
///
/// [sieve]
/// min_gap_time = 0.0001
///
/// [resample]
/// mode = "off"        # "off", "dense" or "sparse"
/// interval = 0.01
/// phase_correct = false
///
/// [jitter]
/// gain = 0.0
/// coherence = 0.0
/// cutoff_label = 0
///
/// [morph]
/// frequency = [[0.0, 0.0], [1.0, 1.0]]
/// amplitude = [[0.0, 0.0], [1.0, 1.0]]
/// bandwidth = [[0.0, 0.0], [1.0, 1.0]]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Optional name for the configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Rendering settings.
    pub synthesis: SynthesisSection,
    /// Reference band and label for channelization.
    pub channelize: ChannelizeSection,
    /// Distillation fade and gap.
    pub distill: DistillSection,
    /// Sieve gap.
    pub sieve: SieveSection,
    /// Optional re-gridding.
    pub resample: ResampleSection,
    /// Phase jitter applied while rendering.
    pub jitter: JitterSection,
    /// Morph weight functions.
    pub morph: MorphSection,
}

/// `[synthesis]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisSection {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Fade in/out time around each Partial, seconds.
    pub fade_time: f64,
    /// WAV bit depth (8, 16, 24, or 32 for float).
    pub bits_per_sample: u16,
}

impl Default for SynthesisSection {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            fade_time: 0.001,
            bits_per_sample: 16,
        }
    }
}

/// `[channelize]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelizeSection {
    /// Harmonic number tracked by the reference Partial.
    pub ref_label: Label,
    /// Lower edge of the band searched for the reference Partial, Hz.
    pub min_freq: f64,
    /// Upper edge of the band searched for the reference Partial, Hz.
    pub max_freq: f64,
}

impl Default for ChannelizeSection {
    fn default() -> Self {
        Self {
            ref_label: 1,
            min_freq: 50.0,
            max_freq: 1000.0,
        }
    }
}

/// `[distill]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DistillSection {
    /// Fade time at fused seams, seconds.
    pub fade_time: f64,
    /// Silent gap required between fused pieces, seconds.
    pub gap_time: f64,
}

impl Default for DistillSection {
    fn default() -> Self {
        Self {
            fade_time: 0.001,
            gap_time: 0.0001,
        }
    }
}

/// `[sieve]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SieveSection {
    /// Minimum gap between same-labeled Partials, seconds.
    pub min_gap_time: f64,
}

impl Default for SieveSection {
    fn default() -> Self {
        Self {
            min_gap_time: 0.0001,
        }
    }
}

/// How the resample stage re-grids Breakpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMode {
    /// Skip the stage.
    #[default]
    Off,
    /// One Breakpoint at every grid time.
    Dense,
    /// Move existing Breakpoints to the nearest grid time.
    Sparse,
}

/// `[resample]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResampleSection {
    /// Re-gridding mode.
    pub mode: ResampleMode,
    /// Grid interval, seconds.
    pub interval: f64,
    /// Nudge frequencies to match stored phases after re-gridding.
    pub phase_correct: bool,
}

impl Default for ResampleSection {
    fn default() -> Self {
        Self {
            mode: ResampleMode::Off,
            interval: 0.01,
            phase_correct: false,
        }
    }
}

/// `[jitter]` section.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JitterSection {
    /// Phase modulation gain in radians; 0 disables jitter.
    pub gain: f64,
    /// Fraction of the modulation shared between low harmonics, in [0, 1].
    pub coherence: f64,
    /// Highest label receiving coherent jitter.
    pub cutoff_label: Label,
}

impl JitterSection {
    /// True if rendering should apply jitter.
    pub fn is_enabled(&self) -> bool {
        self.gain > 0.0
    }
}

/// `[morph]` section. Each weight function is a list of `[time, value]`
/// pairs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MorphSection {
    /// Frequency weight breakpoints.
    pub frequency: Vec<[f64; 2]>,
    /// Amplitude weight breakpoints.
    pub amplitude: Vec<[f64; 2]>,
    /// Bandwidth weight breakpoints.
    pub bandwidth: Vec<[f64; 2]>,
}

fn linear_ramp() -> Vec<[f64; 2]> {
    vec![[0.0, 0.0], [1.0, 1.0]]
}

impl Default for MorphSection {
    fn default() -> Self {
        Self {
            frequency: linear_ramp(),
            amplitude: linear_ramp(),
            bandwidth: linear_ramp(),
        }
    }
}

fn envelope_of(points: &[[f64; 2]]) -> LinearEnvelope {
    points.iter().map(|&[t, v]| (t, v)).collect()
}

impl MorphSection {
    /// Frequency weight function.
    pub fn frequency_envelope(&self) -> LinearEnvelope {
        envelope_of(&self.frequency)
    }

    /// Amplitude weight function.
    pub fn amplitude_envelope(&self) -> LinearEnvelope {
        envelope_of(&self.amplitude)
    }

    /// Bandwidth weight function.
    pub fn bandwidth_envelope(&self) -> LinearEnvelope {
        envelope_of(&self.bandwidth)
    }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be non-negative, got {value}")))
    }
}

fn weight_points(field: &str, points: &[[f64; 2]]) -> Result<(), ConfigError> {
    if points.is_empty() {
        return Err(ConfigError::invalid(field, "needs at least one [time, value] pair"));
    }
    if points.iter().flatten().any(|v| !v.is_finite()) {
        return Err(ConfigError::invalid(field, "times and values must be finite"));
    }
    Ok(())
}

impl PipelineConfig {
    /// Create a configuration with every default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the output sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.synthesis.sample_rate = sample_rate;
        self
    }

    /// Set the reference label and the band searched for it.
    pub fn with_reference(mut self, ref_label: Label, min_freq: f64, max_freq: f64) -> Self {
        self.channelize = ChannelizeSection {
            ref_label,
            min_freq,
            max_freq,
        };
        self
    }

    /// Set the distillation fade and gap times.
    pub fn with_distill_times(mut self, fade_time: f64, gap_time: f64) -> Self {
        self.distill = DistillSection { fade_time, gap_time };
        self
    }

    /// Set the sieve gap.
    pub fn with_sieve_gap(mut self, min_gap_time: f64) -> Self {
        self.sieve.min_gap_time = min_gap_time;
        self
    }

    /// Enable re-gridding.
    pub fn with_resample(mut self, mode: ResampleMode, interval: f64, phase_correct: bool) -> Self {
        self.resample = ResampleSection {
            mode,
            interval,
            phase_correct,
        };
        self
    }

    /// Set rendering jitter.
    pub fn with_jitter(mut self, gain: f64, coherence: f64, cutoff_label: Label) -> Self {
        self.jitter = JitterSection {
            gain,
            coherence,
            cutoff_label,
        };
        self
    }

    /// Check every setting against the preconditions of its stage.
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.synthesis;
        if s.sample_rate == 0 {
            return Err(ConfigError::invalid("synthesis.sample_rate", "must be positive"));
        }
        non_negative("synthesis.fade_time", s.fade_time)?;
        if !matches!(s.bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(ConfigError::invalid(
                "synthesis.bits_per_sample",
                format!("must be 8, 16, 24 or 32, got {}", s.bits_per_sample),
            ));
        }

        let c = &self.channelize;
        if c.ref_label < 1 {
            return Err(ConfigError::invalid(
                "channelize.ref_label",
                format!("must be at least 1, got {}", c.ref_label),
            ));
        }
        positive("channelize.min_freq", c.min_freq)?;
        positive("channelize.max_freq", c.max_freq)?;
        if c.min_freq >= c.max_freq {
            return Err(ConfigError::invalid(
                "channelize.min_freq",
                format!("must be below max_freq ({} >= {})", c.min_freq, c.max_freq),
            ));
        }

        non_negative("distill.fade_time", self.distill.fade_time)?;
        non_negative("distill.gap_time", self.distill.gap_time)?;
        positive("sieve.min_gap_time", self.sieve.min_gap_time)?;
        positive("resample.interval", self.resample.interval)?;

        let j = &self.jitter;
        non_negative("jitter.gain", j.gain)?;
        if !(0.0..=1.0).contains(&j.coherence) {
            return Err(ConfigError::invalid(
                "jitter.coherence",
                format!("must be in [0, 1], got {}", j.coherence),
            ));
        }
        if j.cutoff_label < 0 {
            return Err(ConfigError::invalid("jitter.cutoff_label", "must not be negative"));
        }

        weight_points("morph.frequency", &self.morph.frequency)?;
        weight_points("morph.amplitude", &self.morph.amplitude)?;
        weight_points("morph.bandwidth", &self.morph.bandwidth)?;
        Ok(())
    }

    /// Load and validate a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::new();
        config.validate().unwrap();
        assert_eq!(config.synthesis.sample_rate, 44100);
        assert_eq!(config.resample.mode, ResampleMode::Off);
        assert!(!config.jitter.is_enabled());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        assert_eq!(PipelineConfig::from_toml("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = PipelineConfig::from_toml(
            r#"
            name = "bell"

            [channelize]
            ref_label = 2
            min_freq = 300.0
            max_freq = 500.0

            [resample]
            mode = "sparse"
            "#,
        )
        .unwrap();
        assert_eq!(config.name.as_deref(), Some("bell"));
        assert_eq!(config.channelize.ref_label, 2);
        assert_eq!(config.resample.mode, ResampleMode::Sparse);
        assert_eq!(config.resample.interval, 0.01);
        assert_eq!(config.sieve, SieveSection::default());
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::new()
            .with_name("voice")
            .with_sample_rate(48000)
            .with_reference(1, 80.0, 400.0)
            .with_distill_times(0.002, 0.0)
            .with_sieve_gap(0.001)
            .with_resample(ResampleMode::Dense, 0.005, true)
            .with_jitter(0.2, 0.5, 8);
        config.validate().unwrap();
        assert_eq!(config.synthesis.sample_rate, 48000);
        assert_eq!(config.distill.fade_time, 0.002);
        assert!(config.jitter.is_enabled());
    }

    #[test]
    fn test_validation_names_the_field() {
        let cases = [
            (PipelineConfig::new().with_sample_rate(0), "synthesis.sample_rate"),
            (PipelineConfig::new().with_reference(0, 50.0, 100.0), "channelize.ref_label"),
            (PipelineConfig::new().with_reference(1, 200.0, 100.0), "channelize.min_freq"),
            (PipelineConfig::new().with_distill_times(-0.1, 0.0), "distill.fade_time"),
            (PipelineConfig::new().with_sieve_gap(0.0), "sieve.min_gap_time"),
            (
                PipelineConfig::new().with_resample(ResampleMode::Dense, -1.0, false),
                "resample.interval",
            ),
            (PipelineConfig::new().with_jitter(0.1, 1.5, 0), "jitter.coherence"),
        ];
        for (config, expected) in cases {
            match config.validate() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_bad_bit_depth_and_weights() {
        let mut config = PipelineConfig::new();
        config.synthesis.bits_per_sample = 12;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::new();
        config.morph.amplitude.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { ref field, .. }) if field == "morph.amplitude"
        ));
    }

    #[test]
    fn test_morph_envelopes() {
        let morph = MorphSection {
            frequency: vec![[0.0, 0.0], [2.0, 1.0]],
            ..MorphSection::default()
        };
        assert_eq!(morph.frequency_envelope().value_at(1.0), 0.5);
        assert_eq!(morph.amplitude_envelope().value_at(1.0), 1.0);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = PipelineConfig::new()
            .with_name("roundtrip")
            .with_resample(ResampleMode::Dense, 0.02, true);
        let text = config.to_toml().unwrap();
        assert!(text.contains("mode = \"dense\""), "got: {text}");
        assert_eq!(PipelineConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            PipelineConfig::from_toml("[sieve]\nmin_gap_time = \"soon\""),
            Err(ConfigError::TomlParse(_))
        ));
    }
}
