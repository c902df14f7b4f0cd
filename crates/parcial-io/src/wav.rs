//! WAV file reading and writing.
//!
//! Sample buffers are `f64`, the synthesizer's native precision. 32-bit
//! files are IEEE float; 8, 16 and 24-bit files are integer PCM scaled to
//! [-1, 1).

use crate::Result;
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;
use tracing::{debug, warn};

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let total_samples = u64::from(reader.len());
    let num_frames = total_samples / u64::from(spec.channels.max(1));
    let duration_secs = num_frames as f64 / f64::from(spec.sample_rate);

    let format = match spec.sample_format {
        SampleFormat::Float => WavFormat::IeeeFloat,
        SampleFormat::Int => WavFormat::Pcm,
    };

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs,
        format,
    })
}

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Bit depth per sample (8, 16, 24, or 32).
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
        }
    }
}

impl WavSpec {
    /// Mono spec at `sample_rate` with the given bit depth.
    pub fn mono(sample_rate: u32, bits_per_sample: u16) -> Self {
        Self {
            channels: 1,
            sample_rate,
            bits_per_sample,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Full-scale value of an integer sample with `bits` bits.
fn int_scale(bits: u16) -> Result<f64> {
    match bits {
        8 | 16 | 24 => Ok(f64::from(1i32 << (bits - 1))),
        _ => Err(hound::Error::Unsupported.into()),
    }
}

/// Read a WAV file and return samples as f64 along with the spec.
///
/// Multi-channel files are mixed down to mono by averaging channels.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f64>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let spec = WavSpec::from(reader.spec());
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f64> = match reader.spec().sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = int_scale(spec.bits_per_sample)?;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    // Mix down to mono if multi-channel
    let mono_samples = if channels > 1 {
        samples
            .chunks(channels)
            .map(|chunk| chunk.iter().sum::<f64>() / channels as f64)
            .collect()
    } else {
        samples
    };

    debug!(
        "read {} frames at {} Hz ({} bit)",
        mono_samples.len(),
        spec.sample_rate,
        spec.bits_per_sample
    );
    Ok((mono_samples, spec))
}

/// Write mono samples to a WAV file.
///
/// Every channel of a multi-channel spec receives the same samples. Integer
/// formats clip to full scale; clipping is logged.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f64], spec: WavSpec) -> Result<()> {
    let scale = if spec.bits_per_sample == 32 {
        None
    } else {
        Some(int_scale(spec.bits_per_sample)?)
    };
    let hound_spec = hound::WavSpec::from(spec);
    let mut writer = WavWriter::create(path, hound_spec)?;

    let mut clipped = 0usize;
    for &sample in samples {
        if sample.abs() > 1.0 {
            clipped += 1;
        }
        for _ in 0..spec.channels {
            match scale {
                None => writer.write_sample(sample as f32)?,
                Some(max_val) => {
                    let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
                    writer.write_sample(int_sample)?;
                }
            }
        }
    }
    writer.finalize()?;

    if clipped > 0 {
        warn!("{clipped} of {} samples exceed full scale", samples.len());
    }
    debug!("wrote {} frames at {} Hz", samples.len(), spec.sample_rate);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::NamedTempFile;

    #[test]
    fn test_roundtrip_f32() {
        let samples: Vec<f64> = (0..1000).map(|i| (f64::from(i) / 1000.0).sin()).collect();
        let spec = WavSpec::mono(48000, 32);

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, spec).unwrap();

        let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
        assert_eq!(loaded_spec, spec);
        assert_eq!(loaded.len(), samples.len());
        for (a, b) in samples.iter().zip(loaded.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_roundtrip_i16() {
        let samples: Vec<f64> = (0..1000).map(|i| (f64::from(i) / 1000.0).sin() * 0.9).collect();
        let spec = WavSpec::mono(44100, 16);

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, spec).unwrap();

        let (loaded, _) = read_wav(file.path()).unwrap();
        assert_eq!(loaded.len(), samples.len());
        // 16-bit has less precision
        for (a, b) in samples.iter().zip(loaded.iter()) {
            assert!((a - b).abs() < 0.001);
        }
    }

    #[test]
    fn test_integer_formats_clip() {
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &[2.0, -2.0], WavSpec::mono(44100, 16)).unwrap();
        let (loaded, _) = read_wav(file.path()).unwrap();
        assert!((loaded[0] - 32767.0 / 32768.0).abs() < 1e-12);
        assert_eq!(loaded[1], -1.0);
    }

    #[test]
    fn test_stereo_spec_duplicates_and_mixes_down() {
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            channels: 2,
            ..WavSpec::mono(22050, 32)
        };
        write_wav(file.path(), &[0.5, -0.25], spec).unwrap();

        let info = read_wav_info(file.path()).unwrap();
        assert_eq!(info.channels, 2);
        assert_eq!(info.num_frames, 2);
        assert_eq!(info.format, WavFormat::IeeeFloat);

        let (loaded, _) = read_wav(file.path()).unwrap();
        assert_eq!(loaded, vec![0.5, -0.25]);
    }

    #[test]
    fn test_unsupported_bit_depth() {
        let file = NamedTempFile::new().unwrap();
        let err = write_wav(file.path(), &[0.0], WavSpec::mono(44100, 12)).unwrap_err();
        assert!(matches!(err, Error::Wav(hound::Error::Unsupported)));
    }
}
