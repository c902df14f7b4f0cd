//! File I/O for the parcial workspace.
//!
//! This crate provides:
//!
//! - **Partial files**: [`read_partials`] and [`write_partials`] store a
//!   labeled Partial collection as JSON
//! - **WAV file I/O**: [`read_wav`] and [`write_wav`] for rendered sample
//!   buffers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parcial_io::{read_partials, write_wav, WavSpec};
//! use parcial_synth::{Synthesizer, SynthesizerParams};
//!
//! let partials = read_partials("clarinet.json")?;
//!
//! let mut synth = Synthesizer::new(SynthesizerParams::new(44100.0)?)?;
//! let mut buffer = Vec::new();
//! synth.synthesize_all(&partials, &mut buffer)?;
//!
//! write_wav("clarinet.wav", &buffer, WavSpec::default())?;
//! ```

mod partials;
mod wav;

pub use partials::{
    BreakpointRecord, FORMAT_VERSION, PartialFile, PartialRecord, partials_from_json,
    partials_to_json, read_partials, write_partials,
};
pub use wav::{WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, write_wav};

/// Error types for parcial file I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored Partial breaks a data model invariant.
    #[error("Invalid Partial: {0}")]
    InvalidPartial(String),
}

/// Convenience result type for parcial file I/O.
pub type Result<T> = std::result::Result<T, Error>;
