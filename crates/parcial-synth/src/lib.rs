//! Parcial Synth - bandwidth-enhanced additive synthesis of Partials
//!
//! This crate renders [`Partial`](parcial_core::Partial)s into sample
//! buffers.
//!
//! # Components
//!
//! - [`Synthesizer`] - frames each Partial with fades and accumulates it into
//!   a caller-owned buffer, optionally with coherent/incoherent phase jitter
//! - [`Oscillator`] - per-sample bandwidth-enhanced oscillator with explicit
//!   state reset entry points for hosts that drive it block by block
//! - [`NoiseGenerator`] - seeded, filtered gaussian noise
//! - [`Filter`] - Direct Form II ARMA filter
//!
//! # Example
//!
//! ```rust
//! use parcial_core::{Breakpoint, Envelope, Partial};
//! use parcial_synth::{Synthesizer, SynthesizerParams};
//!
//! let mut p = Partial::with_label(1);
//! p.insert(0.0, Breakpoint::new(220.0, 0.0, 0.0, 0.0));
//! p.insert(0.05, Breakpoint::new(220.0, 0.3, 0.2, 0.0));
//! p.insert(0.2, Breakpoint::new(230.0, 0.0, 0.2, 0.0));
//!
//! let mut synth = Synthesizer::new(SynthesizerParams::new(22050.0).unwrap()).unwrap();
//! synth.configure_jitter(Envelope::Constant(0.1), Envelope::Constant(0.5), 16);
//!
//! let mut samples = Vec::new();
//! synth.synthesize(&p, &mut samples).unwrap();
//! assert!(samples.iter().all(|s| s.is_finite()));
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc`). Disable the
//! default `std` feature:
//!
//! ```toml
//! [dependencies]
//! parcial-synth = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod filter;
pub mod noise;
pub mod oscillator;
pub mod synthesizer;

pub use filter::Filter;
pub use noise::NoiseGenerator;
pub use oscillator::{BANDWIDTH_SEED, COHERENT_SEED, INCOHERENT_SEED, Oscillator};
pub use synthesizer::{
    DEFAULT_FADE_TIME, DEFAULT_SAMPLE_RATE, JitterConfig, Synthesizer, SynthesizerParams,
};
