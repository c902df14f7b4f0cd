//! Parcial Core - the Partial data model
//!
//! This crate holds the types every other parcial crate operates on: a
//! sound is a collection of [`Partial`]s, each a labeled, time-ordered
//! sequence of bandwidth-enhanced [`Breakpoint`]s.
//!
//! # Data Model
//!
//! - [`Breakpoint`] - frequency, amplitude, bandwidth (noise fraction), phase
//! - [`Partial`] - labeled sequence of Breakpoints with interpolated queries
//! - [`Envelope`] / [`LinearEnvelope`] - control functions of time
//!
//! # Operations
//!
//! - [`Breakpoint::add_noise_energy`] - energy-conserving noise mixing
//! - [`partial_utils`] - crop, shift, scale, and collection statistics
//! - [`phase`] - phase wrapping and phase correction
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc`).
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! parcial-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use parcial_core::{Breakpoint, Partial};
//!
//! let mut p = Partial::with_label(1);
//! p.insert(0.0, Breakpoint::new(440.0, 0.0, 0.0, 0.0));
//! p.insert(0.1, Breakpoint::new(440.0, 0.5, 0.1, 0.0));
//! p.insert(0.5, Breakpoint::new(445.0, 0.0, 0.1, 0.0));
//!
//! assert_eq!(p.duration(), 0.5);
//! assert_eq!(p.amplitude_at(0.05), 0.25);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod breakpoint;
pub mod envelope;
pub mod error;
pub mod partial;
pub mod partial_utils;
pub mod phase;

pub use breakpoint::{Breakpoint, make_null_after, make_null_before};
pub use envelope::{Envelope, LinearEnvelope};
pub use error::{Error, Result};
pub use partial::{Label, Partial, SHORTEST_SAFE_FADE_TIME};
pub use phase::{TWO_PI, wrap_pi, wrap_two_pi};
