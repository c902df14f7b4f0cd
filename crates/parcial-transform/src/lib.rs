//! Parcial Transform - editing collections of Partials
//!
//! This crate provides the manipulations that turn raw analysis output into
//! a labeled, harmonically organized collection, and then reshape it:
//!
//! - [`Channelizer`] - label Partials by harmonic number against a reference
//! - [`Sieve`] - unlabel shorter Partials that collide within a label
//! - [`Distiller`] - fuse each label's Partials into one
//! - [`Collator`] - join unlabeled fragments into fewer Partials
//! - [`Dilator`] - piecewise-linear time warping
//! - [`Resampler`] - re-grid Breakpoints onto a regular time grid
//! - [`Morpher`] - interpolate between two distilled collections
//!
//! ## Example Workflow
//!
//! ```rust
//! use parcial_core::{Breakpoint, Partial};
//! use parcial_transform::{Channelizer, Distiller, Sieve};
//!
//! let harmonic = |f: f64, start: f64, end: f64| {
//!     let mut p = Partial::new();
//!     p.insert(start, Breakpoint::new(f, 0.1, 0.0, 0.0));
//!     p.insert(end, Breakpoint::new(f, 0.1, 0.0, 0.0));
//!     p
//! };
//! let mut partials = vec![
//!     harmonic(220.0, 0.0, 1.0),
//!     harmonic(440.0, 0.0, 0.4),
//!     harmonic(441.0, 0.6, 1.0),
//! ];
//!
//! // 1. Label by harmonic number against a steady 220 Hz reference
//! Channelizer::new(220.0, 1).unwrap().channelize(&mut partials);
//!
//! // 2. Clear collisions within each label
//! Sieve::new(0.0001).unwrap().sift(&mut partials);
//!
//! // 3. One Partial per label
//! let distilled = Distiller::default().distill(partials);
//! assert_eq!(distilled.len(), 2);
//! assert_eq!(distilled[1].label(), 2);
//! ```

pub mod channelizer;
pub mod collator;
pub mod dilator;
pub mod distiller;
pub mod morpher;
pub mod resampler;
pub mod sieve;

pub use channelizer::Channelizer;
pub use collator::{Collator, DEFAULT_FADE_TIME, DEFAULT_GAP_TIME};
pub use dilator::Dilator;
pub use distiller::Distiller;
pub use morpher::Morpher;
pub use resampler::Resampler;
pub use sieve::Sieve;
