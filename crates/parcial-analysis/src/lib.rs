//! Parcial Analysis - pitch tools for collections of Partials
//!
//! This crate estimates frequency trajectories that drive channelization
//! and labeling:
//!
//! - [`f0`] - maximum-likelihood fundamental frequency from spectral peaks
//! - [`fundamental`] - fundamental tracking over a set of Partials
//! - [`frequency_reference`] - reference envelope from the longest Partial
//!   in a frequency band
//!
//! ## Example Workflow
//!
//! ```rust
//! use parcial_analysis::{FrequencyReference, FundamentalFromPartials};
//! use parcial_core::{Breakpoint, Partial};
//!
//! let partials: Vec<Partial> = (1..=4)
//!     .map(|k| {
//!         let f = 110.0 * f64::from(k);
//!         let mut p = Partial::new();
//!         p.insert(0.0, Breakpoint::new(f, 0.2, 0.0, 0.0));
//!         p.insert(0.5, Breakpoint::new(f * 1.01, 0.2, 0.0, 0.0));
//!         p
//!     })
//!     .collect();
//!
//! // 1. Track the fundamental
//! let f0 = FundamentalFromPartials::default()
//!     .build_envelope_over_span(&partials, 0.05, 80.0, 150.0)
//!     .unwrap();
//! assert!(!f0.is_empty());
//!
//! // 2. Or take the first harmonic's own trajectory as the reference
//! let reference = FrequencyReference::new(&partials, 100.0, 120.0).unwrap();
//! assert!((reference.value_at(0.25) - 110.55).abs() < 0.01);
//! ```

pub mod f0;
pub mod frequency_reference;
pub mod fundamental;

pub use f0::{F0Estimate, MAX_HARMONIC, MAX_SECANT_ITERATIONS, normalized_likelihood};
pub use frequency_reference::FrequencyReference;
pub use fundamental::{DEFAULT_AMP_FLOOR_DB, DEFAULT_PRECISION, FundamentalFromPartials};
