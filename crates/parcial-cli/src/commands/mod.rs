//! CLI command implementations.

pub mod channelize;
pub mod collate;
pub mod common;
pub mod dilate;
pub mod distill;
pub mod f0;
pub mod info;
pub mod morph;
pub mod pipeline;
pub mod render;
pub mod resample;
pub mod sift;
