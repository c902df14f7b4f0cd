//! TOML configuration for parcial analysis-to-synthesis pipelines.
//!
//! A [`PipelineConfig`] collects the settings of every stage run by the
//! `parcial pipeline` command: channelization, sifting, distillation,
//! optional re-gridding, and rendering with jitter. Each stage's section
//! is optional in the file and falls back to the library defaults.
//!
//! Loading validates every setting against the preconditions of the stage
//! it configures, so a config that loads cleanly will not be rejected by
//! the stage constructors later.
//!
//! # Example
//!
//! ```rust
//! use parcial_config::{PipelineConfig, ResampleMode};
//!
//! let config = PipelineConfig::from_toml(
//!     r#"
//!     [channelize]
//!     ref_label = 1
//!     min_freq = 180.0
//!     max_freq = 260.0
//!
//!     [resample]
//!     mode = "dense"
//!     interval = 0.005
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.channelize.min_freq, 180.0);
//! assert_eq!(config.resample.mode, ResampleMode::Dense);
//! assert_eq!(config.synthesis.sample_rate, 44100);
//! ```

mod error;
mod pipeline;

pub use error::ConfigError;
pub use pipeline::{
    ChannelizeSection, DistillSection, JitterSection, MorphSection, PipelineConfig,
    ResampleMode, ResampleSection, SieveSection, SynthesisSection,
};
