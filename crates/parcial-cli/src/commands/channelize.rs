//! Harmonic labeling against a reference Partial.

use super::common::{load_partials, save_partials};
use clap::Args;
use parcial_analysis::FrequencyReference;
use parcial_core::Label;
use parcial_transform::Channelizer;
use std::path::PathBuf;

#[derive(Args)]
pub struct ChannelizeArgs {
    /// Input Partial file (JSON)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output Partial file (JSON)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Harmonic number of the reference Partial
    #[arg(long, default_value = "1")]
    ref_label: Label,

    /// Lowest frequency of the reference Partial, Hz
    #[arg(long)]
    min_freq: f64,

    /// Highest frequency of the reference Partial, Hz
    #[arg(long)]
    max_freq: f64,
}

pub fn run(args: ChannelizeArgs) -> anyhow::Result<()> {
    let mut partials = load_partials(&args.input)?;

    let reference = FrequencyReference::new(&partials, args.min_freq, args.max_freq)?;
    let channelizer = Channelizer::new(reference, args.ref_label)?;
    let labeled = channelizer.channelize(&mut partials);
    println!(
        "Labeled {labeled} of {} Partials (reference label {})",
        partials.len(),
        args.ref_label
    );

    save_partials(&args.output, &partials)
}
