//! Morphing between two Partial collections.

use super::common::{load_partials, parse_points, save_partials};
use clap::Args;
use parcial_core::LinearEnvelope;
use parcial_transform::Morpher;
use std::path::PathBuf;

#[derive(Args)]
pub struct MorphArgs {
    /// Source Partial file at weight 0 (JSON)
    #[arg(value_name = "SOURCE0")]
    source0: PathBuf,

    /// Source Partial file at weight 1 (JSON)
    #[arg(value_name = "SOURCE1")]
    source1: PathBuf,

    /// Output Partial file (JSON)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Weight for every parameter as time:value points (e.g., "0:0,1:1")
    #[arg(long, value_parser = parse_points, default_value = "0:0,1:1")]
    weight: LinearEnvelope,

    /// Frequency weight, overriding --weight
    #[arg(long, value_parser = parse_points)]
    frequency: Option<LinearEnvelope>,

    /// Amplitude weight, overriding --weight
    #[arg(long, value_parser = parse_points)]
    amplitude: Option<LinearEnvelope>,

    /// Bandwidth weight, overriding --weight
    #[arg(long, value_parser = parse_points)]
    bandwidth: Option<LinearEnvelope>,
}

pub fn run(args: MorphArgs) -> anyhow::Result<()> {
    let src0 = load_partials(&args.source0)?;
    let src1 = load_partials(&args.source1)?;

    let morpher = Morpher::new(
        args.frequency.unwrap_or_else(|| args.weight.clone()),
        args.amplitude.unwrap_or_else(|| args.weight.clone()),
        args.bandwidth.unwrap_or(args.weight),
    );
    let morphed = morpher.morph(&src0, &src1)?;
    println!(
        "Morphed {} and {} Partials into {}",
        src0.len(),
        src1.len(),
        morphed.len()
    );

    save_partials(&args.output, &morphed)
}
