//! Fuse same-labeled Partials.

use super::common::{load_partials, save_partials};
use clap::Args;
use parcial_transform::{DEFAULT_FADE_TIME, DEFAULT_GAP_TIME, Distiller};
use std::path::PathBuf;

#[derive(Args)]
pub struct DistillArgs {
    /// Input Partial file (JSON)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output Partial file (JSON)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Fade time at fused seams, seconds
    #[arg(long, default_value_t = DEFAULT_FADE_TIME)]
    fade_time: f64,

    /// Silent gap required between fused pieces, seconds
    #[arg(long, default_value_t = DEFAULT_GAP_TIME)]
    gap_time: f64,
}

pub fn run(args: DistillArgs) -> anyhow::Result<()> {
    let partials = load_partials(&args.input)?;
    let before = partials.len();

    let distilled = Distiller::new(args.fade_time, args.gap_time)?.distill(partials);
    println!("Distilled {before} Partials into {}", distilled.len());

    save_partials(&args.output, &distilled)
}
