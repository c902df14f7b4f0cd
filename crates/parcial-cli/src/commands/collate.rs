//! Join unlabeled Partials.

use super::common::{load_partials, save_partials};
use clap::Args;
use parcial_transform::{Collator, DEFAULT_FADE_TIME, DEFAULT_GAP_TIME};
use std::path::PathBuf;

#[derive(Args)]
pub struct CollateArgs {
    /// Input Partial file (JSON)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output Partial file (JSON)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Fade time at joins, seconds
    #[arg(long, default_value_t = DEFAULT_FADE_TIME)]
    fade_time: f64,

    /// Silent gap required between joined pieces, seconds
    #[arg(long, default_value_t = DEFAULT_GAP_TIME)]
    gap_time: f64,
}

pub fn run(args: CollateArgs) -> anyhow::Result<()> {
    let partials = load_partials(&args.input)?;
    let before = partials.len();

    let collated = Collator::new(args.fade_time, args.gap_time)?.collate(partials);
    println!("Collated {before} Partials into {}", collated.len());

    save_partials(&args.output, &collated)
}
