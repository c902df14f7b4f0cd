//! Strike out colliding same-labeled Partials.

use super::common::{load_partials, save_partials};
use clap::Args;
use parcial_transform::Sieve;
use std::path::PathBuf;

#[derive(Args)]
pub struct SiftArgs {
    /// Input Partial file (JSON)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output Partial file (JSON)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Minimum gap between same-labeled Partials, seconds
    #[arg(long, default_value = "0.0001")]
    min_gap_time: f64,

    /// Drop every unlabeled Partial after sifting
    #[arg(long)]
    remove: bool,
}

pub fn run(args: SiftArgs) -> anyhow::Result<()> {
    let mut partials = load_partials(&args.input)?;

    let struck = Sieve::new(args.min_gap_time)?.sift(&mut partials);
    println!("Struck {struck} of {} Partials", partials.len());

    if args.remove {
        partials.retain(|p| p.label() != 0);
    }
    save_partials(&args.output, &partials)
}
