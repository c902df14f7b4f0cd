//! Breakpoint re-gridding.

use super::common::{load_partials, save_partials};
use clap::Args;
use parcial_transform::Resampler;
use std::path::PathBuf;

#[derive(Args)]
pub struct ResampleArgs {
    /// Input Partial file (JSON)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output Partial file (JSON)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Grid interval, seconds
    #[arg(long)]
    interval: f64,

    /// Move existing Breakpoints to the grid instead of sampling every grid time
    #[arg(long)]
    sparse: bool,

    /// Adjust frequencies to match stored phases afterwards
    #[arg(long)]
    phase_correct: bool,
}

pub fn run(args: ResampleArgs) -> anyhow::Result<()> {
    let mut partials = load_partials(&args.input)?;
    let before: usize = partials.iter().map(|p| p.len()).sum();

    let resampler = Resampler::new(args.interval)?.with_phase_correct(args.phase_correct);
    if args.sparse {
        resampler.resample_sparse_all(&mut partials);
    } else {
        resampler.resample_all(&mut partials);
    }

    let after: usize = partials.iter().map(|p| p.len()).sum();
    println!(
        "Resampled {} Partials at {}s: {before} -> {after} Breakpoints",
        partials.len(),
        args.interval
    );

    save_partials(&args.output, &partials)
}
