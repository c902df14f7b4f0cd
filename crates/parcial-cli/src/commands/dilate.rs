//! Time warping between marker lists.

use super::common::{load_partials, save_partials};
use clap::Args;
use parcial_transform::Dilator;
use std::path::PathBuf;

#[derive(Args)]
pub struct DilateArgs {
    /// Input Partial file (JSON)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output Partial file (JSON)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Initial marker times, comma separated (e.g., "0.1,0.5,1.2")
    #[arg(long, value_delimiter = ',', required = true)]
    initial: Vec<f64>,

    /// Target marker times, one per initial time
    #[arg(long, value_delimiter = ',', required = true)]
    target: Vec<f64>,
}

pub fn run(args: DilateArgs) -> anyhow::Result<()> {
    let mut partials = load_partials(&args.input)?;

    let dilator = Dilator::new(&args.initial, &args.target)?;
    dilator.dilate_all(&mut partials);
    println!(
        "Dilated {} Partials with {} markers",
        partials.len(),
        dilator.len()
    );

    save_partials(&args.output, &partials)
}
