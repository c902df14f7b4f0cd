//! Fundamental frequency estimation from Partials.

use super::common::load_partials;
use clap::Args;
use parcial_analysis::{DEFAULT_AMP_FLOOR_DB, DEFAULT_PRECISION, FundamentalFromPartials};
use std::path::PathBuf;

#[derive(Args)]
pub struct F0Args {
    /// Input Partial file (JSON)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Lowest candidate fundamental, Hz
    #[arg(long)]
    min_freq: f64,

    /// Highest candidate fundamental, Hz
    #[arg(long)]
    max_freq: f64,

    /// Estimate only at this time, seconds
    #[arg(long)]
    at: Option<f64>,

    /// Spacing of estimates over the collection's span, seconds
    #[arg(long, default_value = "0.01")]
    interval: f64,

    /// Frequency resolution of the estimate, Hz
    #[arg(long, default_value_t = DEFAULT_PRECISION)]
    precision: f64,

    /// Ignore Partials quieter than this, dB relative to full scale
    #[arg(long, default_value_t = DEFAULT_AMP_FLOOR_DB, allow_hyphen_values = true)]
    amp_floor: f64,
}

pub fn run(args: F0Args) -> anyhow::Result<()> {
    let partials = load_partials(&args.input)?;
    let tracker = FundamentalFromPartials::new(args.precision)?.with_amp_floor(args.amp_floor)?;

    if let Some(t) = args.at {
        let est = tracker.estimate_at(&partials, t, args.min_freq, args.max_freq)?;
        println!(
            "F0 at {t:.4}s: {:.3} Hz (confidence {:.4})",
            est.frequency(),
            est.confidence()
        );
        return Ok(());
    }

    let envelope =
        tracker.build_envelope_over_span(&partials, args.interval, args.min_freq, args.max_freq)?;
    println!("{:>10}  {:>10}", "time (s)", "f0 (Hz)");
    for (t, f) in envelope.iter() {
        println!("{t:>10.4}  {f:>10.3}");
    }
    println!("{} estimates", envelope.len());

    Ok(())
}
