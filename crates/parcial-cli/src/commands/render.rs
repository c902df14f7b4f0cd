//! Additive synthesis to WAV.

use super::common::{linear_to_db, load_partials, peak, render_partials};
use clap::Args;
use parcial_core::{Envelope, Label};
use parcial_io::{WavSpec, write_wav};
use parcial_synth::{DEFAULT_FADE_TIME, Synthesizer, SynthesizerParams};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Input Partial file (JSON)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Output sample rate in Hz
    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    /// Fade in/out time around each Partial, seconds
    #[arg(long, default_value_t = DEFAULT_FADE_TIME)]
    fade_time: f64,

    /// Output bit depth (8, 16, 24, or 32 for float)
    #[arg(long, default_value = "16")]
    bit_depth: u16,

    /// Phase jitter gain in radians (0 disables jitter)
    #[arg(long, default_value = "0.0")]
    jitter_gain: f64,

    /// Fraction of jitter shared between low harmonics, 0 to 1
    #[arg(long, default_value = "0.0")]
    jitter_coherence: f64,

    /// Highest label receiving coherent jitter
    #[arg(long, default_value = "0")]
    cutoff_label: Label,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let partials = load_partials(&args.input)?;

    let params =
        SynthesizerParams::new(f64::from(args.sample_rate))?.with_fade_time(args.fade_time)?;
    let mut synth = Synthesizer::new(params)?;
    if args.jitter_gain > 0.0 {
        if !(0.0..=1.0).contains(&args.jitter_coherence) {
            anyhow::bail!(
                "jitter coherence must be between 0 and 1, got {}",
                args.jitter_coherence
            );
        }
        synth.configure_jitter(
            Envelope::Constant(args.jitter_gain),
            Envelope::Constant(args.jitter_coherence),
            args.cutoff_label,
        );
    }

    println!(
        "Rendering {} Partials at {} Hz...",
        partials.len(),
        args.sample_rate
    );
    let buffer = render_partials(&mut synth, &partials)?;

    let level = peak(&buffer);
    println!(
        "  {} samples, {:.3}s, peak {:.1} dB",
        buffer.len(),
        buffer.len() as f64 / f64::from(args.sample_rate),
        linear_to_db(level)
    );

    println!("Writing {}...", args.output.display());
    write_wav(
        &args.output,
        &buffer,
        WavSpec::mono(args.sample_rate, args.bit_depth),
    )?;
    println!("Done!");

    Ok(())
}
