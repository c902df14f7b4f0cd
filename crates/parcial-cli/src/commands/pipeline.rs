//! Full analysis-to-render pipeline driven by a TOML config.

use super::common::{linear_to_db, load_partials, peak, render_partials, save_partials};
use anyhow::Context;
use clap::Args;
use parcial_analysis::FrequencyReference;
use parcial_config::{PipelineConfig, ResampleMode};
use parcial_core::{Envelope, Partial};
use parcial_io::{WavSpec, write_wav};
use parcial_synth::{Synthesizer, SynthesizerParams};
use parcial_transform::{Channelizer, Distiller, Resampler, Sieve};
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct PipelineArgs {
    /// Input Partial file (JSON)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Pipeline config (TOML); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write the processed Partials to this file (JSON)
    #[arg(long)]
    partials_out: Option<PathBuf>,
}

pub fn run(args: PipelineArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading pipeline config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(name) = &config.name {
        println!("Pipeline: {name}");
    }

    let partials = load_partials(&args.input)?;
    let partials = process(&config, partials)?;

    if let Some(path) = &args.partials_out {
        save_partials(path, &partials)?;
    }

    let s = &config.synthesis;
    let params = SynthesizerParams::new(f64::from(s.sample_rate))?.with_fade_time(s.fade_time)?;
    let mut synth = Synthesizer::new(params)?;
    let j = &config.jitter;
    if j.is_enabled() {
        synth.configure_jitter(
            Envelope::Constant(j.gain),
            Envelope::Constant(j.coherence),
            j.cutoff_label,
        );
    }

    println!("Rendering {} Partials at {} Hz...", partials.len(), s.sample_rate);
    let buffer = render_partials(&mut synth, &partials)?;
    println!(
        "  {} samples, peak {:.1} dB",
        buffer.len(),
        linear_to_db(peak(&buffer))
    );

    write_wav(
        &args.output,
        &buffer,
        WavSpec::mono(s.sample_rate, s.bits_per_sample),
    )?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

/// Channelize, sift, distill and optionally resample.
fn process(config: &PipelineConfig, mut partials: Vec<Partial>) -> anyhow::Result<Vec<Partial>> {
    let c = &config.channelize;
    let reference = FrequencyReference::new(&partials, c.min_freq, c.max_freq)
        .context("finding a reference Partial")?;
    let labeled = Channelizer::new(reference, c.ref_label)?.channelize(&mut partials);
    info!("channelize: labeled {labeled} of {} Partials", partials.len());

    let struck = Sieve::new(config.sieve.min_gap_time)?.sift(&mut partials);
    info!("sift: struck {struck} Partials");

    let d = &config.distill;
    let mut partials = Distiller::new(d.fade_time, d.gap_time)?.distill(partials);
    info!("distill: {} Partials", partials.len());

    let r = &config.resample;
    let resampler = Resampler::new(r.interval)?.with_phase_correct(r.phase_correct);
    match r.mode {
        ResampleMode::Off => {}
        ResampleMode::Dense => resampler.resample_all(&mut partials),
        ResampleMode::Sparse => resampler.resample_sparse_all(&mut partials),
    }

    Ok(partials)
}
