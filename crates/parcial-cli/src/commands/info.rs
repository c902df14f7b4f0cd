//! Display Partial file contents or rendered WAV metadata.

use super::common::{linear_to_db, load_partials, peak};
use clap::Args;
use parcial_core::partial_utils::{
    average_frequency, count_label, label_range, peak_amplitude, time_span,
};
use parcial_io::{WavFormat, read_wav, read_wav_info};
use std::path::{Path, PathBuf};

/// Display Partial file or WAV file information.
#[derive(Args)]
pub struct InfoArgs {
    /// Path to a Partial file (JSON) or a rendered WAV file
    pub file: PathBuf,

    /// List every Partial
    #[arg(short, long)]
    pub list: bool,
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    if is_wav(&args.file) {
        return wav_info(&args.file);
    }

    let partials = load_partials(&args.file)?;
    let breakpoints: usize = partials.iter().map(|p| p.len()).sum();
    let unlabeled = count_label(&partials, 0);

    println!("File:        {}", args.file.display());
    println!("Partials:    {} ({unlabeled} unlabeled)", partials.len());
    println!("Breakpoints: {breakpoints}");
    match label_range(&partials) {
        Some((lo, hi)) => println!("Labels:      {lo}..{hi}"),
        None => println!("Labels:      none"),
    }
    match time_span(&partials) {
        Some((t0, t1)) => println!("Time span:   {t0:.4}s - {t1:.4}s ({:.4}s)", t1 - t0),
        None => println!("Time span:   empty"),
    }

    if args.list {
        println!();
        println!(
            "{:>6}  {:>9}  {:>9}  {:>6}  {:>10}  {:>8}",
            "label", "start", "end", "bps", "freq (Hz)", "peak"
        );
        for p in &partials {
            if p.is_empty() {
                println!("{:>6}  {:>9}  {:>9}  {:>6}", p.label(), "-", "-", 0);
                continue;
            }
            println!(
                "{:>6}  {:>9.4}  {:>9.4}  {:>6}  {:>10.2}  {:>8.4}",
                p.label(),
                p.start_time(),
                p.end_time(),
                p.len(),
                average_frequency(p),
                peak_amplitude(p)
            );
        }
    }

    Ok(())
}

fn wav_info(path: &Path) -> anyhow::Result<()> {
    let info = read_wav_info(path)?;
    let (samples, _) = read_wav(path)?;

    let format_str = match info.format {
        WavFormat::Pcm => "PCM",
        WavFormat::IeeeFloat => "IEEE Float",
    };

    println!("File:        {}", path.display());
    println!("Format:      {} {}-bit", format_str, info.bits_per_sample);
    println!("Channels:    {}", info.channels);
    println!("Sample Rate: {} Hz", info.sample_rate);
    println!(
        "Duration:    {:.3}s ({} frames)",
        info.duration_secs, info.num_frames
    );
    println!("Peak:        {:.1} dB", linear_to_db(peak(&samples)));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_wav() {
        assert!(is_wav(Path::new("out.wav")));
        assert!(is_wav(Path::new("dir/OUT.WAV")));
        assert!(!is_wav(Path::new("partials.json")));
        assert!(!is_wav(Path::new("wav")));
    }
}
