//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use parcial_core::{LinearEnvelope, Partial};
use parcial_io::{read_partials, write_partials};
use parcial_synth::Synthesizer;
use std::path::Path;
use tracing::{info, warn};

/// Read a Partial file, naming the path on failure.
pub fn load_partials(path: &Path) -> anyhow::Result<Vec<Partial>> {
    let partials =
        read_partials(path).with_context(|| format!("reading Partials from {}", path.display()))?;
    info!("loaded {} Partials from {}", partials.len(), path.display());
    Ok(partials)
}

/// Write a Partial file, naming the path on failure.
pub fn save_partials(path: &Path, partials: &[Partial]) -> anyhow::Result<()> {
    write_partials(path, partials)
        .with_context(|| format!("writing Partials to {}", path.display()))?;
    info!("wrote {} Partials to {}", partials.len(), path.display());
    Ok(())
}

/// Parse a `time:value` list such as `0:0,1.5:1` for clap's `value_parser`.
pub fn parse_points(s: &str) -> Result<LinearEnvelope, String> {
    let mut env = LinearEnvelope::new();
    for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (t, v) = pair
            .split_once(':')
            .ok_or_else(|| format!("Invalid point '{pair}' (expected time:value)"))?;
        let t: f64 = t.trim().parse().map_err(|_| format!("Invalid time '{t}'"))?;
        let v: f64 = v.trim().parse().map_err(|_| format!("Invalid value '{v}'"))?;
        if !t.is_finite() || !v.is_finite() {
            return Err(format!("Point '{pair}' is not finite"));
        }
        env.insert(t, v);
    }
    if env.is_empty() {
        return Err("Envelope needs at least one time:value point".to_string());
    }
    Ok(env)
}

/// Progress bar in the workspace's style.
pub fn progress_bar(len: u64) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    Ok(pb)
}

/// Render every non-empty Partial into a fresh buffer, reporting progress.
pub fn render_partials(synth: &mut Synthesizer, partials: &[Partial]) -> anyhow::Result<Vec<f64>> {
    let sounding: Vec<&Partial> = partials.iter().filter(|p| !p.is_empty()).collect();
    let skipped = partials.len() - sounding.len();
    if skipped > 0 {
        warn!("skipping {skipped} empty Partials");
    }

    let needed = sounding
        .iter()
        .map(|p| synth.required_length(p))
        .max()
        .unwrap_or(0);
    let mut buffer = vec![0.0; needed];

    let pb = progress_bar(sounding.len() as u64)?;
    for p in sounding {
        synth
            .synthesize(p, &mut buffer)
            .with_context(|| format!("rendering Partial with label {}", p.label()))?;
        pb.inc(1);
    }
    pb.finish_with_message("done");
    Ok(buffer)
}

/// Largest absolute sample value.
pub fn peak(samples: &[f64]) -> f64 {
    samples.iter().map(|s| s.abs()).fold(0.0, f64::max)
}

/// Linear gain to dB, floored at -120 dB.
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_points() {
        let env = parse_points("0:0, 2:1").unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env.value_at(1.0), 0.5);
    }

    #[test]
    fn test_parse_points_rejects_garbage() {
        assert!(parse_points("").is_err());
        assert!(parse_points("0.5").is_err());
        assert!(parse_points("a:1").is_err());
        assert!(parse_points("0:inf").is_err());
    }

    #[test]
    fn test_linear_to_db() {
        assert_eq!(linear_to_db(0.0), -120.0);
        assert!((linear_to_db(1.0)).abs() < 1e-12);
        assert!((linear_to_db(0.5) + 6.0206).abs() < 1e-3);
    }
}
