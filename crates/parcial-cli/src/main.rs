//! Parcial CLI - command-line interface for the parcial sound modeling tools.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parcial")]
#[command(author, version, about = "Partial-based sound modeling CLI", long_about = None)]
struct Cli {
    /// Log per-stage detail (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a Partial file
    Info(commands::info::InfoArgs),

    /// Label Partials by harmonic number against a reference Partial
    Channelize(commands::channelize::ChannelizeArgs),

    /// Fuse same-labeled Partials into one Partial per label
    Distill(commands::distill::DistillArgs),

    /// Join unlabeled Partials that do not overlap in time
    Collate(commands::collate::CollateArgs),

    /// Unlabel shorter Partials that collide with a longer same-labeled one
    Sift(commands::sift::SiftArgs),

    /// Warp Partial timing so initial marker times land on target times
    Dilate(commands::dilate::DilateArgs),

    /// Move Breakpoints onto a regular time grid
    Resample(commands::resample::ResampleArgs),

    /// Morph between two distilled Partial files
    Morph(commands::morph::MorphArgs),

    /// Synthesize Partials into a WAV file
    Render(commands::render::RenderArgs),

    /// Estimate the fundamental frequency of a Partial collection
    F0(commands::f0::F0Args),

    /// Run channelize, sift, distill, resample and render from a TOML config
    Pipeline(commands::pipeline::PipelineArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Channelize(args) => commands::channelize::run(args),
        Commands::Distill(args) => commands::distill::run(args),
        Commands::Collate(args) => commands::collate::run(args),
        Commands::Sift(args) => commands::sift::run(args),
        Commands::Dilate(args) => commands::dilate::run(args),
        Commands::Resample(args) => commands::resample::run(args),
        Commands::Morph(args) => commands::morph::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::F0(args) => commands::f0::run(args),
        Commands::Pipeline(args) => commands::pipeline::run(args),
    }
}
