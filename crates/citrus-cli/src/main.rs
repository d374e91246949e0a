//! Citrus CLI - run the amp live, render files through it, inspect devices.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "citrus")]
#[command(author, version, about = "Citrus guitar amp", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play through the amp in real time
    Play(commands::play::PlayArgs),

    /// List audio devices
    Devices(commands::devices::DevicesArgs),

    /// Render a WAV file through the amp
    Render(commands::render::RenderArgs),

    /// Print the control snapshot as JSON
    Snapshot(commands::snapshot::SnapshotArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Snapshot(args) => commands::snapshot::run(args),
    }
}
