mod commands;
mod pipeline;

pub use pipeline::{render_board, render_grid, resolve_config, Pipeline, DEFAULT_CONFIG_FILE};

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Read the state of a tube color-sorting puzzle from a screenshot
#[derive(Debug, Parser)]
#[command(name = "sortpuz", version, about)]
struct Cli {
    /// Calibration file (.toml or .json). Defaults to ./color_parsing.toml,
    /// then to the built-in calibration.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: commands::Command,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let default_filter = ["sortpuz", "sortpuz_lib", "sortpuz_vision", "sortpuz_data", "sortpuz_capture"]
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli.command.execute(cli.config.as_deref())
}
