use anyhow::Result;
use clap::{CommandFactory, Parser};

mod cli;
mod config;
mod engine;
mod library;
mod player;
mod playlist;
mod runtime;
mod ui;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("attacca {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if cli.inputs.is_empty() {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    init_tracing();

    let settings = runtime::load_settings();
    runtime::run(&cli, &settings)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
