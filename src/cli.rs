//! Command-line argument surface.

use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments.
///
/// Running with no arguments prints usage and exits cleanly; the version
/// flag is handled by hand so that `-v` works alongside `--version`.
#[derive(Debug, Parser)]
#[command(
    name = "attacca",
    about = "A minimal terminal playlist player",
    disable_version_flag = true
)]
pub struct Cli {
    /// Audio files or directories to queue, in the order given.
    pub inputs: Vec<PathBuf>,

    /// Shuffle the playlist once after loading.
    #[arg(short, long)]
    pub shuffle: bool,

    /// Print version information and exit.
    #[arg(short = 'v', long)]
    pub version: bool,
}
