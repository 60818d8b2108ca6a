pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "paste")]
#[command(about = "Store and retrieve end-to-end encrypted pastes over a ledger channel")]
pub struct Args {
    /// Path to the config directory (defaults to ~/.tanglepaste)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Give up on a store or retrieve after this many seconds
    #[arg(long, global = true, default_value_t = 120)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: crate::Command,
}
