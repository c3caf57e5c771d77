pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "secretfs")]
#[command(about = "Mount a directory of Shamir shares as a read-only filesystem of secrets")]
#[command(version)]
pub struct Args {
    /// Path to a config file (defaults to <config dir>/secretfs/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level, overriding the config file (RUST_LOG still wins)
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// Directory for daily rolling log files
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
