// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Ls, Version};

#[cfg(feature = "fuse")]
use cli::Mount;

use secretfs::{AppConfig, Config};

#[cfg(feature = "fuse")]
command_enum! {
    (Ls, Ls),
    (Mount, Mount),
    (Version, Version),
}

#[cfg(not(feature = "fuse"))]
command_enum! {
    (Ls, Ls),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Config file first, then global flags on top
    let config = match AppConfig::load(args.config.as_deref())
        .and_then(|app| Config::resolve(app, args.log_level, args.log_dir.clone()))
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let ctx = cli::op::OpContext::new(config);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
