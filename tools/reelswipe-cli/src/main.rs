//! ReelSwipe CLI: replay recorded frames through the gesture pipeline.
//!
//! Usage:
//!   reelswipe replay <DIR>     Detect swipes in a directory of frames
//!   reelswipe check            List motion backends and validate config
//!   reelswipe init-config      Write the default config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod keys;

#[derive(Parser)]
#[command(
    name = "reelswipe",
    about = "Hands-free reel navigation from camera swipe gestures",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the standard location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a directory of recorded frames through the detector (dry run, no keys sent)
    Replay(commands::replay::ReplayArgs),

    /// List motion backends and validate the configuration
    Check,

    /// Write the default configuration file
    InitConfig {
        /// Output path (defaults to the standard config location)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;

    // Initialize logging
    if cli.verbose {
        reelswipe_common::logging::init_verbose_logging(&config.logging);
    } else {
        reelswipe_common::logging::init_logging(&config.logging);
    }

    match cli.command {
        Commands::Replay(args) => commands::replay::run(args, config),
        Commands::Check => commands::check::run(&config, cli.config.as_deref()),
        Commands::InitConfig { output, force } => commands::init_config::run(output, force),
    }
}
