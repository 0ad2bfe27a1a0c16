//! Inlay CLI - static-site asset pipeline with dev server and live reload.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "inlay")]
#[command(about = "Static-site asset pipeline with dev server and live reload")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to inlay.toml config file
    #[arg(short, long, default_value = "inlay.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize an asset source tree in the current project
    Init {
        /// Skip interactive prompts, overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Clean, build all assets, then serve with file watching and live reload
    Dev {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Open a browser tab
        #[arg(long)]
        open: bool,
    },

    /// Clean and build all assets for production
    Build {
        /// Output directory (defaults to config or "dist")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Preview a built destination tree
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve (defaults to the configured destination)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(yes).await?;
        }
        Commands::Dev { port, open } => {
            commands::dev::run(&cli.config, port, open).await?;
        }
        Commands::Build { output } => {
            commands::build::run(&cli.config, output).await?;
        }
        Commands::Serve { port, dir } => {
            commands::serve::run(&cli.config, port, dir).await?;
        }
    }

    Ok(())
}
