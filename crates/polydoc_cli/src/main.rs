//! polydoc CLI
//!
//! Command-line tools for polydoc schemas and settings.
//!
//! # Commands
//!
//! - `partition` - Show the partition plan of a schema file
//! - `settings` - Validate a settings file
//! - `simulate` - Replay saves and show the retained history

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// polydoc command-line tools.
#[derive(Parser)]
#[command(name = "polydoc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(global = true, short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the indexes a schema gets after uniqueness partitioning
    Partition {
        /// Path to a schema JSON file
        schema: PathBuf,
    },

    /// Validate a settings file and print the effective versioning settings
    Settings {
        /// Path to a settings JSON file
        settings: PathBuf,

        /// Retention cap assumed when the file has no maxVersions entry
        #[arg(long, default_value = "20")]
        default_max_versions: u32,
    },

    /// Replay saves of one document and print the retained history
    Simulate {
        /// Number of saves to replay
        #[arg(short, long, default_value = "10")]
        saves: u32,

        /// Retention cap (0 keeps everything)
        #[arg(short, long, default_value = "20")]
        max_versions: u32,

        /// Locale of the saves
        #[arg(short, long, default_value = "en")]
        locale: String,

        /// Publish every save immediately
        #[arg(long)]
        auto_publish: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Partition { schema } => {
            commands::partition::run(&schema, &cli.format)?;
        }
        Commands::Settings {
            settings,
            default_max_versions,
        } => {
            commands::settings::run(&settings, default_max_versions, &cli.format)?;
        }
        Commands::Simulate {
            saves,
            max_versions,
            locale,
            auto_publish,
        } => {
            let options = commands::simulate::SimulateOptions {
                saves,
                max_versions,
                locale,
                auto_publish,
            };
            commands::simulate::run(&options, &cli.format)?;
        }
        Commands::Version => {
            println!("polydoc CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
