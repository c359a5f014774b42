//! HealthGuard CLI
//!
//! Operator tools for a HealthGuard data directory.
//!
//! # Commands
//!
//! - `inspect` - List collections with record counts and snapshots
//! - `backups` - List a collection's snapshots
//! - `restore` - Roll a collection back to its newest snapshot
//! - `hash-password` / `verify-password` - Work with stored credentials
//! - `init-admin` - Create the platform administrator account

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use healthguard_core::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// HealthGuard record store tools.
#[derive(Parser)]
#[command(name = "healthguard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(
        global = true,
        short,
        long,
        env = "HEALTHGUARD_DATA_DIR",
        default_value = "data"
    )]
    data_dir: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for listings.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Format {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List collections with record counts, counters and snapshots
    Inspect {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List snapshots of a collection
    Backups {
        /// Collection name
        collection: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Restore a collection from its newest snapshot
    Restore {
        /// Collection name
        collection: String,
    },

    /// Hash a password into the stored `salt$digest` form
    HashPassword {
        /// Plain-text password
        password: String,
    },

    /// Check a password against a stored hash
    VerifyPassword {
        /// Plain-text password
        password: String,

        /// Stored `salt$digest` value
        stored: String,
    },

    /// Create the platform administrator if it does not exist
    InitAdmin {
        /// Administrator password
        #[arg(short, long, default_value = healthguard_core::bootstrap::DEFAULT_ADMIN_PASSWORD)]
        password: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::with_data_dir(&cli.data_dir);

    match cli.command {
        Commands::Inspect { format } => {
            commands::inspect::run(config, format)?;
        }
        Commands::Backups { collection, format } => {
            commands::backup::list(config, &collection, format)?;
        }
        Commands::Restore { collection } => {
            commands::backup::restore(config, &collection)?;
        }
        Commands::HashPassword { password } => {
            commands::password::hash(&password);
        }
        Commands::VerifyPassword { password, stored } => {
            commands::password::verify(&password, &stored)?;
        }
        Commands::InitAdmin { password } => {
            commands::init_admin::run(config, &password)?;
        }
        Commands::Version => {
            println!("HealthGuard CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("HealthGuard Core v{}", healthguard_core::VERSION);
        }
    }

    Ok(())
}
