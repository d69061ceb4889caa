//! Snacklane CLI - database migrations, seeding and staff management.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! snl migrate
//!
//! # Insert default system settings (existing values are kept)
//! snl seed settings
//!
//! # Load categories and products from a YAML file
//! snl seed catalog -f catalog.yaml
//!
//! # Grant staff access to a Telegram user
//! snl staff add -t 123456789 -r admin -u ops_lead
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "snl")]
#[command(author, version, about = "Snacklane CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Seed reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage staff users
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert default system settings
    Settings,
    /// Load categories and products from YAML
    Catalog {
        /// Path to the catalog YAML file
        #[arg(short, long)]
        file: String,
    },
}

#[derive(Subcommand)]
enum StaffAction {
    /// Create a staff user, or change the role of an existing user
    Add {
        /// Telegram user id
        #[arg(short, long)]
        telegram_id: i64,

        /// Staff role (`manager` or `admin`)
        #[arg(short, long, default_value = "manager")]
        role: String,

        /// Telegram username, without the leading @
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Revoke staff access (the user becomes a client again)
    Revoke {
        /// Telegram user id
        #[arg(short, long)]
        telegram_id: i64,
    },
    /// List staff users
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Settings => {
                commands::seed::settings().await?;
            }
            SeedTarget::Catalog { file } => {
                commands::seed::catalog(&file).await?;
            }
        },
        Commands::Staff { action } => match action {
            StaffAction::Add {
                telegram_id,
                role,
                username,
            } => {
                commands::staff::add(telegram_id, &role, username.as_deref()).await?;
            }
            StaffAction::Revoke { telegram_id } => commands::staff::revoke(telegram_id).await?,
            StaffAction::List => commands::staff::list().await?,
        },
    }
    Ok(())
}
