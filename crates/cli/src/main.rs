//! Corner Shop CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! shop-cli migrate
//!
//! # Clear products and users, recreate the mock user
//! shop-cli seed
//!
//! # Same, and refill the product cache from the inventory API
//! shop-cli seed --fetch
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Reset catalog cache, users and carts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(author, version, about = "Corner Shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Reset products, users and carts
    Seed {
        /// Refill the product cache from the inventory API immediately
        #[arg(long)]
        fetch: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { fetch } => commands::seed::run(fetch).await?,
    }
    Ok(())
}
