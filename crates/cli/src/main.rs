//! MindWell CLI - migrations, onboarding, and sample status tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations for the handler service
//! mindwell migrate
//!
//! # Onboard a user against the configured backend
//! mindwell onboard -n "Alex Kim" -e alex@example.com --age 29
//!
//! # Inspect or change sample status through the handlers
//! mindwell sample status MW-2041
//! mindwell sample set-status --email alex@example.com --status shipped
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "mindwell")]
#[command(author, version, about = "MindWell CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Run the onboarding workflow
    Onboard(commands::onboard::OnboardArgs),
    /// Query or update sample status
    Sample {
        #[command(subcommand)]
        action: SampleAction,
    },
}

#[derive(Subcommand)]
enum SampleAction {
    /// Show the public status of a kit
    Status {
        /// Kit tracking ID
        tracking_id: String,
    },
    /// Mark a kit as analyzed
    MarkAnalyzed {
        /// Kit tracking ID
        tracking_id: String,
    },
    /// Set the status of every kit owned by an email
    SetStatus {
        #[arg(short, long)]
        email: String,

        /// pending, collected, shipped, delivered, analyzed, or done
        #[arg(short, long)]
        status: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mindwell_app=info,mindwell=info")),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Onboard(args) => commands::onboard::run(args).await?,
        Commands::Sample { action } => match action {
            SampleAction::Status { tracking_id } => commands::sample::status(&tracking_id).await?,
            SampleAction::MarkAnalyzed { tracking_id } => {
                commands::sample::mark_analyzed(&tracking_id).await?;
            }
            SampleAction::SetStatus { email, status } => {
                commands::sample::set_status(&email, &status).await?;
            }
        },
    }
    Ok(())
}
