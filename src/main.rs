//! cherry-pick - cherry-pick commits through the GitHub API

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::{PickOptions, run_auth, run_init, run_pick};
use cherry_pick_bot::config::load_config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Cherry-pick commits onto a branch without a local clone
#[derive(Parser, Debug)]
#[command(name = "cherry-pick")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GitHub token (defaults to GITHUB_TOKEN, GH_TOKEN, then `gh auth token`)
    #[arg(long, global = true)]
    github_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay commits onto a branch, as a pull request or directly
    Pick {
        /// Repository as owner/repo or a GitHub URL
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repo: String,

        /// Branch receiving the commits
        #[arg(short, long)]
        branch: String,

        /// Commit to cherry-pick (repeat to pick several, applied in order)
        #[arg(short, long = "commit", required = true)]
        commits: Vec<String>,

        /// Update the branch directly instead of opening a pull request
        #[arg(long)]
        direct: bool,

        /// Pull request title (defaults to the first commit's summary)
        #[arg(long)]
        title: Option<String>,

        /// Show what would happen without touching the repository
        #[arg(long)]
        dry_run: bool,

        /// Show the plan and ask before proceeding
        #[arg(long)]
        confirm: bool,
    },

    /// Show which token would be used and who it belongs to
    Auth,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Pick {
            repo,
            branch,
            commits,
            direct,
            title,
            dry_run,
            confirm,
        } => {
            let options = PickOptions {
                direct,
                title,
                dry_run,
                confirm,
            };
            run_pick(
                &config,
                &repo,
                &branch,
                &commits,
                cli.github_token.as_deref(),
                options,
            )
            .await?;
        }
        Commands::Auth => {
            run_auth(&config, cli.github_token.as_deref()).await?;
        }
        Commands::Init { force } => {
            run_init(cli.config.as_deref(), force)?;
        }
    }

    Ok(())
}
