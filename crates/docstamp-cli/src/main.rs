//! DocStamp CLI - Command-line front end for the stamping workflow
//!
//! Provides commands for:
//! - Signing in to the SharePoint site
//! - Listing items waiting to be stamped
//! - Downloading an item's attachment
//! - Uploading the stamped document and staging the item for filing
//! - Managing cached credentials and configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use docstamp_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    auth::AuthCommand, config::ConfigCommand, download::DownloadCommand,
    pending::PendingCommand, sign_in::SignInCommand, upload::UploadCommand, CommandContext,
};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "docstamp",
    version,
    about = "Stamp reviewed documents held in a SharePoint list"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Verify the signed-in identity against the site
    SignIn(SignInCommand),
    /// List items waiting to be stamped
    Pending(PendingCommand),
    /// Download an item's attachment
    Download(DownloadCommand),
    /// Replace an item's attachment with a stamped document
    Upload(UploadCommand),
    /// Manage cached credentials
    #[command(subcommand)]
    Auth(AuthCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Picks the tracing filter directive
///
/// `-v` flags override the configured level; `RUST_LOG` overrides both.
fn log_filter(verbose: u8, quiet: bool, configured: &str) -> String {
    match (verbose, quiet) {
        (0, true) => "error".to_string(),
        (0, false) => configured.to_string(),
        (1, _) => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    // Setup tracing
    let filter = log_filter(cli.verbose, cli.quiet, &config.logging.level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let ctx = CommandContext {
        config,
        config_path,
        format,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::SignIn(cmd) => cmd.execute(&ctx).await,
        Commands::Pending(cmd) => cmd.execute(&ctx).await,
        Commands::Download(cmd) => cmd.execute(&ctx).await,
        Commands::Upload(cmd) => cmd.execute(&ctx).await,
        Commands::Auth(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
    };

    if let Err(e) = result {
        get_formatter(cli.json, cli.quiet).error(&format!("{e:#}"));
        std::process::exit(1);
    }

    Ok(())
}
