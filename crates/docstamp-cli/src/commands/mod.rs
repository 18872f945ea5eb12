//! CLI subcommands

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use docstamp_core::config::Config;
use docstamp_core::{StampService, WorkflowError};
use docstamp_sharepoint::SharePointSessionProvider;
use tracing::{debug, warn};

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

pub mod auth;
pub mod config;
pub mod download;
pub mod pending;
pub mod sign_in;
pub mod upload;

/// State shared by every subcommand
pub struct CommandContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl CommandContext {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.is_json(), self.quiet)
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Builds the stamping service for the configured site
    ///
    /// Ctrl-C cancels whatever remote call is in flight.
    pub fn service(&self) -> Result<StampService> {
        let sessions = SharePointSessionProvider::from_config(&self.config, true)
            .context("Failed to set up SharePoint credentials")?;
        debug!(site = %sessions.site_url(), list = %self.config.site.list, "Connecting");

        let service = StampService::from_config(Arc::new(sessions), &self.config)
            .context("Invalid workflow configuration")?;

        let token = service.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                token.cancel();
            }
        });

        Ok(service)
    }
}

/// Operator hint for a failed workflow call, if there is one
pub(crate) fn hint(err: &WorkflowError) -> Option<&'static str> {
    match err {
        WorkflowError::PartialReplacement { .. } => {
            Some("The swap stopped midway; run the same upload again to resume it.")
        }
        WorkflowError::Authentication(_) => Some("Run `docstamp auth login` to sign in again."),
        e if e.is_retryable() => Some("This failure may be temporary; try again."),
        _ => None,
    }
}

/// Prints the hint for `err` and hands it back for propagation
pub(crate) fn report(fmt: &dyn OutputFormatter, err: WorkflowError) -> anyhow::Error {
    if let Some(hint) = hint(&err) {
        fmt.warn(hint);
    }
    err.into()
}
