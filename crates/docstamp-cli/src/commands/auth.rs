//! Auth commands - Login, Logout, and Status for the SharePoint site
//!
//! Provides the `docstamp auth` CLI subcommands which:
//! 1. `login`  - Runs the OAuth2 PKCE flow and caches tokens in the system keyring
//! 2. `logout` - Drops the cached tokens for the configured site
//! 3. `status` - Shows whether a token is cached and when it expires

use anyhow::{Context, Result};
use clap::Subcommand;
use docstamp_sharepoint::auth::Tokens;
use docstamp_sharepoint::credentials::{CredentialStore, ACCESS_TOKEN_ENV};
use docstamp_sharepoint::session::on_demand_store;
use tracing::info;

use super::CommandContext;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Authenticate with the SharePoint site via OAuth2
    Login {
        /// Custom Azure App ID
        #[arg(long)]
        app_id: Option<String>,
    },
    /// Remove stored credentials
    Logout,
    /// Check authentication status
    Status,
}

impl AuthCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            AuthCommand::Login { app_id } => self.execute_login(ctx, app_id.as_deref()).await,
            AuthCommand::Logout => self.execute_logout(ctx).await,
            AuthCommand::Status => self.execute_status(ctx),
        }
    }

    async fn execute_login(&self, ctx: &CommandContext, cli_app_id: Option<&str>) -> Result<()> {
        let fmt = ctx.formatter();

        let mut config = ctx.config.clone();
        if let Some(app_id) = cli_app_id {
            config.auth.app_id = Some(app_id.to_string());
        }
        let store = on_demand_store(&config)
            .context("Use --app-id or set auth.app_id in config.yaml")?;

        info!(account = %store.account(), "Starting OAuth2 login");
        fmt.info("Opening browser for Microsoft login...");
        let tokens = store.login().await.context("OAuth2 login failed")?;

        if ctx.is_json() {
            fmt.print_json(&serde_json::json!({
                "success": true,
                "account": store.account(),
                "expires_at": tokens.expires_at.to_rfc3339(),
            }));
        } else {
            fmt.success(&format!("Authenticated with {}", store.account()));
            fmt.info(&format!("Token expires at {}", tokens.expires_at.to_rfc3339()));
        }

        Ok(())
    }

    async fn execute_logout(&self, ctx: &CommandContext) -> Result<()> {
        let fmt = ctx.formatter();
        let store = on_demand_store(&ctx.config)?;

        if store.cached()?.is_none() {
            fmt.info("No credentials cached. Nothing to log out.");
            return Ok(());
        }

        store
            .invalidate()
            .await
            .context("Failed to clear tokens from keyring")?;

        if ctx.is_json() {
            fmt.print_json(&serde_json::json!({
                "success": true,
                "account": store.account(),
            }));
        } else {
            fmt.success(&format!("Logged out of {}", store.account()));
        }

        Ok(())
    }

    fn execute_status(&self, ctx: &CommandContext) -> Result<()> {
        let fmt = ctx.formatter();

        if std::env::var_os(ACCESS_TOKEN_ENV).is_some() {
            fmt.warn(&format!(
                "{} is set; it takes precedence over cached credentials",
                ACCESS_TOKEN_ENV
            ));
        }

        let store = on_demand_store(&ctx.config)?;
        let cached = store.cached()?;

        if ctx.is_json() {
            fmt.print_json(&serde_json::json!({
                "account": store.account(),
                "status": status_label(cached.as_ref()),
                "expires_at": cached.as_ref().map(|t| t.expires_at.to_rfc3339()),
                "refreshable": cached.as_ref().is_some_and(|t| t.refresh_token.is_some()),
            }));
            return Ok(());
        }

        match &cached {
            None => {
                fmt.info(&format!("Not signed in to {}", store.account()));
                fmt.info("Run 'docstamp auth login' to sign in.");
            }
            Some(tokens) => {
                fmt.success(&format!("Signed in to {}", store.account()));
                fmt.info(&format!(
                    "Access token {} ({})",
                    status_label(Some(tokens)),
                    tokens.expires_at.to_rfc3339()
                ));
                if tokens.refresh_token.is_none() {
                    fmt.warn("No refresh token cached; a browser login will be needed on expiry");
                }
            }
        }

        Ok(())
    }
}

fn status_label(tokens: Option<&Tokens>) -> &'static str {
    match tokens {
        None => "signed_out",
        Some(t) if t.is_expired() => "expired",
        Some(_) => "valid",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn tokens(expires_in: Duration) -> Tokens {
        Tokens {
            access_token: "a".to_string(),
            refresh_token: None,
            expires_at: Utc::now() + expires_in,
        }
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label(None), "signed_out");
        assert_eq!(status_label(Some(&tokens(Duration::hours(1)))), "valid");
        assert_eq!(status_label(Some(&tokens(Duration::hours(-1)))), "expired");
    }
}
