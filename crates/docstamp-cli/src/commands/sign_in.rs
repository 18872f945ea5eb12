//! Sign-in command - Verify the signed-in identity
//!
//! Probes the site as the current user. A rejected credential is dropped and
//! the probe repeated once, which may open a browser for a fresh login.

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{report, CommandContext};

#[derive(Debug, Args)]
pub struct SignInCommand {}

impl SignInCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let fmt = ctx.formatter();
        let service = ctx.service()?;

        info!(site = %ctx.config.site.url, "Signing in");
        let identity = service
            .sign_in()
            .await
            .map_err(|e| report(&*fmt, e))?;

        if ctx.is_json() {
            fmt.print_json(&serde_json::json!({
                "success": true,
                "site": ctx.config.site.url,
                "user": identity,
            }));
        } else {
            fmt.success(&format!("Signed in as {}", identity.title));
            if let Some(email) = &identity.email {
                fmt.info(&format!("Email: {}", email));
            }
            fmt.info(&format!("Site: {}", ctx.config.site.url));
        }

        Ok(())
    }
}
