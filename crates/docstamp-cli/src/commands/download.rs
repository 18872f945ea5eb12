//! Download command - Fetch an item's single attachment
//!
//! Without `--output` the base64 payload is written to stdout, exactly as
//! the workflow hands it out. With `--output` it is decoded and saved.

use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::Args;
use docstamp_core::domain::ItemId;
use tracing::info;

use super::{report, CommandContext};

#[derive(Debug, Args)]
pub struct DownloadCommand {
    /// List item ID
    pub id: ItemId,

    /// Save the decoded document to FILE
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl DownloadCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let fmt = ctx.formatter();
        let service = ctx.service()?;

        let encoded = service
            .download_attachment(self.id)
            .await
            .map_err(|e| report(&*fmt, e))?;

        let Some(path) = &self.output else {
            if ctx.is_json() {
                fmt.print_json(&serde_json::json!({
                    "id": self.id,
                    "content_base64": encoded,
                }));
            } else {
                fmt.payload(&encoded);
            }
            return Ok(());
        };

        let data = STANDARD
            .decode(&encoded)
            .context("Downloaded payload is not valid base64")?;
        tokio::fs::write(path, &data)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(id = %self.id, path = %path.display(), bytes = data.len(), "Saved attachment");

        if ctx.is_json() {
            fmt.print_json(&serde_json::json!({
                "id": self.id,
                "path": path.display().to_string(),
                "bytes": data.len(),
            }));
        } else {
            fmt.success(&format!("Saved item {} attachment to {}", self.id, path.display()));
            fmt.info(&format!("{} bytes", data.len()));
        }

        Ok(())
    }
}
