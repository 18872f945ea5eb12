//! Upload command - Replace an item's attachment with the stamped document
//!
//! The original attachment is deleted, the stamped file added under the
//! configured name, and the item staged for filing. If the swap stops
//! midway, running the same upload again resumes it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::Args;
use docstamp_core::domain::ItemId;
use tracing::info;

use super::{report, CommandContext};

#[derive(Debug, Args)]
pub struct UploadCommand {
    /// List item ID
    pub id: ItemId,

    /// Stamped document to upload
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// FILE already holds base64 text rather than the raw document
    #[arg(long)]
    pub base64: bool,
}

impl UploadCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let fmt = ctx.formatter();

        let payload = self.read_payload().await?;
        let service = ctx.service()?;

        info!(id = %self.id, file = %self.file.display(), "Uploading stamped document");
        service
            .upload_stamped(self.id, &payload)
            .await
            .map_err(|e| report(&*fmt, e))?;

        if ctx.is_json() {
            fmt.print_json(&serde_json::json!({
                "success": true,
                "id": self.id,
                "stamped_file_name": ctx.config.workflow.stamped_file_name,
            }));
        } else {
            fmt.success(&format!("Item {} stamped and staged for filing", self.id));
            fmt.info(&format!(
                "Attachment stored as {}",
                ctx.config.workflow.stamped_file_name
            ));
        }

        Ok(())
    }

    /// The file's content as the base64 text the workflow expects
    async fn read_payload(&self) -> Result<String> {
        let data = tokio::fs::read(&self.file)
            .await
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        if self.base64 {
            String::from_utf8(data).context("Base64 payload is not valid UTF-8")
        } else {
            Ok(STANDARD.encode(data))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn command(file: PathBuf, base64: bool) -> UploadCommand {
        UploadCommand {
            id: ItemId::new(12).unwrap(),
            file,
            base64,
        }
    }

    #[tokio::test]
    async fn test_raw_file_is_encoded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.7 stamped").unwrap();

        let payload = command(file.path().to_path_buf(), false)
            .read_payload()
            .await
            .unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), b"%PDF-1.7 stamped");
    }

    #[tokio::test]
    async fn test_base64_file_is_passed_through() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"JVBERi0xLjc=\n").unwrap();

        let payload = command(file.path().to_path_buf(), true)
            .read_payload()
            .await
            .unwrap();
        assert_eq!(payload, "JVBERi0xLjc=\n");
    }

    #[tokio::test]
    async fn test_missing_file_names_path() {
        let err = command(PathBuf::from("/nonexistent/stamped.pdf"), false)
            .read_payload()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/stamped.pdf"));
    }
}
