//! Pending command - List items waiting to be stamped

use anyhow::Result;
use clap::Args;
use docstamp_core::domain::StampingItem;

use super::{report, CommandContext};

#[derive(Debug, Args)]
pub struct PendingCommand {}

impl PendingCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let fmt = ctx.formatter();
        let service = ctx.service()?;

        let items = service
            .list_pending()
            .await
            .map_err(|e| report(&*fmt, e))?;

        if ctx.is_json() {
            fmt.print_json(&serde_json::json!({
                "count": items.len(),
                "items": items,
            }));
            return Ok(());
        }

        if items.is_empty() {
            fmt.success("No items waiting to be stamped");
            return Ok(());
        }

        fmt.success(&format!(
            "{} item{} waiting to be stamped",
            items.len(),
            if items.len() == 1 { "" } else { "s" }
        ));
        for item in &items {
            fmt.info(&describe(item));
        }

        Ok(())
    }
}

/// One-line summary of an item for human output
fn describe(item: &StampingItem) -> String {
    let submitter = item.submitter_name.as_deref().unwrap_or("(unknown submitter)");
    match &item.creation_date {
        Some(created) => format!("#{:<6} {}  created {}", item.id, submitter, created),
        None => format!("#{:<6} {}", item.id, submitter),
    }
}
