//! Config command - View and manage DocStamp configuration
//!
//! Provides the `docstamp config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors

use anyhow::{Context, Result};
use clap::Subcommand;
use docstamp_core::config::Config;
use tracing::info;

use super::CommandContext;

/// Keys accepted by `config set`, with a short description each
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("site.url", "Absolute URL of the SharePoint site"),
    ("site.list", "Web-relative URL of the review list"),
    ("site.request_timeout_secs", "Per-call deadline in seconds"),
    ("workflow.stamped_file_name", "Name the stamped attachment is stored under"),
    ("workflow.determination", "Determination an item needs to be listed"),
    ("auth.app_id", "Azure AD application ID"),
    ("auth.tenant", "Tenant ID, domain, or 'organizations'"),
    ("auth.redirect_uri", "Loopback redirect URI for login"),
    ("logging.level", "trace|debug|info|warn|error"),
];

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "site.list")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Set { key, value } => self.execute_set(ctx, key, value).await,
            ConfigCommand::Validate => self.execute_validate(ctx),
        }
    }

    fn execute_show(&self, ctx: &CommandContext) -> Result<()> {
        let fmt = ctx.formatter();
        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(&ctx.config)
                .context("Failed to serialize configuration to JSON")?;
            fmt.print_json(&json);
        } else {
            fmt.success(&format!("Configuration ({})", ctx.config_path.display()));
            fmt.info("");
            let yaml = serde_yaml::to_string(&ctx.config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                fmt.info(line);
            }
        }

        Ok(())
    }

    async fn execute_set(&self, ctx: &CommandContext, key: &str, value: &str) -> Result<()> {
        let fmt = ctx.formatter();
        let mut config = ctx.config.clone();

        info!(key = %key, value = %value, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if ctx.is_json() {
                fmt.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "error": e.to_string(),
                }));
            } else {
                fmt.error(&format!("Failed to set '{}': {}", key, e));
                fmt.info("");
                fmt.info("Supported keys:");
                for (name, description) in SUPPORTED_KEYS {
                    fmt.info(&format!("  {:<28} - {}", name, description));
                }
            }
            return Ok(());
        }

        // Only reject errors the new value introduced
        let errors: Vec<String> = config
            .validate()
            .iter()
            .filter(|e| e.field == key)
            .map(|e| e.message.clone())
            .collect();
        if !errors.is_empty() {
            if ctx.is_json() {
                fmt.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "errors": errors,
                }));
            } else {
                fmt.error(&format!("Invalid value for '{}': {}", key, errors.join("; ")));
            }
            return Ok(());
        }

        if let Some(parent) = ctx.config_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create configuration directory")?;
        }
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
        tokio::fs::write(&ctx.config_path, yaml)
            .await
            .context("Failed to write configuration file")?;

        if ctx.is_json() {
            fmt.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": value,
                "config_path": ctx.config_path.display().to_string(),
            }));
        } else {
            fmt.success(&format!("Set {} = {}", key, value));
            fmt.info(&format!("Saved to {}", ctx.config_path.display()));
        }

        Ok(())
    }

    fn execute_validate(&self, ctx: &CommandContext) -> Result<()> {
        let fmt = ctx.formatter();
        let path = &ctx.config_path;

        // Load explicitly; the context's copy silently fell back to defaults
        let config = match Config::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                let message = if path.exists() {
                    format!("Failed to parse configuration: {}", e)
                } else {
                    "Configuration file not found. Using defaults.".to_string()
                };
                if ctx.is_json() {
                    fmt.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": path.display().to_string(),
                        "errors": [message],
                    }));
                } else if path.exists() {
                    fmt.error(&message);
                    fmt.info(&format!("File: {}", path.display()));
                } else {
                    fmt.info(&format!("Configuration file not found at {}", path.display()));
                    fmt.info("Using default configuration. Run 'docstamp config set <key> <value>' to create one.");
                }
                return Ok(());
            }
        };

        info!(config_path = %path.display(), "Validating configuration");
        let errors = config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            fmt.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            fmt.success("Configuration is valid");
            fmt.info(&format!("File: {}", path.display()));
        } else {
            fmt.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            fmt.info(&format!("File: {}", path.display()));
            fmt.info("");
            for error in &errors {
                fmt.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(())
    }
}

/// Apply a dot-notation key/value pair to a Config struct
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- site ---
        "site.url" => config.site.url = value.trim_end_matches('/').to_string(),
        "site.list" => config.site.list = value.to_string(),
        "site.request_timeout_secs" => {
            config.site.request_timeout_secs = value
                .parse::<u64>()
                .context("Expected a positive integer for site.request_timeout_secs")?;
        }

        // --- workflow ---
        "workflow.stamped_file_name" => config.workflow.stamped_file_name = value.to_string(),
        "workflow.determination" => config.workflow.determination = value.to_string(),

        // --- auth ---
        "auth.app_id" => {
            config.auth.app_id = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.to_string())
            };
        }
        "auth.tenant" => config.auth.tenant = value.to_string(),
        "auth.redirect_uri" => config.auth.redirect_uri = value.to_string(),

        // --- logging ---
        "logging.level" => config.logging.level = value.to_string(),

        _ => anyhow::bail!("Unknown configuration key: '{}'", key),
    }

    Ok(())
}
