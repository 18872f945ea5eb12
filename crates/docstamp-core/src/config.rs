//! Configuration module for DocStamp.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::AttachmentName;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for DocStamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub workflow: WorkflowConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Remote store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute URL of the SharePoint site (web) hosting the review list.
    pub url: String,
    /// Web-relative URL of the review list, e.g. `Lists/Reviews`.
    pub list: String,
    /// Deadline in seconds for each individual remote call.
    pub request_timeout_secs: u64,
}

/// Stamping workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// File name the stamped attachment is stored under.
    pub stamped_file_name: String,
    /// Filing determination an item needs to be offered for stamping.
    pub determination: String,
}

/// Authentication / OAuth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Azure AD Application (client) ID. `None` until configured.
    pub app_id: Option<String>,
    /// Directory tenant: a tenant ID, a domain, or `organizations`.
    pub tenant: String,
    /// Loopback redirect URI for the interactive login.
    pub redirect_uri: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/docstamp/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("docstamp")
            .join("config.yaml")
    }
}

impl SiteConfig {
    /// Per-call deadline as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "https://nysemail.sharepoint.com/sites/DOS/corp/Data".to_string(),
            list: "Lists/OathOfOfficeReviews1".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            stamped_file_name: "stamped.pdf".to_string(),
            determination: "Accepted".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            tenant: "organizations".to_string(),
            redirect_uri: "http://127.0.0.1:8400/callback".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"site.url"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- site ---
        if !(self.site.url.starts_with("https://") || self.site.url.starts_with("http://")) {
            errors.push(ValidationError {
                field: "site.url".into(),
                message: format!("must be an absolute http(s) URL: '{}'", self.site.url),
            });
        }
        if self.site.list.trim_matches('/').is_empty() {
            errors.push(ValidationError {
                field: "site.list".into(),
                message: "must not be empty".into(),
            });
        }
        if self.site.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "site.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- workflow ---
        if let Err(e) = AttachmentName::new(self.workflow.stamped_file_name.clone()) {
            errors.push(ValidationError {
                field: "workflow.stamped_file_name".into(),
                message: e.to_string(),
            });
        }
        if self.workflow.determination.trim().is_empty() {
            errors.push(ValidationError {
                field: "workflow.determination".into(),
                message: "must not be empty".into(),
            });
        }

        // --- auth ---
        if self.auth.tenant.trim().is_empty() {
            errors.push(ValidationError {
                field: "auth.tenant".into(),
                message: "must not be empty".into(),
            });
        }
        if !self.auth.redirect_uri.starts_with("http://127.0.0.1:")
            && !self.auth.redirect_uri.starts_with("http://localhost:")
        {
            errors.push(ValidationError {
                field: "auth.redirect_uri".into(),
                message: format!(
                    "must be a loopback URI with an explicit port: '{}'",
                    self.auth.redirect_uri
                ),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use docstamp_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .site_url("https://contoso.sharepoint.com/sites/Reviews")
///     .site_list("Lists/Reviews")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- site ---

    pub fn site_url(mut self, url: impl Into<String>) -> Self {
        self.config.site.url = url.into();
        self
    }

    pub fn site_list(mut self, list: impl Into<String>) -> Self {
        self.config.site.list = list.into();
        self
    }

    pub fn site_request_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.site.request_timeout_secs = seconds;
        self
    }

    // --- workflow ---

    pub fn workflow_stamped_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.workflow.stamped_file_name = name.into();
        self
    }

    pub fn workflow_determination(mut self, determination: impl Into<String>) -> Self {
        self.config.workflow.determination = determination.into();
        self
    }

    // --- auth ---

    pub fn auth_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.config.auth.app_id = Some(app_id.into());
        self
    }

    pub fn auth_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.config.auth.tenant = tenant.into();
        self
    }

    pub fn auth_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.auth.redirect_uri = uri.into();
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert!(cfg.site.url.starts_with("https://"));
        assert_eq!(cfg.site.list, "Lists/OathOfOfficeReviews1");
        assert_eq!(cfg.site.request_timeout_secs, 30);
        assert_eq!(cfg.site.request_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.workflow.stamped_file_name, "stamped.pdf");
        assert_eq!(cfg.workflow.determination, "Accepted");
        assert!(cfg.auth.app_id.is_none());
        assert_eq!(cfg.auth.tenant, "organizations");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
site:
  url: https://contoso.sharepoint.com/sites/Reviews
  list: Lists/Filings
  request_timeout_secs: 10
workflow:
  stamped_file_name: final.pdf
  determination: Approved
auth:
  app_id: "test-app-id-123"
  tenant: contoso.onmicrosoft.com
  redirect_uri: http://localhost:9000/cb
logging:
  level: debug
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.site.url, "https://contoso.sharepoint.com/sites/Reviews");
        assert_eq!(cfg.site.list, "Lists/Filings");
        assert_eq!(cfg.site.request_timeout_secs, 10);
        assert_eq!(cfg.workflow.stamped_file_name, "final.pdf");
        assert_eq!(cfg.workflow.determination, "Approved");
        assert_eq!(cfg.auth.app_id, Some("test-app-id-123".to_string()));
        assert_eq!(cfg.auth.tenant, "contoso.onmicrosoft.com");
        assert_eq!(cfg.auth.redirect_uri, "http://localhost:9000/cb");
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn load_partial_yaml_fills_defaults() {
        let yaml = "site:\n  list: Lists/Other\n";
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.site.list, "Lists/Other");
        assert_eq!(cfg.site.request_timeout_secs, 30);
        assert_eq!(cfg.workflow.stamped_file_name, "stamped.pdf");
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(cfg.site.request_timeout_secs, 30);
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"not: [valid: yaml: {{{").unwrap();
        tmp.flush().unwrap();

        assert!(Config::load(tmp.path()).is_err());
    }

    // -- Validation --

    #[test]
    fn validate_catches_bad_site() {
        let mut cfg = Config::default();
        cfg.site.url = "contoso.sharepoint.com".to_string();
        cfg.site.list = "/".to_string();
        cfg.site.request_timeout_secs = 0;
        let errors = cfg.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"site.url"));
        assert!(fields.contains(&"site.list"));
        assert!(fields.contains(&"site.request_timeout_secs"));
    }

    #[test]
    fn validate_catches_bad_stamped_file_name() {
        let mut cfg = Config::default();
        cfg.workflow.stamped_file_name = "out/stamped.pdf".to_string();
        let errors = cfg.validate();
        assert!(errors
            .iter()
            .any(|e| e.field == "workflow.stamped_file_name"));
    }

    #[test]
    fn validate_catches_empty_determination() {
        let mut cfg = Config::default();
        cfg.workflow.determination = "  ".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "workflow.determination"));
    }

    #[test]
    fn validate_catches_non_loopback_redirect() {
        let mut cfg = Config::default();
        cfg.auth.redirect_uri = "https://example.com/callback".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "auth.redirect_uri"));
    }

    #[test]
    fn validate_accepts_all_valid_log_levels() {
        for level in VALID_LOG_LEVELS {
            let mut cfg = Config::default();
            cfg.logging.level = level.to_string();
            assert!(
                !cfg.validate().iter().any(|e| e.field == "logging.level"),
                "level '{level}' should be valid"
            );
        }

        let mut cfg = Config::default();
        cfg.logging.level = "verbose".to_string();
        assert!(cfg.validate().iter().any(|e| e.field == "logging.level"));
    }

    // -- Builder --

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .site_url("https://contoso.sharepoint.com/sites/A")
            .site_list("Lists/B")
            .site_request_timeout_secs(5)
            .workflow_stamped_file_name("done.pdf")
            .workflow_determination("Approved")
            .auth_app_id("my-app-id")
            .auth_tenant("contoso.com")
            .auth_redirect_uri("http://127.0.0.1:9999/cb")
            .logging_level("warn")
            .build();

        assert_eq!(cfg.site.url, "https://contoso.sharepoint.com/sites/A");
        assert_eq!(cfg.site.list, "Lists/B");
        assert_eq!(cfg.site.request_timeout_secs, 5);
        assert_eq!(cfg.workflow.stamped_file_name, "done.pdf");
        assert_eq!(cfg.workflow.determination, "Approved");
        assert_eq!(cfg.auth.app_id, Some("my-app-id".to_string()));
        assert_eq!(cfg.auth.tenant, "contoso.com");
        assert_eq!(cfg.auth.redirect_uri, "http://127.0.0.1:9999/cb");
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn builder_build_validated_fails_for_invalid_config() {
        let result = ConfigBuilder::new()
            .site_request_timeout_secs(0)
            .logging_level("nope")
            .build_validated();
        let errors = result.unwrap_err();
        assert!(errors.len() >= 2);
    }

    #[test]
    fn default_path_ends_with_config_yaml() {
        assert!(Config::default_path().ends_with("docstamp/config.yaml"));
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "site.url".into(),
            message: "must not be empty".into(),
        };
        assert_eq!(err.to_string(), "site.url: must not be empty");
    }
}
