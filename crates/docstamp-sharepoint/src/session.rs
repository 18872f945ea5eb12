//! SharePointSessionProvider - ISessionProvider implementation for SharePoint
//!
//! Builds a [`SharePointClient`] per call from the current credential. The
//! HTTP connection pool is shared across clients; the token is not cached
//! here, so an invalidation takes effect on the very next client.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use docstamp_core::config::Config;
use docstamp_core::ports::{IListStore, ISessionProvider, StoreError};
use reqwest::Client;
use tracing::{debug, info};

use crate::auth::{site_origin, OAuth2Config, SharePointAuthAdapter};
use crate::client::SharePointClient;
use crate::credentials::{CredentialStore, OnDemandCredentialStore, StaticCredentialStore};

pub struct SharePointSessionProvider {
    site_url: String,
    list: String,
    credentials: Arc<dyn CredentialStore>,
    http: Client,
}

impl SharePointSessionProvider {
    /// # Arguments
    /// * `site_url` - Absolute URL of the site hosting the list
    /// * `list` - Web-relative URL of the list
    /// * `credentials` - Source of bearer tokens for the site
    pub fn new(
        site_url: impl Into<String>,
        list: impl Into<String>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            site_url: site_url.into(),
            list: list.into(),
            credentials,
            http: Client::new(),
        }
    }

    /// Builds a provider for the configured site
    ///
    /// Uses a static token from the environment when one is set, otherwise
    /// the keyring-backed OAuth store.
    pub fn from_config(config: &Config, interactive: bool) -> Result<Self> {
        let credentials = credentials_from_config(config, interactive)?;
        Ok(Self::new(
            config.site.url.clone(),
            config.site.list.clone(),
            credentials,
        ))
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }
}

/// Picks the credential strategy for `config`
pub fn credentials_from_config(
    config: &Config,
    interactive: bool,
) -> Result<Arc<dyn CredentialStore>> {
    if let Some(store) = StaticCredentialStore::from_env() {
        info!("Using access token from environment");
        return Ok(Arc::new(store));
    }
    Ok(Arc::new(on_demand_store(config)?.interactive(interactive)))
}

/// The keyring-backed OAuth store for the configured site
pub fn on_demand_store(config: &Config) -> Result<OnDemandCredentialStore> {
    let app_id = config
        .auth
        .app_id
        .clone()
        .context("auth.app_id is not configured")?;
    let oauth = OAuth2Config::for_site(app_id, &config.site.url)?
        .with_tenant(config.auth.tenant.clone())
        .with_redirect_uri(config.auth.redirect_uri.clone());
    let account = site_origin(&config.site.url)?;
    Ok(OnDemandCredentialStore::new(
        SharePointAuthAdapter::new(oauth),
        account,
    ))
}

#[async_trait]
impl ISessionProvider for SharePointSessionProvider {
    async fn authenticated_client(&self) -> Result<Arc<dyn IListStore>, StoreError> {
        let token = self
            .credentials
            .access_token()
            .await
            .map_err(|e| StoreError::Credential(format!("{e:#}")))?;
        let client = SharePointClient::new(token, &self.site_url, &self.list)?
            .with_http_client(self.http.clone());
        debug!(list = client.list_url(), "Built SharePoint client");
        Ok(Arc::new(client))
    }

    async fn invalidate_credentials(&self) -> Result<(), StoreError> {
        self.credentials
            .invalidate()
            .await
            .map_err(|e| StoreError::Credential(format!("{e:#}")))
    }
}
