//! Credential strategies
//!
//! A [`CredentialStore`] hands out bearer tokens for one site and can drop
//! whatever it has cached. Two strategies are provided:
//!
//! - [`OnDemandCredentialStore`] - keyring cache, then refresh token, then interactive login
//! - [`StaticCredentialStore`] - a fixed token, typically from `DOCSTAMP_ACCESS_TOKEN`

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, info, warn};

use crate::auth::{KeyringTokenStorage, SharePointAuthAdapter, Tokens};

/// Environment variable holding a pre-acquired access token
pub const ACCESS_TOKEN_ENV: &str = "DOCSTAMP_ACCESS_TOKEN";

/// Tokens this close to expiry are refreshed before use
const REFRESH_MARGIN_MINUTES: i64 = 5;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns a bearer token for the site, acquiring one if needed
    async fn access_token(&self) -> Result<String>;

    /// Drops any cached credential so the next call re-acquires
    async fn invalidate(&self) -> Result<()>;
}

// ============================================================================
// OnDemandCredentialStore
// ============================================================================

/// Keyring-backed credential cache for one SharePoint origin
///
/// Resolution order on each [`access_token`](CredentialStore::access_token):
///
/// 1. A cached token that is not about to expire
/// 2. A refreshed token, if a refresh token is cached
/// 3. An interactive browser login, if enabled
///
/// The keyring entry is shared by every process on the machine, so an
/// invalidation here affects all of them.
pub struct OnDemandCredentialStore {
    adapter: SharePointAuthAdapter,
    account: String,
    interactive: bool,
}

impl OnDemandCredentialStore {
    /// # Arguments
    /// * `adapter` - OAuth adapter configured for the site's origin
    /// * `account` - Keyring account the tokens are cached under (the site origin)
    pub fn new(adapter: SharePointAuthAdapter, account: impl Into<String>) -> Self {
        Self {
            adapter,
            account: account.into(),
            interactive: true,
        }
    }

    /// Enables or disables falling back to a browser login
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Runs the interactive login and caches the resulting tokens
    pub async fn login(&self) -> Result<Tokens> {
        let tokens = self.adapter.login().await?;
        KeyringTokenStorage::store(&self.account, &tokens)?;
        Ok(tokens)
    }

    /// Returns the cached tokens without refreshing them
    pub fn cached(&self) -> Result<Option<Tokens>> {
        KeyringTokenStorage::load(&self.account)
    }
}

#[async_trait]
impl CredentialStore for OnDemandCredentialStore {
    async fn access_token(&self) -> Result<String> {
        let cached = KeyringTokenStorage::load(&self.account)?;

        if let Some(tokens) = &cached {
            if !tokens.expires_within(Duration::minutes(REFRESH_MARGIN_MINUTES)) {
                debug!(account = %self.account, "Using cached access token");
                return Ok(tokens.access_token.clone());
            }
        }

        if let Some(refresh_token) = cached.and_then(|t| t.refresh_token) {
            match self.adapter.refresh(&refresh_token).await {
                Ok(tokens) => {
                    KeyringTokenStorage::store(&self.account, &tokens)?;
                    info!(account = %self.account, "Refreshed access token");
                    return Ok(tokens.access_token);
                }
                Err(e) => warn!(account = %self.account, error = %e, "Token refresh failed"),
            }
        }

        if !self.interactive {
            bail!(
                "No usable credential cached for {}; run `docstamp auth login`",
                self.account
            );
        }

        info!(account = %self.account, "No usable credential cached, starting login");
        Ok(self.login().await?.access_token)
    }

    async fn invalidate(&self) -> Result<()> {
        info!(account = %self.account, "Invalidating cached credential");
        KeyringTokenStorage::clear(&self.account)
    }
}

// ============================================================================
// StaticCredentialStore
// ============================================================================

/// A fixed bearer token supplied from outside
///
/// Invalidation has nothing to drop; the next call returns the same token.
pub struct StaticCredentialStore {
    token: String,
}

impl StaticCredentialStore {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Reads the token from [`ACCESS_TOKEN_ENV`], ignoring blank values
    pub fn from_env() -> Option<Self> {
        std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Self::new)
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }

    async fn invalidate(&self) -> Result<()> {
        debug!("Static credential has no cache to invalidate");
        Ok(())
    }
}
