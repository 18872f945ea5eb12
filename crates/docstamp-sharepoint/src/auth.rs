//! OAuth2 PKCE authentication flow for SharePoint Online
//!
//! Implements the Authorization Code flow with PKCE (RFC 7636) against the
//! Microsoft identity platform, requesting delegated SharePoint scopes for
//! one site's origin.
//!
//! ## Components
//!
//! - [`OAuth2Config`] - Configuration for the OAuth2 flow
//! - [`Tokens`] - Access/refresh token pair with expiry
//! - [`KeyringTokenStorage`] - Secure token storage using the system keyring
//! - [`PKCEFlow`] - OAuth2 PKCE challenge/exchange logic
//! - [`LocalCallbackServer`] - Minimal HTTP server for the OAuth redirect
//! - [`SharePointAuthAdapter`] - Orchestrates the full authentication flow

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, CsrfToken, EndpointNotSet,
    EndpointSet, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken, Scope,
    TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

/// Microsoft identity platform authority
const AUTHORITY: &str = "https://login.microsoftonline.com";

/// Default redirect URI for the local callback server
const REDIRECT_URI: &str = "http://127.0.0.1:8400/callback";

/// Default tenant: any work or school account
const DEFAULT_TENANT: &str = "organizations";

/// Keyring service name for storing tokens
const KEYRING_SERVICE: &str = "docstamp";

/// Delegated SharePoint permission requested on the site's origin
const SITE_SCOPE: &str = "AllSites.Write";

// ============================================================================
// Tokens
// ============================================================================

/// OAuth tokens for one SharePoint origin
#[derive(Clone, Serialize, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Tokens {
    /// Returns true once the access token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns true if the access token expires within `duration`
    pub fn expires_within(&self, duration: Duration) -> bool {
        Utc::now() + duration >= self.expires_at
    }
}

impl std::fmt::Debug for Tokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokens")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ============================================================================
// OAuth2Config
// ============================================================================

/// Configuration for the OAuth2 PKCE authentication flow
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// Application (client) ID from Azure AD app registration
    pub app_id: String,
    /// Directory tenant (ID, domain, or `organizations`)
    pub tenant: String,
    /// Redirect URI for receiving the authorization code
    pub redirect_uri: String,
    /// OAuth scopes to request
    pub scopes: Vec<String>,
}

impl OAuth2Config {
    /// Creates a config requesting write access to the origin of `site_url`
    pub fn for_site(app_id: impl Into<String>, site_url: &str) -> Result<Self> {
        let origin = site_origin(site_url)?;
        Ok(Self {
            app_id: app_id.into(),
            tenant: DEFAULT_TENANT.to_string(),
            redirect_uri: REDIRECT_URI.to_string(),
            scopes: vec![
                format!("{origin}/{SITE_SCOPE}"),
                "offline_access".to_string(),
            ],
        })
    }

    /// Creates a config with custom scopes
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Creates a config with a custom tenant
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self
    }

    /// Creates a config with a custom redirect URI
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    pub fn auth_url(&self) -> String {
        format!("{AUTHORITY}/{}/oauth2/v2.0/authorize", self.tenant)
    }

    pub fn token_url(&self) -> String {
        format!("{AUTHORITY}/{}/oauth2/v2.0/token", self.tenant)
    }
}

/// Returns the scheme and host of `site_url`, e.g. `https://contoso.sharepoint.com`
///
/// Access tokens are issued per origin, so the origin doubles as the
/// keyring account the tokens are cached under.
pub fn site_origin(site_url: &str) -> Result<String> {
    let url = Url::parse(site_url).with_context(|| format!("Invalid site URL: {site_url}"))?;
    match url.origin() {
        origin @ url::Origin::Tuple(..) => Ok(origin.ascii_serialization()),
        url::Origin::Opaque(_) => bail!("Site URL has no origin: {site_url}"),
    }
}

// ============================================================================
// KeyringTokenStorage
// ============================================================================

/// Stores and retrieves OAuth tokens from the system keyring
///
/// Uses the `keyring` crate to store tokens securely in the OS credential
/// store (e.g., GNOME Keyring, KDE Wallet, macOS Keychain).
/// Tokens are serialized as JSON with the service name "docstamp" and the
/// site origin as the username.
pub struct KeyringTokenStorage;

impl KeyringTokenStorage {
    /// Stores tokens in the system keyring for the given account
    pub fn store(account: &str, tokens: &Tokens) -> Result<()> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, account)
            .context("Failed to create keyring entry")?;

        let json = serde_json::to_string(tokens).context("Failed to serialize tokens")?;

        entry
            .set_password(&json)
            .context("Failed to store tokens in keyring")?;

        debug!(account, "Stored tokens in keyring");
        Ok(())
    }

    /// Loads tokens from the system keyring for the given account
    ///
    /// # Returns
    /// `Some(Tokens)` if found and valid, `None` if not found
    pub fn load(account: &str) -> Result<Option<Tokens>> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, account)
            .context("Failed to create keyring entry")?;

        match entry.get_password() {
            Ok(json) => {
                let tokens: Tokens = serde_json::from_str(&json)
                    .context("Failed to deserialize tokens from keyring")?;
                debug!(account, "Loaded tokens from keyring");
                Ok(Some(tokens))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(account, "No tokens found in keyring");
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    /// Removes tokens from the system keyring for the given account
    pub fn clear(account: &str) -> Result<()> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, account)
            .context("Failed to create keyring entry")?;

        match entry.delete_credential() {
            Ok(()) => {
                info!(account, "Cleared tokens from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!(account, "No tokens to clear");
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}

// ============================================================================
// PKCEFlow
// ============================================================================

/// OAuth2 PKCE flow implementation using the `oauth2` crate
///
/// Handles generating authorization URLs with PKCE challenges,
/// exchanging authorization codes for tokens, and refreshing tokens.
pub struct PKCEFlow {
    client: BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>,
    scopes: Vec<String>,
}

impl PKCEFlow {
    /// Creates a new PKCEFlow with the given configuration
    pub fn new(config: &OAuth2Config) -> Result<Self> {
        let client = BasicClient::new(ClientId::new(config.app_id.clone()))
            .set_auth_uri(AuthUrl::new(config.auth_url()).context("Invalid authorization URL")?)
            .set_token_uri(TokenUrl::new(config.token_url()).context("Invalid token URL")?)
            .set_redirect_uri(
                RedirectUrl::new(config.redirect_uri.clone()).context("Invalid redirect URI")?,
            );

        Ok(Self {
            client,
            scopes: config.scopes.clone(),
        })
    }

    /// Generates an authorization URL with a PKCE challenge
    ///
    /// # Returns
    /// A tuple of `(authorization_url, csrf_token, pkce_verifier)`.
    /// The `pkce_verifier` must be kept until the code exchange step.
    pub fn generate_auth_url(&self) -> (String, CsrfToken, PkceCodeVerifier) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = self.client.authorize_url(CsrfToken::new_random);

        for scope in &self.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token) = auth_request.set_pkce_challenge(pkce_challenge).url();

        debug!("Generated authorization URL");
        (auth_url.to_string(), csrf_token, pkce_verifier)
    }

    /// Exchanges an authorization code for OAuth tokens
    pub async fn exchange_code(
        &self,
        code: String,
        pkce_verifier: PkceCodeVerifier,
    ) -> Result<Tokens> {
        info!("Exchanging authorization code for tokens");

        let http_client = oauth_http_client()?;
        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http_client)
            .await
            .context("Failed to exchange authorization code")?;

        let tokens = Tokens {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result.refresh_token().map(|t| t.secret().to_string()),
            expires_at: expiry(token_result.expires_in()),
        };

        info!("Successfully obtained OAuth tokens");
        Ok(tokens)
    }

    /// Refreshes an expired access token using a refresh token
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Tokens> {
        info!("Refreshing access token");

        let http_client = oauth_http_client()?;
        let refresh_token_value = RefreshToken::new(refresh_token.to_string());
        let mut request = self.client.exchange_refresh_token(&refresh_token_value);
        for scope in &self.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let token_result = request
            .request_async(&http_client)
            .await
            .context("Failed to refresh token")?;

        let tokens = Tokens {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result
                .refresh_token()
                .map(|t| t.secret().to_string())
                .or_else(|| Some(refresh_token.to_string())),
            expires_at: expiry(token_result.expires_in()),
        };

        info!("Successfully refreshed access token");
        Ok(tokens)
    }
}

/// HTTP client for token endpoint calls; redirects are refused per the oauth2 docs
fn oauth_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Failed to build OAuth HTTP client")
}

fn expiry(expires_in: Option<std::time::Duration>) -> DateTime<Utc> {
    expires_in
        .map(|d| Utc::now() + Duration::seconds(d.as_secs() as i64))
        .unwrap_or_else(|| Utc::now() + Duration::hours(1))
}

// ============================================================================
// LocalCallbackServer
// ============================================================================

/// Minimal HTTP server that listens on the loopback redirect address for the
/// OAuth2 callback.
///
/// Waits for the identity provider to redirect the user's browser back with
/// an authorization code. Once the code is received, it responds with a
/// success HTML page and shuts down.
pub struct LocalCallbackServer;

/// Parameters extracted from the OAuth2 callback
#[derive(Debug)]
pub struct CallbackParams {
    /// The authorization code
    pub code: String,
    /// The CSRF state parameter
    pub state: String,
}

impl LocalCallbackServer {
    /// Starts the local callback server and waits for the OAuth redirect
    ///
    /// # Arguments
    /// * `redirect_uri` - Loopback URI whose host and port the server binds
    pub async fn start(redirect_uri: &str) -> Result<CallbackParams> {
        use http_body_util::Full;
        use hyper::body::Bytes;
        use hyper::header::{HeaderValue, CONTENT_TYPE};
        use hyper::server::conn::http1;
        use hyper::service::service_fn;
        use hyper::{Request, Response, StatusCode};
        use hyper_util::rt::TokioIo;
        use tokio::net::TcpListener;
        use tokio::sync::oneshot;

        let address = callback_address(redirect_uri)?;
        info!(%address, "Starting local OAuth callback server");

        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind callback server to {address}"))?;

        let (tx, rx) = oneshot::channel::<CallbackParams>();
        let tx = std::sync::Arc::new(tokio::sync::Mutex::new(Some(tx)));

        // Accept a single connection
        let (stream, _addr) = listener
            .accept()
            .await
            .context("Failed to accept connection on callback server")?;

        let io = TokioIo::new(stream);
        let tx_clone = tx.clone();

        let service = service_fn(move |req: Request<hyper::body::Incoming>| {
            let tx_inner = tx_clone.clone();
            async move {
                let uri = req.uri().to_string();
                debug!("Callback server received request: {}", uri);

                let (status, html) = match parse_callback_params(&uri) {
                    Some(callback_params) => {
                        if let Some(sender) = tx_inner.lock().await.take() {
                            let _ = sender.send(callback_params);
                        }
                        (StatusCode::OK, success_html())
                    }
                    None => (
                        StatusCode::BAD_REQUEST,
                        error_html("Missing authorization code in callback"),
                    ),
                };

                let mut response = Response::new(Full::new(Bytes::from(html)));
                *response.status_mut() = status;
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/html; charset=utf-8"),
                );
                Ok::<_, hyper::Error>(response)
            }
        });

        // Serve the single connection
        tokio::spawn(async move {
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                warn!("Callback server connection error: {}", e);
            }
        });

        let params = rx
            .await
            .context("Callback server channel closed without receiving parameters")?;

        info!("Received OAuth callback with authorization code");
        Ok(params)
    }
}

/// Resolves the `host:port` the callback server listens on
fn callback_address(redirect_uri: &str) -> Result<String> {
    let url = Url::parse(redirect_uri)
        .with_context(|| format!("Invalid redirect URI: {redirect_uri}"))?;
    let host = url
        .host_str()
        .with_context(|| format!("Redirect URI has no host: {redirect_uri}"))?;
    let port = url
        .port()
        .with_context(|| format!("Redirect URI needs an explicit port: {redirect_uri}"))?;
    let host = if host == "localhost" { "127.0.0.1" } else { host };
    Ok(format!("{host}:{port}"))
}

/// Parses the authorization code and state from a callback URI
fn parse_callback_params(uri: &str) -> Option<CallbackParams> {
    let url = Url::parse(&format!("http://localhost{}", uri)).ok()?;
    let mut code = None;
    let mut state = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            _ => {}
        }
    }

    Some(CallbackParams {
        code: code?,
        state: state.unwrap_or_default(),
    })
}

/// Returns the HTML for a successful authentication page
fn success_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>DocStamp - Signed In</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Signed In</h1>
    <p>DocStamp can now reach your SharePoint site.</p>
    <p>You can close this window.</p>
    <script>setTimeout(function() { window.close(); }, 3000);</script>
</body>
</html>"#
        .to_string()
}

/// Returns the HTML for an authentication error page
fn error_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>DocStamp - Sign-in Error</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Sign-in Error</h1>
    <p>{}</p>
    <p>Please close this window and try again.</p>
</body>
</html>"#,
        message
    )
}

// ============================================================================
// SharePointAuthAdapter
// ============================================================================

/// High-level authentication adapter that orchestrates the full OAuth2 PKCE flow.
///
/// Combines [`PKCEFlow`], [`LocalCallbackServer`], and browser launching:
///
/// 1. Generates PKCE authorization URL
/// 2. Opens the user's browser to the Microsoft login page
/// 3. Starts a local callback server to receive the redirect
/// 4. Checks the returned state against the CSRF token
/// 5. Exchanges the authorization code for tokens
pub struct SharePointAuthAdapter {
    config: OAuth2Config,
}

impl SharePointAuthAdapter {
    pub fn new(config: OAuth2Config) -> Self {
        Self { config }
    }

    /// Performs the full interactive OAuth2 PKCE login flow
    pub async fn login(&self) -> Result<Tokens> {
        info!("Starting OAuth2 PKCE login flow");

        let flow = PKCEFlow::new(&self.config)?;
        let (auth_url, csrf_token, pkce_verifier) = flow.generate_auth_url();

        info!("Opening browser for authentication");
        if let Err(e) = webbrowser::open(&auth_url) {
            warn!(error = %e, "Could not open a browser");
            eprintln!("Open this URL to sign in:\n\n  {auth_url}\n");
        }

        let callback = LocalCallbackServer::start(&self.config.redirect_uri).await?;
        if callback.state != *csrf_token.secret() {
            bail!("OAuth callback state does not match the login request");
        }

        let tokens = flow.exchange_code(callback.code, pkce_verifier).await?;

        info!("OAuth2 PKCE login completed successfully");
        Ok(tokens)
    }

    /// Refreshes an expired access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<Tokens> {
        let flow = PKCEFlow::new(&self.config)?;
        flow.refresh_token(refresh_token).await
    }

    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }
}
