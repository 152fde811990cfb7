//! Token broker - silent, interactive, and logout flows against the
//! identity provider
//!
//! The broker owns the HTTP transport and the injected token cache.
//! Operations report user-level failure as `Ok(false)` (no cached
//! session, consent denied, cancellation); only transport faults and
//! provider outages surface as errors, which the session engine folds
//! into its error flag without ever getting stuck.

use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use reqwest_middleware::ClientWithMiddleware;
use tokio::sync::oneshot;
use url::Url;

use todo_core::CardConfig;

use crate::auth::pkce;
use crate::auth::token::{TokenResponse, TokenSet};
use crate::cache::TokenCache;
use crate::error::{GraphError, Result};
use crate::http::build_retry_client;

/// Cache key for the persisted token set.
pub const TOKEN_CACHE_KEY: &str = "aad.token_set";

const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Delegated permissions requested on every flow.
pub const SCOPES: &[&str] = &[
    "openid",
    "profile",
    "offline_access",
    "User.Read",
    "Tasks.ReadWrite",
];

/// How the authorize URL is presented for interactive login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPrompt {
    /// Open the system browser.
    Browser,
    /// Log the URL and let the embedding surface it.
    Headless,
}

pub struct TokenBroker {
    client: Arc<ClientWithMiddleware>,
    cache: Arc<dyn TokenCache>,
    client_id: String,
    tenant_id: String,
    redirect_url: String,
    authority: String,
    prompt: LoginPrompt,
    pending_login: Mutex<Option<oneshot::Sender<String>>>,
    last_authorize_url: Mutex<Option<String>>,
}

impl TokenBroker {
    pub fn new(config: &CardConfig, cache: Arc<dyn TokenCache>, prompt: LoginPrompt) -> Self {
        Self {
            client: Arc::new(build_retry_client()),
            cache,
            client_id: config.aad_client_id.clone(),
            tenant_id: config.aad_tenant_id.clone(),
            redirect_url: config.aad_redirect_url.clone(),
            authority: DEFAULT_AUTHORITY.to_string(),
            prompt,
            pending_login: Mutex::new(None),
            last_authorize_url: Mutex::new(None),
        }
    }

    /// Override the identity provider base URL (tests).
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority, self.tenant_id)
    }

    pub fn authorize_endpoint(&self) -> String {
        format!("{}/{}/oauth2/v2.0/authorize", self.authority, self.tenant_id)
    }

    fn logout_endpoint(&self) -> String {
        format!("{}/{}/oauth2/v2.0/logout", self.authority, self.tenant_id)
    }

    fn scope_string() -> String {
        SCOPES.join(" ")
    }

    /// Access token from the cached set, if one is currently valid.
    pub async fn cached_access_token(&self) -> Option<String> {
        let set = self.read_cached_set().await?;
        set.is_valid().then_some(set.access_token)
    }

    async fn read_cached_set(&self) -> Option<TokenSet> {
        let raw = self.cache.get(TOKEN_CACHE_KEY).await?;
        serde_json::from_str::<TokenSet>(&raw).ok()
    }

    async fn write_cached_set(&self, set: &TokenSet) {
        match serde_json::to_string(set) {
            Ok(raw) => self.cache.store(TOKEN_CACHE_KEY, Some(raw)).await,
            Err(e) => warn!("failed to serialize token set: {e}"),
        }
    }

    /// Attempt a non-interactive refresh using the cached session.
    ///
    /// Never prompts. `Ok(true)` leaves a valid token set in the cache.
    /// `Ok(false)` means there is no usable cached session (including a
    /// provider rejection of the refresh token); the caller decides
    /// whether the browser or bridge path takes over.
    pub async fn acquire_silently(&self, try_sso_silent: bool) -> Result<bool> {
        let cached = self.read_cached_set().await;

        if let Some(set) = &cached {
            if set.is_valid() {
                debug!("cached access token still valid");
                return Ok(true);
            }
        }

        let refresh_token = cached.and_then(|set| set.refresh_token);
        let Some(refresh_token) = refresh_token else {
            if try_sso_silent {
                debug!("no cached session available for silent acquisition");
            }
            return Ok(false);
        };

        let scope = Self::scope_string();
        let params = [
            ("client_id", self.client_id.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("scope", scope.as_str()),
        ];
        let response = self
            .client
            .post(self.token_endpoint())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            // Refresh token rejected; the cached session is dead.
            info!("silent refresh rejected with status {status}");
            self.cache.store(TOKEN_CACHE_KEY, None).await;
            return Ok(false);
        }
        if !status.is_success() {
            return Err(GraphError::Status(status));
        }

        let token_response = response.json::<TokenResponse>().await?;
        match TokenSet::from_response(token_response) {
            Some(set) => {
                self.write_cached_set(&set).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run the interactive authorization-code-with-PKCE flow.
    ///
    /// Suspends until the redirect is delivered via
    /// [`TokenBroker::deliver_redirect`] or the login is cancelled.
    /// Cancellation and consent denial resolve to `Ok(false)`.
    pub async fn interactive_login(&self) -> Result<bool> {
        let pair = pkce::generate();
        let state = uuid::Uuid::new_v4().simple().to_string();

        let mut authorize = match Url::parse(&self.authorize_endpoint()) {
            Ok(url) => url,
            Err(e) => {
                // Authority and tenant come from configuration; an
                // unparsable endpoint means the config is unusable.
                warn!("invalid authorize endpoint: {e}");
                return Ok(false);
            }
        };
        authorize
            .query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("response_mode", "query")
            .append_pair("scope", &Self::scope_string())
            .append_pair("state", &state)
            .append_pair("code_challenge", &pair.challenge)
            .append_pair("code_challenge_method", "S256");
        let authorize_url = authorize.to_string();

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending_login.lock().unwrap_or_else(|e| e.into_inner());
            if pending.replace(tx).is_some() {
                warn!("superseding an in-flight interactive login");
            }
        }
        *self
            .last_authorize_url
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(authorize_url.clone());

        match self.prompt {
            LoginPrompt::Browser => {
                if let Err(e) = webbrowser::open(&authorize_url) {
                    warn!("failed to open browser for login: {e}");
                    self.cancel_login();
                    return Ok(false);
                }
            }
            LoginPrompt::Headless => {
                info!("interactive login URL: {authorize_url}");
            }
        }

        let query = match rx.await {
            Ok(query) => query,
            Err(_) => {
                info!("interactive login cancelled");
                return Ok(false);
            }
        };

        let redirect = RedirectParams::parse(&query);
        if let Some(error) = redirect.error {
            info!("authorization redirect carried error: {error}");
            return Ok(false);
        }
        if redirect.state.as_deref() != Some(state.as_str()) {
            warn!("authorization redirect state mismatch, dropping");
            return Ok(false);
        }
        let Some(code) = redirect.code else {
            info!("authorization redirect carried no code");
            return Ok(false);
        };

        self.exchange_code(&code, &pair.verifier).await
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<bool> {
        let scope = Self::scope_string();
        let params = [
            ("client_id", self.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_url.as_str()),
            ("code_verifier", verifier),
            ("scope", scope.as_str()),
        ];
        let response = self
            .client
            .post(self.token_endpoint())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            info!("code exchange rejected with status {status}");
            return Ok(false);
        }
        if !status.is_success() {
            return Err(GraphError::Status(status));
        }

        let token_response = response.json::<TokenResponse>().await?;
        match TokenSet::from_response(token_response) {
            Some(set) => {
                self.write_cached_set(&set).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Deliver the query string of the authorization redirect to the
    /// pending interactive login. Returns false when no login is waiting.
    pub fn deliver_redirect(&self, query: &str) -> bool {
        let pending = self
            .pending_login
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match pending {
            Some(tx) => tx.send(query.to_string()).is_ok(),
            None => {
                warn!("authorization redirect with no pending login");
                false
            }
        }
    }

    /// Cancel a pending interactive login, if any.
    pub fn cancel_login(&self) {
        self.pending_login
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
    }

    /// The authorize URL of the most recent interactive login.
    pub fn last_authorize_url(&self) -> Option<String> {
        self.last_authorize_url
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Clear the local token cache and best-effort end the provider
    /// session. Revocation failures never block the local transition.
    pub async fn logout(&self) {
        self.cache.store(TOKEN_CACHE_KEY, None).await;

        let logout_url = format!(
            "{}?post_logout_redirect_uri={}",
            self.logout_endpoint(),
            self.redirect_url
        );
        if let Err(e) = self.client.get(&logout_url).send().await {
            warn!("provider logout failed (ignored): {e}");
        }
    }
}

struct RedirectParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl RedirectParams {
    fn parse(query: &str) -> Self {
        let mut params = RedirectParams {
            code: None,
            state: None,
            error: None,
        };
        let query = query.trim_start_matches('?');
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_params_parse_query() {
        let params = RedirectParams::parse("?code=abc&state=xyz&session_state=ignored");
        assert_eq!(params.code.as_deref(), Some("abc"));
        assert_eq!(params.state.as_deref(), Some("xyz"));
        assert!(params.error.is_none());
    }

    #[test]
    fn redirect_params_parse_error() {
        let params = RedirectParams::parse("error=access_denied&state=xyz");
        assert_eq!(params.error.as_deref(), Some("access_denied"));
        assert!(params.code.is_none());
    }

    #[test]
    fn scope_string_lists_delegated_permissions() {
        let scope = TokenBroker::scope_string();
        assert!(scope.contains("Tasks.ReadWrite"));
        assert!(scope.contains("offline_access"));
    }
}
