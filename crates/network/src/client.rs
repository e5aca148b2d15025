// crates/network/src/client.rs
//! Authenticated blocking HTTP client
//!
//! Requests run on the sync worker thread, which blocks on them one at a
//! time. Requests are never retried; a failed call fails the enclosing
//! operation.

use crate::error::{NetworkError, NetworkResult};
use crate::problem::ProblemReport;
use pagemark_core::{AccountCredentials, AuthScheme};
use reqwest::blocking::{Client as ReqwestClient, RequestBuilder, Response};
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Called when a response carries a refreshed bearer token
pub type TokenRefreshHandler = Arc<dyn Fn(&AccountCredentials, &str) + Send + Sync>;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Maximum redirects to follow
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("Pagemark/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

/// HTTP client that attaches account credentials to every request
#[derive(Clone)]
pub struct Client {
    inner: ReqwestClient,
    config: ClientConfig,
    token_refresh: Option<TokenRefreshHandler>,
}

impl Client {
    /// Creates a new client with default configuration
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(NetworkError::Http)?;

        Ok(Self {
            inner: client,
            config,
            token_refresh: None,
        })
    }

    /// Installs a handler for refreshed access tokens
    pub fn with_token_refresh(mut self, handler: TokenRefreshHandler) -> Self {
        self.token_refresh = Some(handler);
        self
    }

    /// Returns the configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Performs an authenticated GET
    pub fn get(&self, url: &Url, credentials: &AccountCredentials) -> NetworkResult<Response> {
        self.send(url, credentials, self.inner.get(url.clone()))
    }

    /// Performs an authenticated DELETE
    pub fn delete(&self, url: &Url, credentials: &AccountCredentials) -> NetworkResult<Response> {
        self.send(url, credentials, self.inner.delete(url.clone()))
    }

    /// Performs an authenticated POST with a body of the given content type
    pub fn post(
        &self,
        url: &Url,
        credentials: &AccountCredentials,
        content_type: &str,
        body: Vec<u8>,
    ) -> NetworkResult<Response> {
        let request = self
            .inner
            .post(url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body);
        self.send(url, credentials, request)
    }

    /// Performs an authenticated PUT with a body of the given content type
    pub fn put(
        &self,
        url: &Url,
        credentials: &AccountCredentials,
        content_type: &str,
        body: Vec<u8>,
    ) -> NetworkResult<Response> {
        let request = self
            .inner
            .put(url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body);
        self.send(url, credentials, request)
    }

    fn send(
        &self,
        url: &Url,
        credentials: &AccountCredentials,
        request: RequestBuilder,
    ) -> NetworkResult<Response> {
        let request = match &credentials.auth {
            AuthScheme::Basic { username, password } => request.basic_auth(username, Some(password)),
            AuthScheme::Bearer { token } => request.bearer_auth(token),
        };

        log::debug!("{}", url);
        let response = request.send()?;
        self.check_token_refresh(credentials, response.headers());

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = status.canonical_reason().unwrap_or("Unknown").to_string();
        let body = response.text().unwrap_or_default();
        let problem = ProblemReport::parse(&body);
        if let Some(report) = &problem {
            report.log();
        }
        Err(NetworkError::Status {
            uri: url.to_string(),
            status: status.as_u16(),
            message,
            problem,
        })
    }

    fn check_token_refresh(&self, credentials: &AccountCredentials, headers: &HeaderMap) {
        let Some(handler) = &self.token_refresh else {
            return;
        };
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        if let Some(token) = token {
            let unchanged = matches!(&credentials.auth, AuthScheme::Bearer { token: current } if current == token);
            if !unchanged {
                log::debug!("received a refreshed access token");
                handler(credentials, token);
            }
        }
    }
}
