//! Kipesa HTTP access layer
//!
//! [`ApiClient`] is the single entry point for talking to the Kipesa API. It
//! resolves paths against the configured base URL, attaches the session's
//! bearer token when one is present, bounds every request with a per-method
//! timeout, and coalesces identical concurrent requests through its
//! [`InFlightRegistry`]. Errors are surfaced unchanged; nothing is retried.

pub mod auth;
pub mod chatbot;
pub mod error;
pub mod finance;
pub mod inflight;
pub mod options;

pub use error::ClientError;
pub use inflight::{Fingerprint, InFlightRegistry};
pub use options::{RequestOptions, RequestTimeouts};

use crate::session::Session;
use inflight::SharedResponse;
use kipesa_core::ClientConfig;
use reqwest::{Client, ClientBuilder, Method, header};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_USER_AGENT: &str = concat!("kipesa-client/", env!("CARGO_PKG_VERSION"));

/// Kipesa API client
///
/// Clones share the connection pool, the session and the in-flight registry,
/// so construct one per process and clone it wherever HTTP access is needed.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Session,
    timeouts: RequestTimeouts,
    in_flight: InFlightRegistry,
}

impl ApiClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Create a client from loaded configuration, reading tokens from `session`
    pub fn from_config(config: &ClientConfig, session: Session) -> Result<Self, ClientError> {
        let mut builder = Self::builder()
            .base_url(&config.api_base)
            .session(session)
            .get_timeout(config.get_timeout())
            .post_timeout(config.post_timeout());

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        builder.build()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session the client reads its bearer token from
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn timeouts(&self) -> RequestTimeouts {
        self.timeouts
    }

    /// Number of requests currently awaiting a response
    pub fn pending_requests(&self) -> usize {
        self.in_flight.len()
    }

    /// Issue a GET against `base_url + path`
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.get_with(path, RequestOptions::default()).await
    }

    /// Issue a GET with per-request overrides
    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let value = self.dispatch(Method::GET, path, None, &options).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Issue a POST with a JSON body
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post_with(path, body, RequestOptions::default()).await
    }

    /// Issue a POST with a JSON body and per-request overrides
    pub async fn post_with<B, T>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_string(body)?;
        let value = self
            .dispatch(Method::POST, path, Some(body), &options)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Create a request builder with authentication
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url);

        if let Some(token) = self.session.token() {
            request = request.header(header::AUTHORIZATION, token.bearer());
        }

        request
    }

    fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        options: &RequestOptions,
    ) -> SharedResponse {
        let query = options.query_string();
        let timeout = options
            .timeout
            .unwrap_or_else(|| self.timeouts.for_method(&method));
        let fingerprint = Fingerprint::new(method.clone(), path, query.clone(), body.clone());

        self.in_flight.join_or_start(fingerprint, || {
            let target = match &query {
                Some(query) if path.contains('?') => format!("{path}&{query}"),
                Some(query) => format!("{path}?{query}"),
                None => path.to_string(),
            };

            debug!(
                method = %method,
                path = %target,
                authenticated = self.session.is_authenticated(),
                "Sending request"
            );

            let mut request = self.request(method.clone(), &target);
            if let Some(body) = body {
                request = request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(body);
            }
            if !options.headers.is_empty() {
                request = request.headers(options.headers.clone());
            }

            async move {
                match tokio::time::timeout(timeout, execute(request)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(method = %method, path = %target, ?timeout, "Request timed out");
                        Err(ClientError::Timeout { after: timeout })
                    }
                }
            }
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .field("timeouts", &self.timeouts)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

/// Send a request and decode its JSON body
async fn execute(request: reqwest::RequestBuilder) -> Result<JsonValue, ClientError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonValue::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    } else {
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "Request failed with error status");
        Err(ClientError::from_status(status, &body))
    }
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    session: Option<Session>,
    get_timeout: Option<Duration>,
    post_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ApiClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Share an existing session instead of starting anonymous
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the bound for GET requests
    pub fn get_timeout(mut self, timeout: Duration) -> Self {
        self.get_timeout = Some(timeout);
        self
    }

    /// Set the bound for POST requests
    pub fn post_timeout(mut self, timeout: Duration) -> Self {
        self.post_timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url: {e}")))?;

        let defaults = RequestTimeouts::default();
        let timeouts = RequestTimeouts {
            get: self.get_timeout.unwrap_or(defaults.get),
            post: self.post_timeout.unwrap_or(defaults.post),
        };

        let client = ClientBuilder::new()
            .user_agent(
                self.user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            )
            .build()?;

        Ok(ApiClient {
            client,
            base_url,
            session: self.session.unwrap_or_default(),
            timeouts,
            in_flight: InFlightRegistry::new(),
        })
    }
}
