//! Per-request options and per-method time bounds

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

/// Default bound for GET requests
pub const DEFAULT_GET_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound for POST requests, which usually do more server-side work
pub const DEFAULT_POST_TIMEOUT: Duration = Duration::from_secs(30);

/// Time bounds applied per HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeouts {
    pub get: Duration,
    pub post: Duration,
}

impl Default for RequestTimeouts {
    fn default() -> Self {
        Self {
            get: DEFAULT_GET_TIMEOUT,
            post: DEFAULT_POST_TIMEOUT,
        }
    }
}

impl RequestTimeouts {
    pub fn for_method(&self, method: &Method) -> Duration {
        if *method == Method::POST {
            self.post
        } else {
            self.get
        }
    }
}

/// Overrides for a single request
///
/// Headers set here replace the client's own (including `Authorization`).
/// Query parameters become part of the URL and so of the request fingerprint;
/// headers and the timeout do not.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub(crate) headers: HeaderMap,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any value the client would send
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append a query parameter only when a value is present
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Override the method's default time bound
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn query_string(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        Some(
            url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.query)
                .finish(),
        )
    }
}
