//! The HTTP transport collaborator.
//!
//! The pipeline builds an [`OutgoingRequest`], lets request hooks reshape it,
//! then hands it to a [`Transport`]. [`ReqwestTransport`] is the production
//! implementation.

use crate::constants;
use crate::error::Error;
use crate::options::Method;
use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// A request on its way to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub accept: String,
    /// `None` means no timeout at all.
    pub timeout: Option<Duration>,
    pub with_credentials: bool,
    pub query: Option<Map<String, Value>>,
    pub body: Option<Value>,
}

impl OutgoingRequest {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: IndexMap::new(),
            accept: constants::CONTENT_TYPE_JSON.to_string(),
            timeout: None,
            with_credentials: false,
            query: None,
            body: None,
        }
    }

    pub fn set_headers(&mut self, headers: &IndexMap<String, String>) -> &mut Self {
        for (name, value) in headers {
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }

    pub fn set_accept(&mut self, accept: impl Into<String>) -> &mut Self {
        self.accept = accept.into();
        self
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn clear_timeout(&mut self) -> &mut Self {
        self.timeout = None;
        self
    }

    pub fn set_credentials_mode(&mut self, enabled: bool) -> &mut Self {
        self.with_credentials = enabled;
        self
    }

    /// Adds entries to the query string, keeping the ones already present.
    ///
    /// # Errors
    ///
    /// Returns an error if `query` is not an object.
    pub fn set_query(&mut self, query: &Value) -> Result<&mut Self, Error> {
        let Value::Object(entries) = query else {
            return Err(Error::invalid_arguments(format!(
                "query parameters must be an object, got {query}"
            )));
        };
        let target = self.query.get_or_insert_with(Map::new);
        for (key, value) in entries {
            target.insert(key.clone(), value.clone());
        }
        Ok(self)
    }

    pub fn set_body(&mut self, body: Option<Value>) -> &mut Self {
        self.body = body.filter(|value| !value.is_null());
        self
    }
}

/// A response as seen by hooks, the cache and callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub headers: IndexMap<String, String>,
    pub body: Value,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: IndexMap::new(),
            body,
        }
    }

    /// Wraps a body produced by a recovery handler. Status `0` marks it as not
    /// coming from the network.
    #[must_use]
    pub fn recovered(body: Value) -> Self {
        Self::new(0, body)
    }

    #[must_use]
    pub const fn is_recovered(&self) -> bool {
        self.status == 0
    }
}

/// Issues the actual network call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request`. Non-success statuses are reported as [`Error::HttpStatus`].
    async fn send(&self, request: OutgoingRequest) -> Result<Response, Error>;
}

/// [`Transport`] backed by `reqwest`.
///
/// The underlying client has no default timeout; only requests that carry one
/// are bounded. Cookies are attached and stored only in credentials mode.
pub struct ReqwestTransport {
    client: reqwest::Client,
    jar: Arc<Jar>,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, Error> {
        install_crypto_provider();
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::request_failed(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self::with_client(client))
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            jar: Arc::new(Jar::default()),
        }
    }

    fn build_url(request: &OutgoingRequest) -> Result<reqwest::Url, Error> {
        let mut url = reqwest::Url::parse(&request.url)
            .map_err(|e| Error::request_failed(format!("Invalid URL '{}': {e}", request.url)))?;

        if let Some(query) = &request.query {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                match value {
                    Value::Null => {}
                    Value::Array(items) => {
                        for item in items {
                            pairs.append_pair(key, &query_string(item));
                        }
                    }
                    other => {
                        pairs.append_pair(key, &query_string(other));
                    }
                }
            }
        }

        Ok(url)
    }

    fn build_headers(request: &OutgoingRequest) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_str(&request.accept)
                .map_err(|e| Error::invalid_config(format!("Invalid Accept value: {e}")))?,
        );
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_config(format!("Invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_config(format!("Invalid header value: {e}")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<Response, Error> {
        let url = Self::build_url(&request)?;
        let mut headers = Self::build_headers(&request)?;

        if request.with_credentials {
            if let Some(cookies) = self.jar.cookies(&url) {
                headers.insert(reqwest::header::COOKIE, cookies);
            }
        }

        let method = reqwest::Method::from(request.method);
        let mut builder = self.client.request(method, url.clone()).headers(headers);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| Error::RequestFailed {
            reason: e.to_string(),
        })?;

        if request.with_credentials {
            let mut set_cookies = response.headers().get_all(reqwest::header::SET_COOKIE).iter();
            self.jar.set_cookies(&mut set_cookies, &url);
        }

        let status = response.status();
        let response_headers: IndexMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let text = response
            .text()
            .await
            .map_err(|e| Error::ResponseReadError {
                reason: e.to_string(),
            })?;
        let body = parse_body(&response_headers, &text);

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Response {
            status: status.as_u16(),
            headers: response_headers,
            body,
        })
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
        }
    }
}

/// Parses JSON bodies; anything else is kept as text. Empty bodies become `null`.
fn parse_body(headers: &IndexMap<String, String>, text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    let is_json = headers
        .get(&constants::HEADER_CONTENT_TYPE.to_lowercase())
        .is_some_and(|ct| ct.contains(constants::CONTENT_TYPE_IDENTIFIER_JSON));
    if is_json {
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
    } else {
        Value::String(text.to_string())
    }
}

fn query_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn install_crypto_provider() {
    #[cfg(not(windows))]
    let provider = rustls::crypto::ring::default_provider();
    #[cfg(windows)]
    let provider = rustls::crypto::aws_lc_rs::default_provider();
    // Fails only when a provider is already installed for the process.
    let _ = provider.install_default();
}
