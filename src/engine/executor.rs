//! The hook pipeline: one decorated HTTP request from options to result.
//!
//! Stages, in order:
//! 1. cache lookup (GET only)
//! 2. request transforms, recovered through `catch_request_error`
//! 3. the transport call, recovered through `catch_response_error`
//! 4. response transforms
//! 5. cache population
//!
//! Values produced by a recovery handler skip stages 4 and 5.

use crate::constants::LOG_TARGET_PIPELINE;
use crate::error::Error;
use crate::hooks::{self, RequestHook};
use crate::logging;
use crate::options::{CacheOption, Method, RequestOptions};
use crate::response_cache::{self, CacheConfig, MemoryCache, ResponseStore};
use crate::transport::{OutgoingRequest, ReqwestTransport, Response, Transport};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Method, URL and data of a request before any hook has seen it.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub query: Option<Map<String, Value>>,
    pub body: Option<Value>,
}

impl PreparedRequest {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: None,
            body: None,
        }
    }

    #[must_use]
    pub fn query(mut self, query: Option<Map<String, Value>>) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }
}

/// Executes requests through the hook pipeline.
///
/// Holds the transport, the global default options every call is merged
/// over, and the store `CacheOption::UseDefault` resolves to.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    defaults: RequestOptions,
    default_cache: Arc<dyn ResponseStore>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Client over `transport` with built-in defaults and a default memory cache.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            defaults: RequestOptions::defaults(),
            default_cache: Arc::new(MemoryCache::new(CacheConfig::default())),
        }
    }

    /// Client backed by [`ReqwestTransport`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_reqwest() -> Result<Self, Error> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()?)))
    }

    /// Layers `defaults` over the built-in defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: &RequestOptions) -> Self {
        self.defaults = RequestOptions::defaults().merge(defaults);
        self
    }

    #[must_use]
    pub fn with_default_cache(mut self, store: Arc<dyn ResponseStore>) -> Self {
        self.default_cache = store;
        self
    }

    #[must_use]
    pub const fn defaults(&self) -> &RequestOptions {
        &self.defaults
    }

    #[must_use]
    pub const fn default_cache(&self) -> &Arc<dyn ResponseStore> {
        &self.default_cache
    }

    fn resolve_cache(&self, option: Option<&CacheOption>) -> Option<Arc<dyn ResponseStore>> {
        match option? {
            CacheOption::Disabled => None,
            CacheOption::UseDefault => Some(Arc::clone(&self.default_cache)),
            CacheOption::Store(store) => Some(Arc::clone(store)),
        }
    }

    /// Runs `request` through the pipeline with `options` layered over the client defaults.
    ///
    /// # Errors
    ///
    /// Returns the error left after the matching recovery chain, a response
    /// transform error, or a cache error.
    pub async fn execute(
        &self,
        request: PreparedRequest,
        options: &RequestOptions,
    ) -> Result<Response, Error> {
        let options = self.defaults.merge(options);
        let method = request.method;

        // The key reflects the request as the caller built it, before any transform.
        let cache = self
            .resolve_cache(options.cache.as_ref())
            .map(|store| {
                let key = response_cache::cache_key(
                    &request.url,
                    request.query.as_ref(),
                    request.body.as_ref(),
                );
                (store, key)
            });

        if let (Some((store, key)), Method::Get) = (&cache, method) {
            let lookup = store.get(key).await;
            tokio::task::yield_now().await;
            match lookup {
                Ok(Some(response)) => {
                    debug!(target: LOG_TARGET_PIPELINE, "Cache hit: {key}");
                    return Ok(response);
                }
                Ok(None) => debug!(target: LOG_TARGET_PIPELINE, "Cache miss: {key}"),
                Err(e @ Error::CacheLookup { .. }) => return Err(e),
                Err(e) => return Err(Error::cache_lookup(e.to_string())),
            }
        }

        let mut outgoing = OutgoingRequest::new(method, request.url);
        outgoing
            .set_accept(options.accept())
            .set_headers(&options.headers)
            .set_credentials_mode(options.with_credentials.unwrap_or(false));
        match options.timeout {
            Some(timeout) => outgoing.set_timeout(timeout),
            None => outgoing.clear_timeout(),
        };
        outgoing.query = request.query;

        let body = match request.body {
            Some(body) if body.is_object() || body.is_array() => {
                match apply_request_transforms(&options.transform_request, &mut outgoing, body) {
                    Ok(body) => body,
                    Err(e) => {
                        debug!(target: LOG_TARGET_PIPELINE, "Request transform failed: {e}");
                        return hooks::recover(&options.catch_request_error, e)
                            .await
                            .map(Response::recovered);
                    }
                }
            }
            other => other,
        };
        outgoing.set_body(body);

        logging::log_request(&outgoing);
        let start = Instant::now();
        let mut response = match self.transport.send(outgoing).await {
            Ok(response) => response,
            Err(e) => {
                debug!(target: LOG_TARGET_PIPELINE, "Request failed: {e}");
                return hooks::recover(&options.catch_response_error, e)
                    .await
                    .map(Response::recovered);
            }
        };
        logging::log_response(&response, start.elapsed().as_millis());

        let mut body = response.body.clone();
        for hook in &options.transform_response {
            body = hook.apply(&response, body).map_err(|e| {
                debug!(
                    target: LOG_TARGET_PIPELINE,
                    "Response transform '{}' failed: {e}",
                    hook.name()
                );
                e
            })?;
        }
        response.body = body;

        if let Some((store, key)) = &cache {
            store
                .set(key, response.clone())
                .await
                .map_err(|e| Error::CacheStore {
                    reason: e.to_string(),
                })?;
        }

        Ok(response)
    }

    /// Shorthand for [`Client::execute`] with a body and no separate query.
    ///
    /// # Errors
    ///
    /// See [`Client::execute`].
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        data: Option<Value>,
        options: &RequestOptions,
    ) -> Result<Response, Error> {
        self.execute(PreparedRequest::new(method, url).body(data), options)
            .await
    }

    /// # Errors
    ///
    /// See [`Client::execute`].
    pub async fn get(
        &self,
        url: &str,
        data: Option<Value>,
        options: &RequestOptions,
    ) -> Result<Response, Error> {
        self.request(Method::Get, url, data, options).await
    }

    /// # Errors
    ///
    /// See [`Client::execute`].
    pub async fn post(
        &self,
        url: &str,
        data: Option<Value>,
        options: &RequestOptions,
    ) -> Result<Response, Error> {
        self.request(Method::Post, url, data, options).await
    }

    /// # Errors
    ///
    /// See [`Client::execute`].
    pub async fn put(
        &self,
        url: &str,
        data: Option<Value>,
        options: &RequestOptions,
    ) -> Result<Response, Error> {
        self.request(Method::Put, url, data, options).await
    }

    /// # Errors
    ///
    /// See [`Client::execute`].
    pub async fn patch(
        &self,
        url: &str,
        data: Option<Value>,
        options: &RequestOptions,
    ) -> Result<Response, Error> {
        self.request(Method::Patch, url, data, options).await
    }

    /// # Errors
    ///
    /// See [`Client::execute`].
    pub async fn delete(
        &self,
        url: &str,
        data: Option<Value>,
        options: &RequestOptions,
    ) -> Result<Response, Error> {
        self.request(Method::Delete, url, data, options).await
    }

    /// # Errors
    ///
    /// See [`Client::execute`].
    pub async fn head(&self, url: &str, options: &RequestOptions) -> Result<Response, Error> {
        self.request(Method::Head, url, None, options).await
    }

    /// # Errors
    ///
    /// See [`Client::execute`].
    pub async fn options(&self, url: &str, options: &RequestOptions) -> Result<Response, Error> {
        self.request(Method::Options, url, None, options).await
    }
}

fn apply_request_transforms(
    chain: &[RequestHook],
    request: &mut OutgoingRequest,
    body: Value,
) -> Result<Option<Value>, Error> {
    let mut body = body;
    for hook in chain {
        body = hook.apply(request, body)?;
    }
    Ok(Some(body).filter(|b| !b.is_null()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_transforms_run_in_order() {
        let chain = vec![
            RequestHook::new(|_, body| Ok(json!({"wrapped": body}))),
            RequestHook::new(|req, body| {
                req.set_accept("text/plain");
                Ok(json!([body]))
            }),
        ];
        let mut request = OutgoingRequest::new(Method::Post, "http://x");
        let body = apply_request_transforms(&chain, &mut request, json!({"a": 1})).unwrap();

        assert_eq!(body, Some(json!([{"wrapped": {"a": 1}}])));
        assert_eq!(request.accept, "text/plain");
    }

    #[test]
    fn test_null_transform_result_means_no_body() {
        let chain = vec![RequestHook::new(|_, _| Ok(Value::Null))];
        let mut request = OutgoingRequest::new(Method::Get, "http://x");
        assert_eq!(
            apply_request_transforms(&chain, &mut request, json!({"a": 1})).unwrap(),
            None
        );
    }

    #[test]
    fn test_prepared_request_builder() {
        let request = PreparedRequest::new(Method::Put, "http://x/1")
            .query(json!({"q": 1}).as_object().cloned())
            .body(Some(json!({"a": 1})));
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.body, Some(json!({"a": 1})));
        assert!(request.query.is_some());
    }
}
