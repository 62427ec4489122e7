//! A callable bound to one URL template, method and option set.

use crate::constants;
use crate::engine::executor::{Client, PreparedRequest};
use crate::error::Error;
use crate::hooks::RequestHook;
use crate::options::{Method, RequestOptions};
use crate::params::{DefaultParams, ParamSet};
use crate::url_template::{self, UrlResult};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Name of the request hook every GET action carries.
pub const MOVE_PAYLOAD_TO_QUERY: &str = "move_payload_to_query";

/// Moves a structured GET body into the query string and drops the body.
#[must_use]
pub fn move_payload_to_query() -> RequestHook {
    RequestHook::named(MOVE_PAYLOAD_TO_QUERY, |request, data| {
        if !data.is_null() {
            request.set_query(&data)?;
        }
        Ok(Value::Null)
    })
}

/// Arguments of one action call.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Args {
    #[default]
    Empty,
    /// Payload for verbs that take one, parameters otherwise.
    Single(Value),
    Pair(Option<Map<String, Value>>, Option<Value>),
}

impl From<()> for Args {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

impl From<Value> for Args {
    fn from(value: Value) -> Self {
        Self::Single(value)
    }
}

impl From<Map<String, Value>> for Args {
    fn from(map: Map<String, Value>) -> Self {
        Self::Single(Value::Object(map))
    }
}

impl From<(Map<String, Value>, Value)> for Args {
    fn from((params, payload): (Map<String, Value>, Value)) -> Self {
        Self::Pair(Some(params), Some(payload))
    }
}

impl From<(Option<Map<String, Value>>, Option<Value>)> for Args {
    fn from((params, payload): (Option<Map<String, Value>>, Option<Value>)) -> Self {
        Self::Pair(params, payload)
    }
}

/// A resource action: URL template, default parameters and request options.
///
/// The method is fixed at construction. GET actions get
/// [`move_payload_to_query`] appended to their request transforms.
#[derive(Debug, Clone)]
pub struct ResourceAction {
    client: Arc<Client>,
    url: String,
    method: Method,
    options: RequestOptions,
    params: ParamSet,
}

impl ResourceAction {
    /// `options` is the fully merged action configuration; a missing method means GET.
    #[must_use]
    pub fn new(
        client: Arc<Client>,
        url: impl Into<String>,
        defaults: &DefaultParams,
        options: RequestOptions,
    ) -> Self {
        let mut options = options;
        let method = options.method.unwrap_or(Method::Get);
        options.method = Some(method);
        if method == Method::Get {
            options.transform_request.push(move_payload_to_query());
        }

        Self {
            client,
            url: url.into(),
            method,
            options,
            params: ParamSet::classify(defaults),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub const fn has_payload(&self) -> bool {
        self.method.has_payload()
    }

    /// The merged configuration this action sends with.
    #[must_use]
    pub const fn config(&self) -> &RequestOptions {
        &self.options
    }

    #[must_use]
    pub const fn params(&self) -> &ParamSet {
        &self.params
    }

    fn split_args(&self, args: Args) -> Result<(Option<Map<String, Value>>, Option<Value>), Error> {
        match args {
            Args::Empty => Ok((None, None)),
            Args::Single(payload) if self.has_payload() => Ok((None, Some(payload))),
            Args::Single(Value::Null) => Ok((None, None)),
            Args::Single(Value::Object(params)) => Ok((Some(params), None)),
            Args::Single(other) => Err(Error::invalid_arguments(format!(
                "{} {} takes an object of parameters, got {other}",
                self.method, self.url
            ))),
            Args::Pair(params, payload) => Ok((params, payload)),
        }
    }

    /// Effective parameters for a call with `explicit` parameters and `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParamResolution`] when a factory or preprocessor fails.
    pub async fn resolve_params(
        &self,
        explicit: Option<&Map<String, Value>>,
        payload: Option<&Value>,
    ) -> Result<Map<String, Value>, Error> {
        self.params
            .resolve(
                &self.url,
                explicit,
                payload,
                &self.options.param_preprocessors,
            )
            .await
    }

    /// Expands the URL template with `params`; leftovers become the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the template uses a reserved parameter name.
    pub fn build_request(
        &self,
        params: &Map<String, Value>,
        payload: Option<Value>,
    ) -> Result<PreparedRequest, Error> {
        let UrlResult { url, query } = url_template::resolve(&self.url, Some(params))?;
        // GET never carries a body; only structured payloads can become query parameters.
        let payload = match payload {
            Some(value) if self.method == Method::Get && !(value.is_object() || value.is_array()) => {
                debug!(
                    target: constants::LOG_TARGET_PARAMS,
                    "Dropping non-structured GET payload for {}", self.url
                );
                None
            }
            other => other,
        };
        Ok(PreparedRequest::new(self.method, url)
            .query(query)
            .body(payload))
    }

    /// Resolves parameters, builds the request and runs it through the client.
    /// Yields the response body.
    ///
    /// # Errors
    ///
    /// Returns argument, parameter and template errors before any network
    /// activity, then whatever the pipeline returns.
    pub async fn call(&self, args: impl Into<Args>) -> Result<Value, Error> {
        let (explicit, payload) = self.split_args(args.into())?;
        let params = self.resolve_params(explicit.as_ref(), payload.as_ref()).await?;
        let request = self.build_request(&params, payload)?;
        debug!(
            target: constants::LOG_TARGET_PARAMS,
            "{} {} resolved to {}",
            self.method,
            self.url,
            request.url
        );
        let response = self.client.execute(request, &self.options).await?;
        Ok(response.body)
    }
}
