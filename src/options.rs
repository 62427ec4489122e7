//! Request options and the values they are built from.
//!
//! Options come in layers (global defaults, resource-common, action-specific,
//! per-call) that are combined with [`RequestOptions::merge`]. Hook lists
//! concatenate, header and preprocessor maps merge one level, and every scalar
//! is replaced by the last layer that sets it.

use crate::constants;
use crate::error::Error;
use crate::hooks::{ParamPreprocessor, RecoveryHook, RequestHook, ResponseHook};
use crate::merge::Assign;
use crate::response_cache::ResponseStore;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Supported HTTP verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub const ALL: &'static [Self] = &[
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Head,
        Self::Options,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Whether actions using this verb take a payload.
    #[must_use]
    pub const fn has_payload(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| Error::invalid_config(format!("Unsupported HTTP method: {s}")))
    }
}

/// Whether and where responses are cached.
#[derive(Clone, Default)]
pub enum CacheOption {
    #[default]
    Disabled,
    /// Use the client's process-wide default store.
    UseDefault,
    Store(Arc<dyn ResponseStore>),
}

impl CacheOption {
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl From<bool> for CacheOption {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::UseDefault
        } else {
            Self::Disabled
        }
    }
}

impl From<Arc<dyn ResponseStore>> for CacheOption {
    fn from(store: Arc<dyn ResponseStore>) -> Self {
        Self::Store(store)
    }
}

impl fmt::Debug for CacheOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "CacheOption::Disabled"),
            Self::UseDefault => write!(f, "CacheOption::UseDefault"),
            Self::Store(_) => write!(f, "CacheOption::Store(<store>)"),
        }
    }
}

/// Maps a response type shorthand to the MIME type sent in `Accept`.
#[must_use]
pub fn accept_type(response_type: &str) -> &str {
    match response_type {
        constants::RESPONSE_TYPE_JSON => constants::CONTENT_TYPE_JSON,
        constants::RESPONSE_TYPE_TEXT => constants::CONTENT_TYPE_TEXT,
        constants::RESPONSE_TYPE_XML => constants::CONTENT_TYPE_XML,
        constants::RESPONSE_TYPE_HTML => constants::CONTENT_TYPE_HTML,
        constants::RESPONSE_TYPE_FORM | constants::RESPONSE_TYPE_URLENCODED => {
            constants::CONTENT_TYPE_FORM
        }
        other => other,
    }
}

/// One layer of request configuration. `None` / empty fields leave lower layers untouched.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub response_type: Option<String>,
    pub headers: IndexMap<String, String>,
    pub with_credentials: Option<bool>,
    pub timeout: Option<Duration>,
    pub cache: Option<CacheOption>,
    pub transform_request: Vec<RequestHook>,
    pub catch_request_error: Vec<RecoveryHook>,
    pub transform_response: Vec<ResponseHook>,
    pub catch_response_error: Vec<RecoveryHook>,
    pub param_preprocessors: IndexMap<String, ParamPreprocessor>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The bottom layer every request is merged over.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            response_type: Some(constants::RESPONSE_TYPE_JSON.to_string()),
            with_credentials: Some(false),
            cache: Some(CacheOption::Disabled),
            ..Self::default()
        }
    }

    /// Returns `self` with `other` layered on top.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.method.assign(&other.method);
        merged.response_type.assign(&other.response_type);
        merged.headers.assign(&other.headers);
        merged.with_credentials.assign(&other.with_credentials);
        merged.timeout.assign(&other.timeout);
        merged.cache.assign(&other.cache);
        merged.transform_request.assign(&other.transform_request);
        merged.catch_request_error.assign(&other.catch_request_error);
        merged.transform_response.assign(&other.transform_response);
        merged.catch_response_error.assign(&other.catch_response_error);
        merged.param_preprocessors.assign(&other.param_preprocessors);
        merged
    }

    #[must_use]
    pub const fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    #[must_use]
    pub fn response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub const fn with_credentials(mut self, enabled: bool) -> Self {
        self.with_credentials = Some(enabled);
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: impl Into<CacheOption>) -> Self {
        self.cache = Some(cache.into());
        self
    }

    #[must_use]
    pub fn transform_request(mut self, hook: RequestHook) -> Self {
        self.transform_request.push(hook);
        self
    }

    #[must_use]
    pub fn catch_request_error(mut self, hook: RecoveryHook) -> Self {
        self.catch_request_error.push(hook);
        self
    }

    #[must_use]
    pub fn transform_response(mut self, hook: ResponseHook) -> Self {
        self.transform_response.push(hook);
        self
    }

    #[must_use]
    pub fn catch_response_error(mut self, hook: RecoveryHook) -> Self {
        self.catch_response_error.push(hook);
        self
    }

    #[must_use]
    pub fn param_preprocessor(mut self, name: impl Into<String>, hook: ParamPreprocessor) -> Self {
        self.param_preprocessors.insert(name.into(), hook);
        self
    }

    /// `Accept` value for this layer, falling back to JSON.
    #[must_use]
    pub fn accept(&self) -> &str {
        accept_type(
            self.response_type
                .as_deref()
                .unwrap_or(constants::RESPONSE_TYPE_JSON),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_method_from_str() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("PATCH".parse::<Method>().unwrap(), Method::Patch);
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn test_merge_layers() {
        let base = RequestOptions::defaults()
            .header("X-Base", "1")
            .transform_response(ResponseHook::named("first", |_, body| Ok(body)));
        let overlay = RequestOptions::new()
            .header("X-Extra", "2")
            .timeout(Duration::from_secs(3))
            .transform_response(ResponseHook::named("second", |_, _| Ok(Value::Null)));

        let merged = base.merge(&overlay);
        assert_eq!(merged.headers.len(), 2);
        assert_eq!(merged.timeout, Some(Duration::from_secs(3)));
        assert_eq!(merged.response_type.as_deref(), Some("json"));
        let names: Vec<_> = merged.transform_response.iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_unset_fields_do_not_override() {
        let base = RequestOptions::new().with_credentials(true).cache(true);
        let merged = base.merge(&RequestOptions::new());
        assert_eq!(merged.with_credentials, Some(true));
        assert!(matches!(merged.cache, Some(CacheOption::UseDefault)));
    }

    #[test]
    fn test_accept_shorthands() {
        assert_eq!(accept_type("json"), "application/json");
        assert_eq!(accept_type("text/plain"), "text/plain");
        assert_eq!(RequestOptions::new().accept(), "application/json");
    }
}
