//! Default parameters of a resource action and their per-call resolution.
//!
//! A default is one of:
//! - a literal value
//! - `"@field"`, read from the payload's `field` on every call
//! - a factory computing the value from the caller's params and payload
//!
//! Literals form the base parameter set. The other two kinds ("extra params")
//! are evaluated fresh on every call and lose to explicit caller parameters.

use crate::constants;
use crate::error::Error;
use crate::hooks::{ParamFactory, ParamPreprocessor};
use crate::merge;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, warn};

/// A single default parameter as supplied by the resource definition.
#[derive(Debug, Clone)]
pub enum DefaultParam {
    Value(Value),
    /// Read from the payload field of this name.
    FromPayload(String),
    Factory(ParamFactory),
}

impl From<Value> for DefaultParam {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) if s.starts_with(constants::PARAM_PAYLOAD_PREFIX) => {
                Self::FromPayload(s[constants::PARAM_PAYLOAD_PREFIX.len_utf8()..].to_string())
            }
            other => Self::Value(other),
        }
    }
}

impl From<&str> for DefaultParam {
    fn from(value: &str) -> Self {
        Self::from(Value::String(value.to_string()))
    }
}

impl From<ParamFactory> for DefaultParam {
    fn from(factory: ParamFactory) -> Self {
        Self::Factory(factory)
    }
}

/// Ordered default parameters of a resource or action.
#[derive(Debug, Clone, Default)]
pub struct DefaultParams(IndexMap<String, DefaultParam>);

impl DefaultParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, param: impl Into<DefaultParam>) -> Self {
        self.0.insert(name.into(), param.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, param: impl Into<DefaultParam>) {
        self.0.insert(name.into(), param.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DefaultParam> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DefaultParam)> {
        self.0.iter()
    }

    /// Layers `other` over `self`. Two literal values merge like options; anything else is replaced.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged = self.0.clone();
        for (name, param) in &other.0 {
            let next = match (merged.get(name), param) {
                (Some(DefaultParam::Value(base)), DefaultParam::Value(overlay)) => {
                    DefaultParam::Value(merge::merge_value(base, overlay))
                }
                _ => param.clone(),
            };
            merged.insert(name.clone(), next);
        }
        Self(merged)
    }
}

impl From<Map<String, Value>> for DefaultParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k, DefaultParam::from(v))).collect())
    }
}

impl<K: Into<String>, P: Into<DefaultParam>> FromIterator<(K, P)> for DefaultParams {
    fn from_iter<I: IntoIterator<Item = (K, P)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, p)| (k.into(), p.into())).collect())
    }
}

/// A default that has to be computed on every call.
#[derive(Debug, Clone)]
pub enum ExtraParam {
    FromPayload(String),
    Factory(ParamFactory),
}

/// Defaults split into literal values and extra params, fixed at action construction.
#[derive(Debug, Clone, Default)]
pub struct ParamSet {
    literals: Map<String, Value>,
    extras: IndexMap<String, ExtraParam>,
}

impl ParamSet {
    #[must_use]
    pub fn classify(defaults: &DefaultParams) -> Self {
        let mut set = Self::default();
        for (name, param) in defaults.iter() {
            match param {
                DefaultParam::Value(value) => {
                    set.literals.insert(name.clone(), value.clone());
                }
                DefaultParam::FromPayload(field) => {
                    set.extras
                        .insert(name.clone(), ExtraParam::FromPayload(field.clone()));
                }
                DefaultParam::Factory(factory) => {
                    set.extras
                        .insert(name.clone(), ExtraParam::Factory(factory.clone()));
                }
            }
        }
        set
    }

    #[must_use]
    pub const fn literals(&self) -> &Map<String, Value> {
        &self.literals
    }

    #[must_use]
    pub const fn extras(&self) -> &IndexMap<String, ExtraParam> {
        &self.extras
    }

    /// Computes the effective parameters of one call.
    ///
    /// Precedence, lowest first: literal defaults, extra params, `explicit`.
    /// Registered preprocessors then rewrite the values they are keyed on, one
    /// at a time in parameter order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParamResolution`] naming the parameter and `url` when a
    /// factory or preprocessor fails.
    pub async fn resolve(
        &self,
        url: &str,
        explicit: Option<&Map<String, Value>>,
        payload: Option<&Value>,
        preprocessors: &IndexMap<String, ParamPreprocessor>,
    ) -> Result<Map<String, Value>, Error> {
        let explicit = Arc::new(explicit.cloned().unwrap_or_default());
        let payload = payload.cloned().map(Arc::new);

        let mut computed = Map::new();
        for (name, extra) in &self.extras {
            let value = match extra {
                ExtraParam::Factory(factory) => factory
                    .apply(Arc::clone(&explicit), payload.clone())
                    .await
                    .map_err(|e| {
                        error!(
                            target: constants::LOG_TARGET_PARAMS,
                            "Error while casting parameters: parameter: \"{name}\" url: \"{url}\""
                        );
                        Error::param_resolution(name, url, e)
                    })?,
                ExtraParam::FromPayload(field) => payload
                    .as_deref()
                    .and_then(|data| data.get(field))
                    .cloned(),
            };

            let Some(value) = value else {
                continue;
            };
            if explicit.contains_key(name) {
                warn!(
                    target: constants::LOG_TARGET_PARAMS,
                    "Computed default for \"{name}\" is overridden by an explicit parameter (url: \"{url}\")"
                );
            }
            computed.insert(name.clone(), value);
        }

        let mut merged = merge::merge_maps([&self.literals, &computed, &*explicit]);

        let targets: Vec<String> = merged
            .keys()
            .filter(|name| preprocessors.contains_key(*name))
            .cloned()
            .collect();
        for name in targets {
            let (Some(preprocessor), Some(value)) = (preprocessors.get(&name), merged.get(&name))
            else {
                continue;
            };
            let processed = preprocessor.apply(value.clone()).await.map_err(|e| {
                error!(
                    target: constants::LOG_TARGET_PARAMS,
                    "Error while preprocessing parameter: parameter: \"{name}\" url: \"{url}\""
                );
                Error::param_resolution(&name, url, e)
            })?;
            merged.insert(name, processed);
        }

        Ok(merged)
    }
}
