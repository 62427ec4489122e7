//! Builds a [`Resource`]: custom actions plus the canonical CRUD set.
//!
//! Every resource ends up with `get`, `query`, `post`, `put`, `save`, `remove`
//! and `delete`. The pairs `get`/`query`, `put`/`save` and `remove`/`delete`
//! share one action unless both names were defined and canonical methods are
//! not enforced.

use crate::constants;
use crate::engine::action::{Args, ResourceAction};
use crate::engine::executor::Client;
use crate::error::Error;
use crate::options::{CacheOption, Method, RequestOptions};
use crate::params::DefaultParams;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Alias pairs and the method each pair stands for.
const ALIAS_PAIRS: [(&str, &str, Method); 3] = [
    (constants::ACTION_GET, constants::ACTION_QUERY, Method::Get),
    (constants::ACTION_PUT, constants::ACTION_SAVE, Method::Put),
    (constants::ACTION_REMOVE, constants::ACTION_DELETE, Method::Delete),
];

/// Definition of a custom action.
#[derive(Debug, Clone, Default)]
pub struct ActionSpec {
    /// Layered over the resource's default params.
    pub params: Option<DefaultParams>,
    /// Layered over the resource's common options.
    pub options: RequestOptions,
}

impl ActionSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn method(mut self, method: Method) -> Self {
        self.options.method = Some(method);
        self
    }

    #[must_use]
    pub fn params(mut self, params: DefaultParams) -> Self {
        self.params = Some(params);
        self
    }

    #[must_use]
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

impl From<RequestOptions> for ActionSpec {
    fn from(options: RequestOptions) -> Self {
        Self {
            params: None,
            options,
        }
    }
}

impl From<Method> for ActionSpec {
    fn from(method: Method) -> Self {
        Self::new().method(method)
    }
}

/// A named set of actions over one URL template.
#[derive(Debug, Clone)]
pub struct Resource {
    url: String,
    actions: IndexMap<String, Arc<ResourceAction>>,
}

impl Resource {
    #[must_use]
    pub fn builder(url: impl Into<String>) -> ResourceBuilder {
        ResourceBuilder::new(url)
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn action(&self, name: &str) -> Option<&Arc<ResourceAction>> {
        self.actions.get(name)
    }

    /// Action names, custom actions first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Whether `a` and `b` name the very same action.
    #[must_use]
    pub fn is_alias(&self, a: &str, b: &str) -> bool {
        match (self.actions.get(a), self.actions.get(b)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Calls the action named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] for an unknown name, otherwise see
    /// [`ResourceAction::call`].
    pub async fn call(&self, name: &str, args: impl Into<Args>) -> Result<Value, Error> {
        let action = self.actions.get(name).ok_or_else(|| Error::UnknownAction {
            name: name.to_string(),
            available: self.actions.keys().cloned().collect(),
        })?;
        action.call(args).await
    }

    /// # Errors
    ///
    /// See [`ResourceAction::call`].
    pub async fn get(&self, args: impl Into<Args>) -> Result<Value, Error> {
        self.call(constants::ACTION_GET, args).await
    }

    /// # Errors
    ///
    /// See [`ResourceAction::call`].
    pub async fn query(&self, args: impl Into<Args>) -> Result<Value, Error> {
        self.call(constants::ACTION_QUERY, args).await
    }

    /// # Errors
    ///
    /// See [`ResourceAction::call`].
    pub async fn post(&self, args: impl Into<Args>) -> Result<Value, Error> {
        self.call(constants::ACTION_POST, args).await
    }

    /// # Errors
    ///
    /// See [`ResourceAction::call`].
    pub async fn put(&self, args: impl Into<Args>) -> Result<Value, Error> {
        self.call(constants::ACTION_PUT, args).await
    }

    /// # Errors
    ///
    /// See [`ResourceAction::call`].
    pub async fn save(&self, args: impl Into<Args>) -> Result<Value, Error> {
        self.call(constants::ACTION_SAVE, args).await
    }

    /// # Errors
    ///
    /// See [`ResourceAction::call`].
    pub async fn remove(&self, args: impl Into<Args>) -> Result<Value, Error> {
        self.call(constants::ACTION_REMOVE, args).await
    }

    /// # Errors
    ///
    /// See [`ResourceAction::call`].
    pub async fn delete(&self, args: impl Into<Args>) -> Result<Value, Error> {
        self.call(constants::ACTION_DELETE, args).await
    }
}

/// Builder form of [`define_resource`].
#[derive(Debug, Clone)]
pub struct ResourceBuilder {
    url: String,
    default_params: DefaultParams,
    actions: IndexMap<String, ActionSpec>,
    common: RequestOptions,
    enforce_canonical_methods: bool,
}

impl ResourceBuilder {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            default_params: DefaultParams::new(),
            actions: IndexMap::new(),
            common: RequestOptions::new(),
            enforce_canonical_methods: true,
        }
    }

    #[must_use]
    pub fn default_params(mut self, params: DefaultParams) -> Self {
        self.default_params = params;
        self
    }

    #[must_use]
    pub fn action(mut self, name: impl Into<String>, spec: impl Into<ActionSpec>) -> Self {
        self.actions.insert(name.into(), spec.into());
        self
    }

    #[must_use]
    pub fn options(mut self, common: RequestOptions) -> Self {
        self.common = common;
        self
    }

    #[must_use]
    pub const fn enforce_canonical_methods(mut self, enforce: bool) -> Self {
        self.enforce_canonical_methods = enforce;
        self
    }

    #[must_use]
    pub fn build(self, client: &Arc<Client>) -> Resource {
        define_resource(
            client,
            &self.url,
            &self.default_params,
            self.actions,
            &self.common,
            self.enforce_canonical_methods,
        )
    }
}

/// Creates a resource for `url` from custom `actions` and the canonical set.
///
/// Custom actions merge their params over `default_params` and their options
/// over `common`. With `enforce_canonical_methods`, a custom action under a
/// canonical name is forced onto that name's method before it is built.
#[must_use]
pub fn define_resource(
    client: &Arc<Client>,
    url: &str,
    default_params: &DefaultParams,
    actions: IndexMap<String, ActionSpec>,
    common: &RequestOptions,
    enforce_canonical_methods: bool,
) -> Resource {
    let mut specs = actions;

    if enforce_canonical_methods {
        for (primary, alias, method) in ALIAS_PAIRS {
            let source = if specs.contains_key(primary) { primary } else { alias };
            if let Some(spec) = specs.get_mut(source) {
                spec.options.method = Some(method);
            }
        }
        if let Some(spec) = specs.get_mut(constants::ACTION_POST) {
            spec.options.method = Some(Method::Post);
        }
    }

    let mut built: IndexMap<String, Arc<ResourceAction>> = IndexMap::new();
    for (name, spec) in &specs {
        let shadowed = enforce_canonical_methods
            && ALIAS_PAIRS
                .iter()
                .any(|(primary, alias, _)| name == alias && specs.contains_key(*primary));
        if shadowed {
            debug!(
                target: constants::LOG_TARGET_PARAMS,
                "Action '{name}' on {url} is replaced by its canonical counterpart"
            );
            continue;
        }
        built.insert(
            name.clone(),
            Arc::new(build_custom(client, url, default_params, common, spec)),
        );
    }

    for (index, (primary, alias, method)) in ALIAS_PAIRS.into_iter().enumerate() {
        // Default order: get/query, post, put/save, remove/delete.
        if index == 1 && !built.contains_key(constants::ACTION_POST) {
            built.insert(
                constants::ACTION_POST.to_string(),
                Arc::new(build_default(client, url, default_params, common, Method::Post)),
            );
        }
        let primary_defined = specs.contains_key(primary);
        let alias_defined = specs.contains_key(alias);
        if primary_defined {
            if !alias_defined || enforce_canonical_methods {
                let shared = Arc::clone(&built[primary]);
                built.insert(alias.to_string(), shared);
            }
        } else if alias_defined {
            let shared = Arc::clone(&built[alias]);
            built.insert(primary.to_string(), shared);
        } else {
            let shared = Arc::new(build_default(client, url, default_params, common, method));
            built.insert(primary.to_string(), Arc::clone(&shared));
            built.insert(alias.to_string(), shared);
        }
    }

    Resource {
        url: url.to_string(),
        actions: built,
    }
}

fn build_custom(
    client: &Arc<Client>,
    url: &str,
    default_params: &DefaultParams,
    common: &RequestOptions,
    spec: &ActionSpec,
) -> ResourceAction {
    let params = spec
        .params
        .as_ref()
        .map_or_else(|| default_params.clone(), |own| default_params.merge(own));

    let mut options = common.merge(&spec.options);
    // `cache: true` on an action means the resource's store when the resource has one.
    if matches!(spec.options.cache, Some(CacheOption::UseDefault)) {
        if let Some(CacheOption::Store(store)) = &common.cache {
            options.cache = Some(CacheOption::Store(Arc::clone(store)));
        }
    }

    ResourceAction::new(Arc::clone(client), url, &params, options)
}

fn build_default(
    client: &Arc<Client>,
    url: &str,
    default_params: &DefaultParams,
    common: &RequestOptions,
    method: Method,
) -> ResourceAction {
    let options = common.merge(&RequestOptions::new().method(method));
    ResourceAction::new(Arc::clone(client), url, default_params, options)
}
