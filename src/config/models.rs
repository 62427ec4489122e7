use crate::constants;
use crate::duration::parse_duration;
use crate::error::Error;
use crate::options::{CacheOption, RequestOptions};
use crate::response_cache::CacheConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Global request defaults every call is merged over
    #[serde(default)]
    pub defaults: RequestDefaults,
    /// The default response store
    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestDefaults {
    pub response_type: Option<String>,
    /// Duration string such as "5s"; absent means no timeout
    pub timeout: Option<String>,
    pub with_credentials: Option<bool>,
    /// Cache every request in the default store
    #[serde(default)]
    pub cache: bool,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Duration string; defaults to twenty minutes
    pub ttl: Option<String>,
}

const fn default_cache_enabled() -> bool {
    true
}

const fn default_max_entries() -> usize {
    constants::DEFAULT_CACHE_MAX_ENTRIES
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: constants::DEFAULT_CACHE_MAX_ENTRIES,
            ttl: None,
        }
    }
}

impl Settings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for these settings.
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        Ok(toml::from_str(content)?)
    }

    /// The request options layer described by `[defaults]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `timeout` is not a valid duration.
    pub fn request_options(&self) -> Result<RequestOptions, Error> {
        let defaults = &self.defaults;
        let mut options = RequestOptions::new();
        options.response_type.clone_from(&defaults.response_type);
        options.with_credentials = defaults.with_credentials;
        options.timeout = defaults.timeout.as_deref().map(parse_duration).transpose()?;
        options.headers.clone_from(&defaults.headers);
        if defaults.cache {
            options.cache = Some(CacheOption::UseDefault);
        }
        Ok(options)
    }

    /// Configuration of the default memory store described by `[cache]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `ttl` is not a valid duration.
    pub fn cache_config(&self) -> Result<CacheConfig, Error> {
        let ttl = match self.cache.ttl.as_deref() {
            Some(ttl) => parse_duration(ttl)?,
            None => Duration::from_secs(constants::DEFAULT_CACHE_TTL_SECS),
        };
        Ok(CacheConfig {
            ttl,
            max_entries: self.cache.max_entries,
            enabled: self.cache.enabled,
        })
    }
}
