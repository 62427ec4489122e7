use crate::constants;
use crate::error::Error;
use crate::transport::Response;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::time::Instant;
use tokio::sync::Mutex;

/// Configuration for the default in-memory response store
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live applied to every stored response
    pub ttl: Duration,
    /// Maximum number of cached responses
    pub max_entries: usize,
    /// Whether the store keeps anything at all
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(constants::DEFAULT_CACHE_TTL_SECS),
            max_entries: constants::DEFAULT_CACHE_MAX_ENTRIES,
            enabled: true,
        }
    }
}

/// The cache collaborator: a shared key-value store of responses.
///
/// Consistency between concurrent readers and writers is the store's concern;
/// callers do not lock around `get`/`set`.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Looks up `key`. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> Result<Option<Response>, Error>;

    /// Stores `response` under `key`, replacing any previous entry.
    async fn set(&self, key: &str, response: Response) -> Result<(), Error>;
}

/// Builds the cache key for a request from its URL, query and body.
///
/// Query and body are JSON-encoded (`{}` when absent) unless they are already strings.
/// Deterministic, but not collision-proof.
#[must_use]
pub fn cache_key(url: &str, query: Option<&Map<String, Value>>, body: Option<&Value>) -> String {
    let query = query.map_or_else(
        || constants::EMPTY_JSON_OBJECT.to_string(),
        |q| Value::Object(q.clone()).to_string(),
    );
    let body = match body {
        None | Some(Value::Null) => constants::EMPTY_JSON_OBJECT.to_string(),
        Some(Value::String(raw)) => raw.clone(),
        Some(other) => other.to_string(),
    };
    let sep = constants::CACHE_KEY_SEPARATOR;
    format!("{url}{sep}{query}{sep}{body}")
}

#[derive(Debug, Clone)]
struct CacheEntry {
    response: Response,
    expires_at: Instant,
}

/// In-memory response store with a TTL and a bounded number of entries.
///
/// When full, the oldest inserted entry is evicted. Expired entries are
/// dropped lazily on lookup.
pub struct MemoryCache {
    config: CacheConfig,
    entries: Mutex<IndexMap<String, CacheEntry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(IndexMap::new()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Clear all cached responses
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let cleared = entries.len();
        entries.clear();
        cleared
    }

    /// Get cache statistics
    pub async fn get_stats(&self) -> CacheStats {
        let entries = self.entries.lock().await;
        let now = Instant::now();
        let expired_entries = entries.values().filter(|e| e.expires_at <= now).count();
        CacheStats {
            total_entries: entries.len(),
            valid_entries: entries.len() - expired_entries,
            expired_entries,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[async_trait]
impl ResponseStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Response>, Error> {
        if !self.config.enabled {
            return Ok(None);
        }

        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.response.clone())),
            Some(_) => {
                entries.shift_remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, response: Response) -> Result<(), Error> {
        if !self.config.enabled || self.config.max_entries == 0 {
            return Ok(());
        }

        let mut entries = self.entries.lock().await;
        entries.shift_remove(key);
        while entries.len() >= self.config.max_entries {
            entries.shift_remove_index(0);
        }
        entries.insert(
            key.to_string(),
            CacheEntry {
                response,
                expires_at: Instant::now() + self.config.ttl,
            },
        );
        Ok(())
    }
}

/// Cache statistics
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of cache entries
    pub total_entries: usize,
    /// Number of valid (non-expired) entries
    pub valid_entries: usize,
    /// Number of expired entries
    pub expired_entries: usize,
}
