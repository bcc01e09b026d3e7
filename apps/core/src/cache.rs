//! Three-tier task cache: in-process memory, persistent store, remote source.
//!
//! Lookups go memory -> store -> remote and warm the faster tiers on the way
//! back. Storage failures are logged and skipped; remote failures propagate.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

use crate::model::Task;
use crate::remote::{FetchError, TaskSource};
use crate::store::{KeyValueStore, StorageError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    AllTasks,
    Query(String),
}

impl CacheKey {
    pub fn query(query: &str) -> Self {
        Self::Query(query.trim().to_string())
    }

    pub fn name_filter(&self) -> Option<&str> {
        match self {
            Self::AllTasks => None,
            Self::Query(query) => Some(query),
        }
    }

    pub fn storage_key(&self) -> String {
        match self {
            Self::AllTasks => "tasks:all".to_string(),
            Self::Query(query) => format!("tasks:query:{query}"),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllTasks => write!(f, "<all tasks>"),
            Self::Query(query) => write!(f, "{query:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Memory,
    Persistent,
    Remote,
}

pub struct TieredCache {
    memory: Mutex<HashMap<CacheKey, Arc<Vec<Task>>>>,
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn TaskSource>,
}

impl TieredCache {
    pub fn new(store: Arc<dyn KeyValueStore>, source: Arc<dyn TaskSource>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            store,
            source,
        }
    }

    pub async fn resolve(&self, key: &CacheKey) -> Result<Arc<Vec<Task>>, FetchError> {
        self.resolve_with_tier(key).await.map(|(tasks, _)| tasks)
    }

    /// Same as [`TieredCache::resolve`], also reporting which tier answered.
    pub async fn resolve_with_tier(
        &self,
        key: &CacheKey,
    ) -> Result<(Arc<Vec<Task>>, Tier), FetchError> {
        if let Some(tasks) = self.memory_get(key) {
            tracing::debug!(key = %key, "memory cache hit");
            return Ok((tasks, Tier::Memory));
        }

        match self.persistent_get(key).await {
            Ok(Some(tasks)) => {
                tracing::debug!(key = %key, "persistent cache hit");
                let tasks = Arc::new(tasks);
                self.memory_put(key, Arc::clone(&tasks));
                return Ok((tasks, Tier::Persistent));
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(key = %key, %error, "persistent cache read failed");
            }
        }

        let tasks = Arc::new(self.source.fetch(key).await?);
        self.warm(key, &tasks).await;
        Ok((tasks, Tier::Remote))
    }

    /// Re-fetches `key` from the remote tier and overwrites both cache tiers.
    /// Returns `true` when the fetched data differs from what was cached.
    pub async fn refresh(&self, key: &CacheKey) -> Result<bool, FetchError> {
        let fresh = Arc::new(self.source.fetch(key).await?);

        let previous = match self.memory_get(key) {
            Some(tasks) => Some(tasks),
            None => match self.persistent_get(key).await {
                Ok(found) => found.map(Arc::new),
                Err(error) => {
                    tracing::warn!(key = %key, %error, "persistent cache read failed");
                    None
                }
            },
        };
        let changed = previous.map_or(true, |previous| *previous != *fresh);

        self.warm(key, &fresh).await;
        tracing::info!(key = %key, changed, count = fresh.len(), "cache refreshed");
        Ok(changed)
    }

    pub fn memory_len(&self) -> usize {
        self.memory.lock().map(|memory| memory.len()).unwrap_or(0)
    }

    pub fn source_name(&self) -> &'static str {
        self.source.source_name()
    }

    /// Memory first, so lookups racing a slow store write still hit.
    async fn warm(&self, key: &CacheKey, tasks: &Arc<Vec<Task>>) {
        self.memory_put(key, Arc::clone(tasks));
        if let Err(error) = self.persistent_put(key, tasks).await {
            tracing::warn!(key = %key, %error, "failed to persist tasks");
        }
    }

    fn memory_get(&self, key: &CacheKey) -> Option<Arc<Vec<Task>>> {
        let memory = self.memory.lock().ok()?;
        memory.get(key).cloned()
    }

    fn memory_put(&self, key: &CacheKey, tasks: Arc<Vec<Task>>) {
        if let Ok(mut memory) = self.memory.lock() {
            memory.insert(key.clone(), tasks);
        }
    }

    async fn persistent_get(&self, key: &CacheKey) -> Result<Option<Vec<Task>>, StorageError> {
        let Some(raw) = self.store.get(&key.storage_key()).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn persistent_put(&self, key: &CacheKey, tasks: &[Task]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(tasks)?;
        self.store.set(&key.storage_key(), &raw).await
    }
}
