//! TTL cache in front of another prompt store.
//!
//! Prompts change rarely and are read on every model call, so lookups
//! (including "not found") are cached per name and label. When a refresh
//! fails, the last good entry keeps being served.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use crate::ports::{PromptStore, PromptStoreError, RemotePrompt};

type CacheKey = (String, Option<String>);

struct CachedEntry {
    prompt: Option<RemotePrompt>,
    fetched_at: Instant,
}

impl CachedEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

pub struct CachedPromptStore {
    inner: Arc<dyn PromptStore>,
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CachedEntry>>,
}

impl CachedPromptStore {
    pub fn new(inner: Arc<dyn PromptStore>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PromptStore for CachedPromptStore {
    async fn fetch(
        &self,
        name: &str,
        label: Option<&str>,
    ) -> Result<Option<RemotePrompt>, PromptStoreError> {
        let key: CacheKey = (name.to_string(), label.map(str::to_string));

        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                if entry.is_fresh(self.ttl) {
                    return Ok(entry.prompt.clone());
                }
            }
        }

        match self.inner.fetch(name, label).await {
            Ok(prompt) => {
                let mut entries = self.entries.write().await;
                entries.insert(
                    key,
                    CachedEntry {
                        prompt: prompt.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                Ok(prompt)
            }
            Err(err) => {
                let entries = self.entries.read().await;
                match entries.get(&key) {
                    Some(stale) => {
                        warn!(prompt = name, error = %err, "Prompt refresh failed, serving stale copy");
                        Ok(stale.prompt.clone())
                    }
                    None => Err(err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::prompts::InMemoryPromptStore;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Counts calls and can be switched into failure mode.
    struct CountingStore {
        inner: InMemoryPromptStore,
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    #[async_trait]
    impl PromptStore for CountingStore {
        async fn fetch(
            &self,
            name: &str,
            label: Option<&str>,
        ) -> Result<Option<RemotePrompt>, PromptStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(PromptStoreError::Unavailable("down".into()));
            }
            self.inner.fetch(name, label).await
        }
    }

    fn counting() -> Arc<CountingStore> {
        Arc::new(CountingStore {
            inner: InMemoryPromptStore::new().with_prompt("chat", "Hi {{first_name}}", 3),
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        })
    }

    #[tokio::test]
    async fn fresh_entries_are_served_from_cache() {
        let inner = counting();
        let cache = CachedPromptStore::new(inner.clone(), Duration::from_secs(60));

        assert_eq!(cache.fetch("chat", None).await.unwrap().unwrap().version, 3);
        assert_eq!(cache.fetch("chat", None).await.unwrap().unwrap().version, 3);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn misses_are_cached_too() {
        let inner = counting();
        let cache = CachedPromptStore::new(inner.clone(), Duration::from_secs(60));

        assert!(cache.fetch("unknown", None).await.unwrap().is_none());
        assert!(cache.fetch("unknown", None).await.unwrap().is_none());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let inner = counting();
        let cache = CachedPromptStore::new(inner.clone(), Duration::ZERO);

        cache.fetch("chat", None).await.unwrap();
        cache.fetch("chat", None).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stale_copy_survives_store_outage() {
        let inner = counting();
        let cache = CachedPromptStore::new(inner.clone(), Duration::ZERO);

        cache.fetch("chat", None).await.unwrap();
        inner.failing.store(true, Ordering::SeqCst);

        let prompt = cache.fetch("chat", None).await.unwrap().unwrap();
        assert_eq!(prompt.template, "Hi {{first_name}}");
    }

    #[tokio::test]
    async fn outage_without_cached_copy_is_an_error() {
        let inner = counting();
        inner.failing.store(true, Ordering::SeqCst);
        let cache = CachedPromptStore::new(inner, Duration::from_secs(60));

        assert!(cache.fetch("chat", None).await.is_err());
    }
}
