use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::QueryKind;
use crate::utils::datasource::{ObjectName, QueryResult, RowCount};
use crate::utils::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: QueryKind,
    pub object: ObjectName,
    pub rows: Option<RowCount>,
}

impl CacheKey {
    pub fn new(kind: QueryKind, object: &ObjectName, rows: Option<RowCount>) -> Self {
        Self {
            kind,
            object: object.clone(),
            rows,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub clears: u64,
}

/// Memoizes query results until `clear` is called. No TTL, no eviction.
#[derive(Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<CacheKey, Arc<QueryResult>>>,
    stats: RwLock<CacheStats>,
    /// Bumped by every `clear`, under the entries lock.
    generation: AtomicU64,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Arc<QueryResult>> {
        let found = self.entries.read().await.get(key).cloned();

        let mut stats = self.stats.write().await;
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        found
    }

    pub async fn insert(&self, key: CacheKey, result: Arc<QueryResult>) {
        self.entries.write().await.insert(key, result);
    }

    /// Returns the cached value for `key`, or runs `load` and caches its success.
    /// Errors pass through and leave nothing behind, and so does a load that
    /// was still running when the cache got cleared.
    pub async fn get_or_try_insert_with<F, Fut>(&self, key: CacheKey, load: F) -> Result<Arc<QueryResult>, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<QueryResult, AppError>>,
    {
        if let Some(hit) = self.get(&key).await {
            debug!("Cache hit for {:?} {}", key.kind, key.object);
            return Ok(hit);
        }

        let started = self.generation.load(Ordering::SeqCst);
        let result = Arc::new(load().await?);

        let mut entries = self.entries.write().await;
        if self.generation.load(Ordering::SeqCst) == started {
            entries.insert(key, Arc::clone(&result));
        } else {
            debug!("Cache cleared while loading {:?} {}; not storing", key.kind, key.object);
        }
        Ok(result)
    }

    /// Drops every entry. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let removed = {
            let mut entries = self.entries.write().await;
            let removed = entries.len();
            entries.clear();
            self.generation.fetch_add(1, Ordering::SeqCst);
            removed
        };

        self.stats.write().await.clears += 1;
        info!("Cleared result cache ({} entries)", removed);
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let mut stats = *self.stats.read().await;
        stats.entries = self.len().await;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    fn key(name: &str, rows: u8) -> CacheKey {
        CacheKey::new(
            QueryKind::Top,
            &ObjectName::new(Some("dmd"), name).unwrap(),
            Some(RowCount::new(rows as i64).unwrap()),
        )
    }

    fn result(v: i64) -> QueryResult {
        QueryResult::new(vec!["v".into()], vec![vec![json!(v)]])
    }

    #[tokio::test]
    async fn test_loader_runs_once_per_key() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let got = cache
                .get_or_try_insert_with(key("a", 5), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(result(1))
                })
                .await
                .unwrap();
            assert_eq!(*got, result(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Different row count is a different key.
        cache
            .get_or_try_insert_with(key("a", 6), || async { Ok(result(2)) })
            .await
            .unwrap();
        assert_eq!(cache.len().await, 2);

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = ResultCache::new();
        let err = cache
            .get_or_try_insert_with(key("a", 5), || async {
                Err(AppError::DataAccess("offline".into()))
            })
            .await;
        assert!(err.is_err());
        assert!(cache.is_empty().await);

        let ok = cache
            .get_or_try_insert_with(key("a", 5), || async { Ok(result(3)) })
            .await
            .unwrap();
        assert_eq!(*ok, result(3));
    }

    #[tokio::test]
    async fn test_clear_forces_reload() {
        let cache = ResultCache::new();
        cache.insert(key("a", 5), Arc::new(result(1))).await;
        cache.insert(key("b", 5), Arc::new(result(1))).await;

        assert_eq!(cache.clear().await, 2);
        assert!(cache.get(&key("a", 5)).await.is_none());

        let reloaded = cache
            .get_or_try_insert_with(key("a", 5), || async { Ok(result(9)) })
            .await
            .unwrap();
        assert_eq!(*reloaded, result(9));
        assert_eq!(cache.stats().await.clears, 1);
    }

    #[tokio::test]
    async fn test_load_racing_a_clear_is_not_stored() {
        let cache = ResultCache::new();
        let (started_tx, started_rx) = oneshot::channel::<()>();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let load = cache.get_or_try_insert_with(key("a", 5), move || async move {
            let _ = started_tx.send(());
            let _ = release_rx.await;
            Ok(result(1))
        });
        let clear = async {
            let _ = started_rx.await;
            cache.clear().await;
            let _ = release_tx.send(());
        };

        let (loaded, ()) = tokio::join!(load, clear);
        assert_eq!(*loaded.unwrap(), result(1));
        assert!(cache.is_empty().await);

        // The next call goes back to the source.
        let fresh = cache
            .get_or_try_insert_with(key("a", 5), || async { Ok(result(2)) })
            .await
            .unwrap();
        assert_eq!(*fresh, result(2));
        assert_eq!(cache.len().await, 1);
    }
}
