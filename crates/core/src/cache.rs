use crate::traits::AnswerCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const ANSWER_TTL: Duration = Duration::from_secs(10 * 60);

const KEY_PREFIX: &str = "qa:";

/// Cache key for a question: trimmed, lowercased, prefixed.
pub fn cache_key(question: &str) -> String {
    format!("{KEY_PREFIX}{}", question.trim().to_lowercase())
}

/// Best-effort access to an optional answer cache.
///
/// Without a store every read misses and every write is dropped. Store errors
/// are logged and otherwise behave the same way.
#[derive(Clone)]
pub struct CacheGateway {
    store: Option<Arc<dyn AnswerCache + Send + Sync>>,
    ttl: Duration,
}

impl CacheGateway {
    pub fn new(store: Arc<dyn AnswerCache + Send + Sync>) -> Self {
        Self {
            store: Some(store),
            ttl: ANSWER_TTL,
        }
    }

    pub fn disabled() -> Self {
        Self {
            store: None,
            ttl: ANSWER_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub async fn read(&self, key: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(hit) => hit,
            Err(error) => {
                warn!(key, %error, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Spawns the write and returns immediately; the handle may be dropped.
    pub fn write_detached(&self, key: String, value: String) -> Option<JoinHandle<()>> {
        let store = self.store.clone()?;
        let ttl = self.ttl;

        Some(tokio::spawn(async move {
            match store.set(&key, &value, ttl).await {
                Ok(()) => debug!(key = %key, "answer cached"),
                Err(error) => warn!(key = %key, %error, "cache write failed"),
            }
        }))
    }
}

impl Default for CacheGateway {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::{cache_key, CacheGateway, ANSWER_TTL};
    use crate::traits::AnswerCache;
    use crate::{CacheError, MemoryCache};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct UnreachableCache;

    #[async_trait]
    impl AnswerCache for UnreachableCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(redis::RedisError::from((redis::ErrorKind::IoError, "connection refused")).into())
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(redis::RedisError::from((redis::ErrorKind::IoError, "connection refused")).into())
        }
    }

    #[test]
    fn key_is_normalized_question() {
        assert_eq!(cache_key("  What is the BORE of 6205? "), "qa:what is the bore of 6205?");
        assert_eq!(cache_key("bore of 6205"), cache_key("BORE OF 6205\t"));
        assert_eq!(ANSWER_TTL, Duration::from_secs(600));
    }

    #[tokio::test]
    async fn disabled_gateway_always_misses() {
        let gateway = CacheGateway::disabled();
        assert!(!gateway.is_enabled());
        assert_eq!(gateway.read("qa:x").await, None);
        assert!(gateway
            .write_detached("qa:x".to_string(), "y".to_string())
            .is_none());
    }

    #[tokio::test]
    async fn store_failures_degrade_to_miss_and_noop() {
        let gateway = CacheGateway::new(Arc::new(UnreachableCache));
        assert_eq!(gateway.read("qa:x").await, None);

        let handle = gateway
            .write_detached("qa:x".to_string(), "y".to_string())
            .expect("write is spawned");
        handle.await.expect("write task does not panic");
    }

    #[tokio::test]
    async fn detached_write_lands_in_store() {
        let store = Arc::new(MemoryCache::new());
        let gateway = CacheGateway::new(store.clone());

        let handle = gateway
            .write_detached(cache_key("bore of 6205"), "25 mm".to_string())
            .expect("write is spawned");
        handle.await.expect("write task does not panic");

        assert_eq!(gateway.read("qa:bore of 6205").await.as_deref(), Some("25 mm"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn shortened_ttl_expires_entry() {
        let gateway =
            CacheGateway::new(Arc::new(MemoryCache::new())).with_ttl(Duration::from_millis(20));

        gateway
            .write_detached(cache_key("bore of 6205"), "25 mm".to_string())
            .expect("write is spawned")
            .await
            .expect("write task does not panic");
        assert_eq!(gateway.read("qa:bore of 6205").await.as_deref(), Some("25 mm"));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(gateway.read("qa:bore of 6205").await, None);
    }
}
