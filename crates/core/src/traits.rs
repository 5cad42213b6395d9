use crate::{CacheError, CompletionError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A chat model that answers one system instruction with one text reply.
#[async_trait]
pub trait ChatCompletion {
    async fn complete(&self, system_prompt: &str) -> Result<String, CompletionError>;
}

#[async_trait]
impl<T> ChatCompletion for Arc<T>
where
    T: ChatCompletion + Send + Sync + ?Sized,
{
    async fn complete(&self, system_prompt: &str) -> Result<String, CompletionError> {
        (**self).complete(system_prompt).await
    }
}

/// Key/value store for finished answers with store-enforced expiry.
#[async_trait]
pub trait AnswerCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}
