use crate::traits::AnswerCache;
use crate::CacheError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

/// Answer cache backed by a Redis server.
///
/// `ConnectionManager` multiplexes one connection and reconnects on its own,
/// so clones of this store are cheap and share the link.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(connection_string: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(connection_string)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self { connection })
    }
}

fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl AnswerCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut connection = self.connection.clone();
        let value: Option<String> = connection.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        connection
            .set_ex::<_, _, ()>(key, value, expiry_seconds(ttl))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::expiry_seconds;
    use std::time::Duration;

    #[test]
    fn expiry_is_whole_seconds_and_never_zero() {
        assert_eq!(expiry_seconds(Duration::from_secs(600)), 600);
        assert_eq!(expiry_seconds(Duration::from_millis(1500)), 1);
        assert_eq!(expiry_seconds(Duration::ZERO), 1);
    }
}
