//! Redis-backed session state

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::error::{AppError, AppResult};

/// Per-session state keyed by the session id carried in the bearer token
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Count a visit and return the number of visits before this one
    async fn record_visit(&self, session_id: &str) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct RedisService {
    client: Client,
    session_ttl_seconds: u64,
}

impl RedisService {
    /// Create a new Redis service and check connectivity
    pub async fn new(url: &str, session_ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;

        Ok(Self {
            client,
            session_ttl_seconds,
        })
    }

    fn visits_key(session_id: &str) -> String {
        format!("session:{}:visits", session_id)
    }
}

#[async_trait]
impl SessionStore for RedisService {
    async fn record_visit(&self, session_id: &str) -> AppResult<i64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let key = Self::visits_key(session_id);
        let visits: i64 = conn.incr(&key, 1).await?;
        // The counter dies with the session token
        let _: bool = conn.expire(&key, self.session_ttl_seconds as i64).await?;

        Ok(visits - 1)
    }
}
