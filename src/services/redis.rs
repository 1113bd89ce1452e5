//! Redis service for per-user token generations

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Token generation counters; bumping a user's counter revokes their tokens
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Current generation, 0 if never revoked
    async fn generation(&self, user_id: Uuid) -> AppResult<i64>;

    /// Increment the generation and return the new value
    async fn revoke(&self, user_id: Uuid) -> AppResult<i64>;
}

/// Redis-backed token generations over one shared, auto-reconnecting connection
#[derive(Clone)]
pub struct RedisService {
    conn: ConnectionManager,
}

fn generation_key(user_id: Uuid) -> String {
    format!("token_gen:{}", user_id)
}

fn client(url: &str) -> AppResult<Client> {
    Client::open(url).map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))
}

impl RedisService {
    /// Connect to Redis and check the connection
    pub async fn new(url: &str) -> AppResult<Self> {
        let mut conn = ConnectionManager::new(client(url)?)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl TokenStore for RedisService {
    async fn generation(&self, user_id: Uuid) -> AppResult<i64> {
        let mut conn = self.conn.clone();
        let current: Option<i64> = conn
            .get(generation_key(user_id))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read token generation: {}", e)))?;
        Ok(current.unwrap_or(0))
    }

    async fn revoke(&self, user_id: Uuid) -> AppResult<i64> {
        let mut conn = self.conn.clone();
        conn.incr(generation_key(user_id), 1)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to revoke tokens: {}", e)))
    }
}

#[cfg(test)]
pub mod memory {
    use std::{collections::HashMap, sync::Mutex};

    use super::*;

    /// Process-local generations for tests
    #[derive(Default)]
    pub struct MemoryTokenStore {
        generations: Mutex<HashMap<Uuid, i64>>,
    }

    #[async_trait]
    impl TokenStore for MemoryTokenStore {
        async fn generation(&self, user_id: Uuid) -> AppResult<i64> {
            let map = self.generations.lock().unwrap_or_else(|e| e.into_inner());
            Ok(map.get(&user_id).copied().unwrap_or(0))
        }

        async fn revoke(&self, user_id: Uuid) -> AppResult<i64> {
            let mut map = self.generations.lock().unwrap_or_else(|e| e.into_inner());
            let gen = map.entry(user_id).or_insert(0);
            *gen += 1;
            Ok(*gen)
        }
    }
}
