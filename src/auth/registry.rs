//! Refresh token registry: active sessions per user.
//!
//! One entry corresponds to one logged-in device/browser. The registry
//! enforces the per-user session cap with insertion-order eviction (oldest
//! registered first, not LRU-by-use) and lets entries lapse with the refresh
//! TTL.

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

/// Session bookkeeping for refresh tokens.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Insert the token id into the user's session set; evicts the
    /// oldest-inserted entry when the cap is exceeded.
    async fn register(&self, user_id: Uuid, token_id: Uuid) -> Result<()>;

    async fn is_valid(&self, user_id: Uuid, token_id: Uuid) -> Result<bool>;

    async fn revoke(&self, user_id: Uuid, token_id: Uuid) -> Result<()>;

    /// Delete every session entry for the user; returns the number removed.
    async fn revoke_all(&self, user_id: Uuid) -> Result<u64>;
}

fn session_key(user_id: Uuid) -> String {
    format!("sessions:{user_id}")
}

fn unix_now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

/// Redis-backed registry: one sorted set per user, scored by insertion time
/// in milliseconds, so rank order is insertion order.
pub struct RedisSessionRegistry {
    conn: redis::aio::ConnectionManager,
    max_sessions: usize,
    ttl: Duration,
}

impl RedisSessionRegistry {
    /// Connect to Redis and hand back a registry with the given cap and TTL.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established.
    pub async fn connect(url: &str, max_sessions: usize, ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(url).context("invalid redis url")?;
        let conn = client
            .get_connection_manager()
            .await
            .context("failed to connect to redis")?;
        Ok(Self {
            conn,
            max_sessions,
            ttl,
        })
    }

    fn expiry_cutoff_ms(&self) -> i64 {
        unix_now_ms() - i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }
}

#[async_trait]
impl SessionRegistry for RedisSessionRegistry {
    async fn register(&self, user_id: Uuid, token_id: Uuid) -> Result<()> {
        let key = session_key(user_id);
        let now_ms = unix_now_ms();
        let ttl_seconds = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let mut conn = self.conn.clone();

        // Prune + insert + count in one MULTI/EXEC so concurrent sign-ins see
        // a consistent cardinality. Eviction runs afterwards; a transient
        // overshoot of one session under race is acceptable.
        let (count,): (i64,) = redis::pipe()
            .atomic()
            .zrembyscore(&key, "-inf", self.expiry_cutoff_ms())
            .ignore()
            .zadd(&key, token_id.to_string(), now_ms)
            .ignore()
            .zcard(&key)
            .expire(&key, ttl_seconds)
            .ignore()
            .query_async(&mut conn)
            .await
            .context("failed to register session")?;

        let excess = count - i64::try_from(self.max_sessions).unwrap_or(i64::MAX);
        if excess > 0 {
            // Lowest ranks are the earliest insertions.
            let _: () = conn
                .zremrangebyrank(&key, 0, isize::try_from(excess - 1).unwrap_or(0))
                .await
                .context("failed to evict oldest sessions")?;
        }
        Ok(())
    }

    async fn is_valid(&self, user_id: Uuid, token_id: Uuid) -> Result<bool> {
        let mut conn = self.conn.clone();
        let score: Option<i64> = conn
            .zscore(session_key(user_id), token_id.to_string())
            .await
            .context("failed to check session")?;
        Ok(score.is_some_and(|inserted_ms| inserted_ms > self.expiry_cutoff_ms()))
    }

    async fn revoke(&self, user_id: Uuid, token_id: Uuid) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn
            .zrem(session_key(user_id), token_id.to_string())
            .await
            .context("failed to revoke session")?;
        Ok(())
    }

    async fn revoke_all(&self, user_id: Uuid) -> Result<u64> {
        let key = session_key(user_id);
        let mut conn = self.conn.clone();
        let (count, _): (i64, i64) = redis::pipe()
            .atomic()
            .zcard(&key)
            .del(&key)
            .query_async(&mut conn)
            .await
            .context("failed to revoke all sessions")?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

struct SessionEntry {
    token_id: Uuid,
    expires_at: Instant,
}

/// In-process registry used for tests and for running without Redis.
/// Insertion order is the deque order; expired entries are pruned on access.
pub struct MemorySessionRegistry {
    sessions: Mutex<HashMap<Uuid, VecDeque<SessionEntry>>>,
    max_sessions: usize,
    ttl: Duration,
}

impl MemorySessionRegistry {
    #[must_use]
    pub fn new(max_sessions: usize, ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_sessions,
            ttl,
        }
    }
}

#[async_trait]
impl SessionRegistry for MemorySessionRegistry {
    async fn register(&self, user_id: Uuid, token_id: Uuid) -> Result<()> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let entries = sessions.entry(user_id).or_default();
        entries.retain(|entry| entry.expires_at > now && entry.token_id != token_id);
        entries.push_back(SessionEntry {
            token_id,
            expires_at: now + self.ttl,
        });
        while entries.len() > self.max_sessions {
            entries.pop_front();
        }
        Ok(())
    }

    async fn is_valid(&self, user_id: Uuid, token_id: Uuid) -> Result<bool> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let Some(entries) = sessions.get_mut(&user_id) else {
            return Ok(false);
        };
        entries.retain(|entry| entry.expires_at > now);
        Ok(entries.iter().any(|entry| entry.token_id == token_id))
    }

    async fn revoke(&self, user_id: Uuid, token_id: Uuid) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        if let Some(entries) = sessions.get_mut(&user_id) {
            entries.retain(|entry| entry.token_id != token_id);
        }
        Ok(())
    }

    async fn revoke_all(&self, user_id: Uuid) -> Result<u64> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let Some(mut entries) = sessions.remove(&user_id) else {
            return Ok(0);
        };
        entries.retain(|entry| entry.expires_at > now);
        Ok(entries.len() as u64)
    }
}
