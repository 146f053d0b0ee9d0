//! Email verification token store.
//!
//! Lookup is non-consuming; single use is enforced by calling `invalidate`
//! after a successful verification. Only token hashes are keyed here; the raw
//! token exists solely in the email link.

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

/// Pending email verification tokens, keyed by token hash.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn store(&self, token_hash: &str, user_id: Uuid, ttl: Duration) -> Result<()>;

    /// Resolve a token to its owning user. Unknown or expired tokens yield
    /// `None`; "not verified" is an expected outcome, never an error.
    async fn lookup(&self, token_hash: &str) -> Result<Option<Uuid>>;

    /// Delete the entry so the token can never resolve again.
    async fn invalidate(&self, token_hash: &str) -> Result<()>;

    /// Remaining lifetime of a pending token, `None` when absent or expired.
    async fn ttl_remaining(&self, token_hash: &str) -> Result<Option<Duration>>;
}

fn verify_key(token_hash: &str) -> String {
    format!("verify:{token_hash}")
}

/// Redis-backed store: one string key per token with a native expiry.
pub struct RedisVerificationStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisVerificationStore {
    /// Connect to Redis.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("invalid redis url")?;
        let conn = client
            .get_connection_manager()
            .await
            .context("failed to connect to redis")?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl VerificationStore for RedisVerificationStore {
    async fn store(&self, token_hash: &str, user_id: Uuid, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(verify_key(token_hash), user_id.to_string(), ttl.as_secs())
            .await
            .context("failed to store verification token")?;
        Ok(())
    }

    async fn lookup(&self, token_hash: &str) -> Result<Option<Uuid>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(verify_key(token_hash))
            .await
            .context("failed to lookup verification token")?;
        value
            .map(|raw| Uuid::parse_str(&raw).context("malformed user id in verification entry"))
            .transpose()
    }

    async fn invalidate(&self, token_hash: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn
            .del(verify_key(token_hash))
            .await
            .context("failed to invalidate verification token")?;
        Ok(())
    }

    async fn ttl_remaining(&self, token_hash: &str) -> Result<Option<Duration>> {
        let mut conn = self.conn.clone();
        // TTL returns -2 for missing keys and -1 for keys without expiry.
        let seconds: i64 = conn
            .ttl(verify_key(token_hash))
            .await
            .context("failed to read verification token ttl")?;
        Ok(u64::try_from(seconds).ok().map(Duration::from_secs))
    }
}

struct PendingVerification {
    user_id: Uuid,
    expires_at: Instant,
}

/// In-process store used for tests and for running without Redis.
#[derive(Default)]
pub struct MemoryVerificationStore {
    entries: Mutex<HashMap<String, PendingVerification>>,
}

impl MemoryVerificationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerificationStore for MemoryVerificationStore {
    async fn store(&self, token_hash: &str, user_id: Uuid, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            token_hash.to_string(),
            PendingVerification {
                user_id,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn lookup(&self, token_hash: &str) -> Result<Option<Uuid>> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        Ok(entries
            .get(token_hash)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.user_id))
    }

    async fn invalidate(&self, token_hash: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(token_hash);
        Ok(())
    }

    async fn ttl_remaining(&self, token_hash: &str) -> Result<Option<Duration>> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        Ok(entries
            .get(token_hash)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.expires_at - now))
    }
}
