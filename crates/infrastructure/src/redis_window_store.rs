//! Redis-backed window store for multi-process deployments.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use redis::Script;

use attestra_application::{WindowSnapshot, WindowStore};
use attestra_core::{AppError, AppResult};
use attestra_domain::{ThrottleLimits, WindowCheck};

// Runs the whole check-and-mutate step server-side so it stays atomic
// across processes. Rejected attempts never reach the INCR.
const CHECK_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local max_requests = tonumber(ARGV[1])
local window_millis = tonumber(ARGV[2])

local count = tonumber(redis.call('GET', key))
if count and count >= max_requests then
  local ttl = redis.call('PTTL', key)
  if ttl < 0 then
    ttl = 0
  end
  return {1, 0, ttl}
end

local updated = redis.call('INCR', key)
if updated == 1 then
  redis.call('PEXPIRE', key, window_millis)
end
return {0, max_requests - updated, redis.call('PTTL', key)}
"#;

const PEEK_SCRIPT: &str = r#"
local count = tonumber(redis.call('GET', KEYS[1]))
if not count then
  return nil
end
local ttl = redis.call('PTTL', KEYS[1])
if ttl < 0 then
  return nil
end
return {count, ttl}
"#;

const REMOVE_MATCHING_SCRIPT: &str = r#"
local removed = 0
for _, key in ipairs(redis.call('KEYS', ARGV[1])) do
  redis.call('DEL', key)
  removed = removed + 1
end
return removed
"#;

/// Redis implementation of the window store port.
///
/// Entries live under a configured key prefix and expire server-side via
/// TTL, so the periodic sweep has nothing to do here.
#[derive(Clone)]
pub struct RedisWindowStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisWindowStore {
    /// Creates a store with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }

    async fn remove_matching(&self, pattern: String) -> AppResult<u64> {
        let mut connection = self.connection().await?;

        let removed: i64 = Script::new(REMOVE_MATCHING_SCRIPT)
            .arg(pattern)
            .invoke_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to remove redis window entries: {error}"))
            })?;

        u64::try_from(removed)
            .map_err(|error| AppError::Internal(format!("invalid redis removal count: {error}")))
    }
}

#[async_trait]
impl WindowStore for RedisWindowStore {
    async fn check(&self, key: &str, limits: ThrottleLimits) -> AppResult<WindowCheck> {
        let mut connection = self.connection().await?;

        let (limited, remaining, ttl_millis): (i64, i64, i64) = Script::new(CHECK_WINDOW_SCRIPT)
            .key(self.key_for(key))
            .arg(i64::from(limits.max_requests))
            .arg(limits.window_millis)
            .invoke_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to run redis window check: {error}"))
            })?;

        let remaining = u32::try_from(remaining.max(0))
            .map_err(|error| AppError::Internal(format!("invalid redis remaining: {error}")))?;

        Ok(WindowCheck {
            limited: limited == 1,
            remaining,
            reset_at: Utc::now() + Duration::milliseconds(ttl_millis.max(0)),
        })
    }

    async fn peek(&self, key: &str) -> AppResult<Option<WindowSnapshot>> {
        let mut connection = self.connection().await?;

        let snapshot: Option<(i64, i64)> = Script::new(PEEK_SCRIPT)
            .key(self.key_for(key))
            .invoke_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read redis window entry: {error}"))
            })?;

        snapshot
            .map(|(count, ttl_millis)| {
                let count = u32::try_from(count).map_err(|error| {
                    AppError::Internal(format!("invalid redis window count: {error}"))
                })?;

                Ok(WindowSnapshot {
                    count,
                    window_end: Utc::now() + Duration::milliseconds(ttl_millis.max(0)),
                })
            })
            .transpose()
    }

    async fn remove_prefix(&self, prefix: &str) -> AppResult<u64> {
        self.remove_matching(format!("{}:{prefix}*", self.key_prefix))
            .await
    }

    async fn clear(&self) -> AppResult<()> {
        self.remove_matching(format!("{}:*", self.key_prefix))
            .await
            .map(|_| ())
    }

    async fn sweep_expired(&self) -> AppResult<u64> {
        // Window keys expire automatically via TTL.
        Ok(0)
    }
}
