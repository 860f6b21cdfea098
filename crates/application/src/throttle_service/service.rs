use std::sync::Arc;

use chrono::{DateTime, Utc};

use attestra_core::{ActorId, AppResult};
use attestra_domain::{ThrottleConfig, WindowCheck};

use super::ports::WindowStore;

/// Introspection view of one actor's counter for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleStatus {
    /// Accepted requests in the current window.
    pub count: u32,
    /// Capacity left in the current window.
    pub remaining: u32,
    /// When the current window closes, absent for a fresh counter.
    pub reset_at: Option<DateTime<Utc>>,
    /// Whether the next request would be rejected.
    pub limited: bool,
}

/// Application service for per-actor operation throttling.
#[derive(Clone)]
pub struct ThrottleService {
    store: Arc<dyn WindowStore>,
    config: ThrottleConfig,
}

impl ThrottleService {
    /// Creates a service over a window store and a validated policy table.
    #[must_use]
    pub fn new(store: Arc<dyn WindowStore>, config: ThrottleConfig) -> Self {
        Self { store, config }
    }

    /// Checks whether `actor` may perform `operation` and records the
    /// attempt when admitted.
    ///
    /// Limits resolve through the policy table's fallback chain; a missing
    /// entry is not an error. The counter key joins actor and operation so
    /// each pair is throttled independently.
    pub async fn check_operation(
        &self,
        actor: &ActorId,
        operation: &str,
    ) -> AppResult<WindowCheck> {
        let limits = self.config.resolve(operation);
        let key = key_for(actor, operation);
        self.store.check(&key, limits).await
    }

    /// Reports the current counter state without consuming capacity.
    ///
    /// An expired or never-used counter reports the fresh state: zero
    /// count, full remaining capacity, no reset instant.
    pub async fn info(&self, actor: &ActorId, operation: &str) -> AppResult<ThrottleStatus> {
        let limits = self.config.resolve(operation);
        let snapshot = self.store.peek(&key_for(actor, operation)).await?;

        Ok(match snapshot {
            Some(snapshot) => ThrottleStatus {
                count: snapshot.count,
                remaining: limits.max_requests.saturating_sub(snapshot.count),
                reset_at: Some(snapshot.window_end),
                limited: snapshot.count >= limits.max_requests,
            },
            None => ThrottleStatus {
                count: 0,
                remaining: limits.max_requests,
                reset_at: None,
                limited: false,
            },
        })
    }

    /// Clears every operation counter for one actor. Administrative
    /// override; returns the number of counters removed.
    pub async fn reset(&self, actor: &ActorId) -> AppResult<u64> {
        self.store
            .remove_prefix(&format!("{}:", actor.as_str()))
            .await
    }

    /// Clears the whole counter table.
    pub async fn clear_all(&self) -> AppResult<()> {
        self.store.clear().await
    }
}

fn key_for(actor: &ActorId, operation: &str) -> String {
    format!("{}:{operation}", actor.as_str())
}
