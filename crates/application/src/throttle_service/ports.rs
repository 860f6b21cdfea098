use async_trait::async_trait;
use chrono::{DateTime, Utc};

use attestra_core::AppResult;
use attestra_domain::{ThrottleLimits, WindowCheck};

/// Storage port for fixed-window request counters.
///
/// The key-to-entry table behind this port is the only shared mutable
/// structure in the throttling layer. Implementations must make the
/// check-and-mutate step for a single key atomic; two concurrent checks
/// for the same key must never both be admitted past the limit.
#[async_trait]
pub trait WindowStore: Send + Sync {
    /// Runs one fixed-window check for `key` and records the attempt when
    /// it is admitted. Rejected attempts consume no capacity.
    async fn check(&self, key: &str, limits: ThrottleLimits) -> AppResult<WindowCheck>;

    /// Returns the entry for `key` if it exists and its window is still
    /// open. Never mutates state.
    async fn peek(&self, key: &str) -> AppResult<Option<WindowSnapshot>>;

    /// Removes every entry whose key starts with `prefix`; returns the
    /// number removed.
    async fn remove_prefix(&self, prefix: &str) -> AppResult<u64>;

    /// Removes every entry.
    async fn clear(&self) -> AppResult<()>;

    /// Removes entries whose window has already closed; returns the number
    /// removed. Only semantically dead entries are touched, so the sweep
    /// is safe to run concurrently with checks.
    async fn sweep_expired(&self) -> AppResult<u64>;
}

/// Read-only view of one live window entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    /// Accepted requests in the current window.
    pub count: u32,
    /// When the current window closes.
    pub window_end: DateTime<Utc>,
}
