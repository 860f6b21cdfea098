//! In-memory window store backed by a keyed hash map.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use attestra_application::{Clock, WindowSnapshot, WindowStore};
use attestra_core::AppResult;
use attestra_domain::{ThrottleLimits, WindowCheck, WindowEntry, check_window};


/// In-memory implementation of the window store port.
///
/// The whole table sits behind one async mutex, so the read-decide-write
/// step of a check is a single critical section: two concurrent checks for
/// the same key serialize and can never both be admitted past the limit.
pub struct InMemoryWindowStore {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl InMemoryWindowStore {
    /// Creates an empty store reading time from the given clock.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl WindowStore for InMemoryWindowStore {
    async fn check(&self, key: &str, limits: ThrottleLimits) -> AppResult<WindowCheck> {
        let mut entries = self.entries.lock().await;
        let (entry, check) = check_window(entries.get(key).copied(), limits, self.clock.now());
        entries.insert(key.to_owned(), entry);
        Ok(check)
    }

    async fn peek(&self, key: &str) -> AppResult<Option<WindowSnapshot>> {
        let now = self.clock.now();
        Ok(self
            .entries
            .lock()
            .await
            .get(key)
            .filter(|entry| now < entry.window_end)
            .map(|entry| WindowSnapshot {
                count: entry.count,
                window_end: entry.window_end,
            }))
    }

    async fn remove_prefix(&self, prefix: &str) -> AppResult<u64> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn clear(&self) -> AppResult<()> {
        self.entries.lock().await.clear();
        Ok(())
    }

    async fn sweep_expired(&self) -> AppResult<u64> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| now < entry.window_end);
        Ok((before - entries.len()) as u64)
    }
}
