//! Retention lifecycle transitions for stored requests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use attestra_core::{ActorId, AppResult};
use attestra_domain::RetentionPolicy;

use crate::ports::Clock;


/// Store port owning persisted request records and their lifecycle stage.
///
/// The storage schema is the store's business; this core only dictates the
/// age cutoffs. Implementations keep transitions monotonic — a record
/// never moves back to an earlier stage.
#[async_trait]
pub trait RequestRecordStore: Send + Sync {
    /// Appends one accepted request as an active record.
    async fn append(&self, actor: &ActorId, operation: &str) -> AppResult<()>;

    /// Expires active records accepted before the cutoff; returns how
    /// many moved.
    async fn mark_expired(&self, accepted_before: DateTime<Utc>) -> AppResult<u64>;

    /// Archives records accepted before the cutoff; returns how many
    /// moved.
    async fn mark_archived(&self, accepted_before: DateTime<Utc>) -> AppResult<u64>;

    /// Purges records accepted before the cutoff; returns how many were
    /// removed.
    async fn purge_deleted(&self, accepted_before: DateTime<Utc>) -> AppResult<u64>;
}

/// Counts of records moved by one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleRunReport {
    /// Records moved from active to expired.
    pub expired: u64,
    /// Records moved to archived.
    pub archived: u64,
    /// Records purged from the store.
    pub purged: u64,
}

/// Application service applying retention stage transitions.
///
/// Scheduling is the caller's concern: the service runs one pass per
/// invocation and holds no timer of its own.
#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn RequestRecordStore>,
    policy: RetentionPolicy,
    clock: Arc<dyn Clock>,
}

impl LifecycleService {
    /// Creates the service. The policy must have passed startup
    /// validation; the stage ordering is assumed unconditionally here.
    #[must_use]
    pub fn new(
        store: Arc<dyn RequestRecordStore>,
        policy: RetentionPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    /// Runs one maintenance pass over all three stage boundaries.
    ///
    /// Purge runs first so a record already past the delete boundary
    /// leaves in a single pass instead of being expired and archived on
    /// the way out.
    pub async fn run_transitions(&self) -> AppResult<LifecycleRunReport> {
        let now = self.clock.now();

        let purged = self
            .store
            .purge_deleted(now - self.policy.delete_age())
            .await?;
        let archived = self
            .store
            .mark_archived(now - self.policy.archive_age())
            .await?;
        let expired = self
            .store
            .mark_expired(now - self.policy.expiry_age())
            .await?;

        Ok(LifecycleRunReport {
            expired,
            archived,
            purged,
        })
    }
}
