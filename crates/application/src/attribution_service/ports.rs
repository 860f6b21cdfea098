use async_trait::async_trait;

use attestra_core::{AppResult, ScopeId};
use attestra_domain::{AuditEntry, ChangeKind};

/// Read port over the platform's audit trail.
///
/// The trail is populated asynchronously by the platform and may lag a
/// change notification by an unbounded interval; a page may be empty or
/// stale. Implementations return entries most recent first.
#[async_trait]
pub trait AuditTrail: Send + Sync {
    /// Fetches the most recent trail entries of one kind within a scope,
    /// bounded by `limit`.
    async fn fetch_recent(
        &self,
        scope: &ScopeId,
        kind: ChangeKind,
        limit: usize,
    ) -> AppResult<Vec<AuditEntry>>;
}
