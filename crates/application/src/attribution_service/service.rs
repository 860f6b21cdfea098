use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use attestra_core::{ScopeId, TargetId};
use attestra_domain::{Attribution, AuditEntry, ChangeKind, CorrelationConfig};

use super::ports::AuditTrail;

/// Application service correlating change events with the audit trail.
///
/// Correlation is best-effort and per-event; invocations share no mutable
/// state and may run concurrently without coordination.
#[derive(Clone)]
pub struct AttributionService {
    trail: Arc<dyn AuditTrail>,
    config: CorrelationConfig,
}

impl AttributionService {
    /// Creates a service over an audit trail.
    #[must_use]
    pub fn new(trail: Arc<dyn AuditTrail>, config: CorrelationConfig) -> Self {
        Self { trail, config }
    }

    /// Finds the most plausible actor responsible for a change.
    ///
    /// Prefers the most recent entry matching the event's target; when no
    /// entry in the fetched page matches, falls back to the most recent
    /// entry of the kind, since the trail may record the target
    /// differently than the event's view of it. Entries older than the
    /// event by more than the configured threshold are treated as
    /// unrelated. Every lookup failure, including a timeout, degrades to
    /// [`Attribution::Unknown`] — attribution never aborts the
    /// event-handling path it runs in, and it is never retried.
    pub async fn attribute(
        &self,
        scope: &ScopeId,
        kind: ChangeKind,
        target_id: Option<&TargetId>,
        occurred_at: DateTime<Utc>,
    ) -> Attribution {
        let lookup = self.trail.fetch_recent(scope, kind, self.config.fetch_limit);
        let timeout = StdDuration::from_millis(self.config.lookup_timeout_millis);

        let entries = match tokio::time::timeout(timeout, lookup).await {
            Ok(Ok(entries)) => entries,
            Ok(Err(error)) => {
                debug!(kind = kind.as_str(), error = %error, "audit trail lookup failed");
                return Attribution::Unknown;
            }
            Err(_) => {
                debug!(kind = kind.as_str(), "audit trail lookup timed out");
                return Attribution::Unknown;
            }
        };

        let matched = target_id.and_then(|target| {
            entries
                .iter()
                .find(|entry| entry.target_id.as_ref() == Some(target))
        });

        match matched.or_else(|| entries.first()) {
            Some(entry) if self.is_fresh(entry, occurred_at) => Attribution::Actor(entry.clone()),
            Some(entry) => {
                debug!(
                    kind = kind.as_str(),
                    entry_created_at = %entry.created_at,
                    "discarding stale audit trail entry"
                );
                Attribution::Unknown
            }
            None => Attribution::Unknown,
        }
    }

    fn is_fresh(&self, entry: &AuditEntry, occurred_at: DateTime<Utc>) -> bool {
        occurred_at.signed_duration_since(entry.created_at)
            <= Duration::milliseconds(self.config.max_entry_age_millis)
    }
}
