use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attestra_core::{ActorId, TargetId};

/// One audit-trail entry as reported by the platform.
///
/// Entries are ephemeral: they are fetched per lookup and never cached
/// across calls, because the trail is appended to at any time by the
/// platform and a later fetch may see a different page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Account recorded as responsible for the action.
    pub executor_id: ActorId,
    /// Free-form reason supplied by the executor, if any.
    pub reason: Option<String>,
    /// Resource the entry refers to, if the trail recorded one.
    pub target_id: Option<TargetId>,
    /// When the entry was written to the trail.
    pub created_at: DateTime<Utc>,
}

/// Outcome of correlating a change event against the audit trail.
///
/// `Unknown` is a normal outcome, not an error: the trail may lag the
/// event, the matching entry may be stale, or the lookup may have failed.
/// Callers degrade their presentation instead of propagating a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribution {
    /// The trail yielded a plausible responsible actor.
    Actor(AuditEntry),
    /// No plausible entry was found.
    Unknown,
}

impl Attribution {
    /// Returns the attributed executor, when one was found.
    #[must_use]
    pub fn executor(&self) -> Option<&ActorId> {
        match self {
            Self::Actor(entry) => Some(&entry.executor_id),
            Self::Unknown => None,
        }
    }

    /// Indicates that no actor could be attributed.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// Tunables for audit-trail correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Maximum trail entries fetched per lookup. Freshness matters more
    /// than completeness; only the most recent page is ever considered.
    pub fetch_limit: usize,
    /// How much older than the triggering event an entry may be before it
    /// is treated as unrelated.
    pub max_entry_age_millis: i64,
    /// Upper bound on one trail lookup round trip.
    pub lookup_timeout_millis: u64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            fetch_limit: 50,
            max_entry_age_millis: 15_000,
            lookup_timeout_millis: 3_000,
        }
    }
}
