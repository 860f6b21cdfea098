//! Cross-cutting ports shared by application services.

use chrono::{DateTime, Utc};

/// Source of the current time, injectable for tests.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}
