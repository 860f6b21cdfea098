//! Per-operation request throttling: policy table, fallback resolution,
//! and the fixed-window counter state machine.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use attestra_core::{AppError, AppResult};

/// Policy table key resolved when no operation-specific entry exists.
pub const DEFAULT_OPERATION: &str = "default";

/// Final hardcoded fallback applied when no configuration was supplied at
/// all: 5 requests per 5 minutes.
pub const FALLBACK_LIMITS: ThrottleLimits = ThrottleLimits {
    max_requests: 5,
    window_millis: 300_000,
};

/// Limits applied to one operation within a fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleLimits {
    /// Maximum accepted requests per window.
    pub max_requests: u32,
    /// Window length in milliseconds.
    pub window_millis: i64,
}

/// Throttle policy table loaded once at startup and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThrottleConfig {
    /// Operation name to limits, with an optional `"default"` entry.
    pub policies: HashMap<String, ThrottleLimits>,
}

impl ThrottleConfig {
    /// Parses a policy table from its JSON object form, e.g.
    /// `{"default":{"max_requests":5,"window_millis":300000}}`.
    pub fn from_json(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw).map_err(|error| {
            AppError::Configuration(format!("invalid throttle policy table: {error}"))
        })
    }

    /// Resolves the limits for an operation.
    ///
    /// The fallback chain is deliberate and ordered: the operation-specific
    /// entry, then the `"default"` entry, then [`FALLBACK_LIMITS`]. A
    /// missing entry is not an error; an unconfigured operation degrades to
    /// the permissive default rather than blocking all of its requests.
    #[must_use]
    pub fn resolve(&self, operation: &str) -> ThrottleLimits {
        self.policies
            .get(operation)
            .or_else(|| self.policies.get(DEFAULT_OPERATION))
            .copied()
            .unwrap_or(FALLBACK_LIMITS)
    }

    /// Validates every configured policy.
    ///
    /// Returns warnings for policies that are valid but suspicious, such as
    /// windows below a one-second floor. Violations name the operation and
    /// the offending field.
    pub fn validate(&self) -> AppResult<Vec<String>> {
        let mut warnings = Vec::new();

        for (operation, limits) in &self.policies {
            if limits.max_requests == 0 {
                return Err(AppError::Configuration(format!(
                    "throttle policy '{operation}': max_requests must be greater than zero"
                )));
            }

            if limits.window_millis <= 0 {
                return Err(AppError::Configuration(format!(
                    "throttle policy '{operation}': window_millis must be greater than zero"
                )));
            }

            if limits.window_millis < 1_000 {
                warnings.push(format!(
                    "throttle policy '{operation}': window of {}ms is shorter than one second",
                    limits.window_millis
                ));
            }
        }

        Ok(warnings)
    }
}

/// Counter state for one key within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEntry {
    /// Accepted requests in the current window.
    pub count: u32,
    /// Instant the current window closes. Once `now` reaches it the entry
    /// is semantically expired and must be replaced, never incremented.
    pub window_end: DateTime<Utc>,
}

/// Result of one window check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCheck {
    /// Whether the request was rejected.
    pub limited: bool,
    /// Capacity left in the current window after this check.
    pub remaining: u32,
    /// When the current window closes and capacity resets.
    pub reset_at: DateTime<Utc>,
}

/// Advances the fixed-window counter state machine for one request.
///
/// Returns the entry state to store alongside the check result. Rejected
/// requests do not consume capacity: when the limit is hit the entry is
/// returned unchanged. This is a fixed window, not a sliding one — a burst
/// of up to twice the limit can be admitted across a window boundary, the
/// accepted trade-off for constant-time checks and one entry per key.
#[must_use]
pub fn check_window(
    existing: Option<WindowEntry>,
    limits: ThrottleLimits,
    now: DateTime<Utc>,
) -> (WindowEntry, WindowCheck) {
    match existing {
        Some(entry) if now < entry.window_end => {
            if entry.count >= limits.max_requests {
                let check = WindowCheck {
                    limited: true,
                    remaining: 0,
                    reset_at: entry.window_end,
                };
                return (entry, check);
            }

            let entry = WindowEntry {
                count: entry.count + 1,
                window_end: entry.window_end,
            };
            let check = WindowCheck {
                limited: false,
                remaining: limits.max_requests - entry.count,
                reset_at: entry.window_end,
            };
            (entry, check)
        }
        _ => {
            let entry = WindowEntry {
                count: 1,
                window_end: now + Duration::milliseconds(limits.window_millis),
            };
            let check = WindowCheck {
                limited: false,
                remaining: limits.max_requests.saturating_sub(1),
                reset_at: entry.window_end,
            };
            (entry, check)
        }
    }
}
