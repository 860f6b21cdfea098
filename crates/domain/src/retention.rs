//! Retention lifecycle: the three stage boundaries and the stage a stored
//! request belongs in at a given age.

use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use attestra_core::{AppError, AppResult};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Day-count thresholds governing when a stored request leaves each
/// lifecycle stage.
///
/// The boundaries must be strictly ordered: each stage needs a non-empty
/// duration before the next begins. Validation runs once at startup and a
/// violation is fatal, because downstream lifecycle logic assumes the
/// ordering unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Age in days at which an active request expires.
    pub expiry_days: f64,
    /// Age in days at which an expired request is archived.
    pub archive_days: f64,
    /// Age in days at which an archived request is purged.
    pub delete_days: f64,
}

impl RetentionPolicy {
    /// Validates field shape and the strict stage ordering.
    pub fn validate(&self) -> AppResult<()> {
        validated_days("expiry_days", self.expiry_days)?;
        validated_days("archive_days", self.archive_days)?;
        validated_days("delete_days", self.delete_days)?;

        if self.expiry_days >= self.archive_days {
            return Err(AppError::Configuration(format!(
                "retention expiry_days ({}) must be strictly less than archive_days ({})",
                self.expiry_days, self.archive_days
            )));
        }

        if self.archive_days >= self.delete_days {
            return Err(AppError::Configuration(format!(
                "retention archive_days ({}) must be strictly less than delete_days ({})",
                self.archive_days, self.delete_days
            )));
        }

        Ok(())
    }

    /// Age at which an active request expires.
    #[must_use]
    pub fn expiry_age(&self) -> Duration {
        days_to_duration(self.expiry_days)
    }

    /// Age at which an expired request is archived.
    #[must_use]
    pub fn archive_age(&self) -> Duration {
        days_to_duration(self.archive_days)
    }

    /// Age at which an archived request is purged.
    #[must_use]
    pub fn delete_age(&self) -> Duration {
        days_to_duration(self.delete_days)
    }

    /// Returns the stage a request of the given age belongs in.
    #[must_use]
    pub fn stage_for_age(&self, age: Duration) -> RecordStage {
        if age >= self.delete_age() {
            RecordStage::Deleted
        } else if age >= self.archive_age() {
            RecordStage::Archived
        } else if age >= self.expiry_age() {
            RecordStage::Expired
        } else {
            RecordStage::Active
        }
    }
}

fn validated_days(field: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::Configuration(format!(
            "retention {field} must be a finite number of days, got {value}"
        )));
    }

    if value < 0.0 {
        return Err(AppError::Configuration(format!(
            "retention {field} must not be negative, got {value}"
        )));
    }

    Ok(())
}

fn days_to_duration(days: f64) -> Duration {
    Duration::milliseconds((days * MILLIS_PER_DAY) as i64)
}

/// Lifecycle stage of a stored request.
///
/// Transitions are monotonic: a record moves forward through the stages by
/// age and never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStage {
    /// Recently accepted, fully visible.
    Active,
    /// Past the expiry boundary, awaiting archival.
    Expired,
    /// Archived, retained for audit only.
    Archived,
    /// Past the delete boundary; the store may purge it.
    Deleted,
}

impl RecordStage {
    /// Returns a stable storage value for this stage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
        }
    }

    /// Indicates whether a record may move from this stage to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        next > *self
    }
}

impl FromStr for RecordStage {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "archived" => Ok(Self::Archived),
            "deleted" => Ok(Self::Deleted),
            _ => Err(AppError::Validation(format!(
                "unknown record stage value '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::Duration;
    use proptest::prelude::*;

    use super::{RecordStage, RetentionPolicy};

    fn policy(expiry_days: f64, archive_days: f64, delete_days: f64) -> RetentionPolicy {
        RetentionPolicy {
            expiry_days,
            archive_days,
            delete_days,
        }
    }

    #[test]
    fn strictly_ordered_boundaries_pass() {
        assert!(policy(5.0, 10.0, 20.0).validate().is_ok());
    }

    #[test]
    fn equal_boundaries_fail() {
        let result = policy(5.0, 5.0, 10.0).validate();
        assert!(result.is_err());

        let result = policy(5.0, 10.0, 10.0).validate();
        assert!(result.is_err());
    }

    #[test]
    fn negative_and_non_finite_values_fail() {
        assert!(policy(-1.0, 10.0, 20.0).validate().is_err());
        assert!(policy(f64::NAN, 10.0, 20.0).validate().is_err());
        assert!(policy(5.0, f64::INFINITY, 20.0).validate().is_err());
    }

    #[test]
    fn stage_boundaries_are_inclusive() {
        let policy = policy(1.0, 2.0, 3.0);

        assert_eq!(policy.stage_for_age(Duration::hours(12)), RecordStage::Active);
        assert_eq!(policy.stage_for_age(Duration::days(1)), RecordStage::Expired);
        assert_eq!(policy.stage_for_age(Duration::days(2)), RecordStage::Archived);
        assert_eq!(policy.stage_for_age(Duration::days(3)), RecordStage::Deleted);
        assert_eq!(policy.stage_for_age(Duration::days(30)), RecordStage::Deleted);
    }

    #[test]
    fn transitions_only_move_forward() {
        assert!(RecordStage::Active.can_transition_to(RecordStage::Expired));
        assert!(RecordStage::Active.can_transition_to(RecordStage::Archived));
        assert!(RecordStage::Expired.can_transition_to(RecordStage::Deleted));
        assert!(!RecordStage::Archived.can_transition_to(RecordStage::Expired));
        assert!(!RecordStage::Deleted.can_transition_to(RecordStage::Active));
        assert!(!RecordStage::Active.can_transition_to(RecordStage::Active));
    }

    #[test]
    fn stage_values_round_trip() {
        for stage in [
            RecordStage::Active,
            RecordStage::Expired,
            RecordStage::Archived,
            RecordStage::Deleted,
        ] {
            let parsed = RecordStage::from_str(stage.as_str());
            assert!(parsed.is_ok());
            assert_eq!(parsed.unwrap_or_else(|_| unreachable!()), stage);
        }

        assert!(RecordStage::from_str("tombstone").is_err());
    }

    proptest! {
        #[test]
        fn stage_is_monotonic_in_age(
            younger_hours in 0i64..2_000,
            older_extra_hours in 0i64..2_000,
        ) {
            let policy = policy(7.0, 30.0, 60.0);
            let younger = policy.stage_for_age(Duration::hours(younger_hours));
            let older = policy.stage_for_age(Duration::hours(younger_hours + older_extra_hours));
            prop_assert!(older >= younger);
        }
    }
}
