use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

/// Identifier of the community scope a change event belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(String);

impl ScopeId {
    /// Creates a validated scope identifier from a raw platform value.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(validated_id("ScopeId", value.into())?))
    }

    /// Returns the underlying identifier value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ScopeId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a platform account that performs requests or actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(String);

impl ActorId {
    /// Creates a validated actor identifier from a raw platform value.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(validated_id("ActorId", value.into())?))
    }

    /// Returns the underlying identifier value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ActorId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of the resource a change event or audit entry refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(String);

impl TargetId {
    /// Creates a validated target identifier from a raw platform value.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(validated_id("TargetId", value.into())?))
    }

    /// Returns the underlying identifier value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TargetId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

fn validated_id(type_name: &str, value: String) -> AppResult<String> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "{type_name} must not be empty or whitespace"
        )));
    }

    Ok(value)
}
