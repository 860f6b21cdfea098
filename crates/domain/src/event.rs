use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attestra_core::{AppError, ScopeId, TargetId};

/// Stable kinds of platform state changes the correlation layer handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A channel was created in the scope.
    ChannelCreated,
    /// A channel's settings changed.
    ChannelUpdated,
    /// A channel was removed.
    ChannelDeleted,
    /// A role was created in the scope.
    RoleCreated,
    /// A role's settings or permissions changed.
    RoleUpdated,
    /// A role was removed.
    RoleDeleted,
    /// A member was removed from the scope.
    MemberKicked,
    /// A member was banned from the scope.
    MemberBanned,
    /// A member's ban was lifted.
    MemberUnbanned,
    /// A member's roles or settings changed.
    MemberUpdated,
    /// A thread was created.
    ThreadCreated,
    /// A thread's settings changed.
    ThreadUpdated,
    /// A thread was removed.
    ThreadDeleted,
}

impl ChangeKind {
    /// Returns a stable storage value for this change kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChannelCreated => "channel.created",
            Self::ChannelUpdated => "channel.updated",
            Self::ChannelDeleted => "channel.deleted",
            Self::RoleCreated => "role.created",
            Self::RoleUpdated => "role.updated",
            Self::RoleDeleted => "role.deleted",
            Self::MemberKicked => "member.kicked",
            Self::MemberBanned => "member.banned",
            Self::MemberUnbanned => "member.unbanned",
            Self::MemberUpdated => "member.updated",
            Self::ThreadCreated => "thread.created",
            Self::ThreadUpdated => "thread.updated",
            Self::ThreadDeleted => "thread.deleted",
        }
    }
}

impl FromStr for ChangeKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "channel.created" => Ok(Self::ChannelCreated),
            "channel.updated" => Ok(Self::ChannelUpdated),
            "channel.deleted" => Ok(Self::ChannelDeleted),
            "role.created" => Ok(Self::RoleCreated),
            "role.updated" => Ok(Self::RoleUpdated),
            "role.deleted" => Ok(Self::RoleDeleted),
            "member.kicked" => Ok(Self::MemberKicked),
            "member.banned" => Ok(Self::MemberBanned),
            "member.unbanned" => Ok(Self::MemberUnbanned),
            "member.updated" => Ok(Self::MemberUpdated),
            "thread.created" => Ok(Self::ThreadCreated),
            "thread.updated" => Ok(Self::ThreadUpdated),
            "thread.deleted" => Ok(Self::ThreadDeleted),
            _ => Err(AppError::Validation(format!(
                "unknown change kind value '{value}'"
            ))),
        }
    }
}

/// A state-change notification delivered by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Scope the change happened in.
    pub scope: ScopeId,
    /// Kind of change.
    pub kind: ChangeKind,
    /// Changed resource, when the platform's view of the event carries one.
    pub target_id: Option<TargetId>,
    /// When the notification was observed.
    pub occurred_at: DateTime<Utc>,
}
