use serde::Serialize;

use crate::records::{AttendanceEvent, Class, Membership};

/// Change notifications pushed to live subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum LiveEvent {
    ClassCreated(Class),
    ClassMemberAdded(Membership),
    AttendanceMarked(AttendanceEvent),
}

impl LiveEvent {
    /// Event name used on the stream.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ClassCreated(_) => "class_created",
            Self::ClassMemberAdded(_) => "class_member_added",
            Self::AttendanceMarked(_) => "attendance_marked",
        }
    }
}
