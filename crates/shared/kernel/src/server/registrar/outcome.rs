use std::borrow::Cow;
use std::fmt;

use axum::http::Method;

#[rollcall_derive::service_error]
pub enum RegistrarError {
    /// A path the router would reject.
    #[error("Invalid route path{}: {message}", format_context(.context))]
    InvalidPath { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// A route that overlaps one already claimed.
    #[error("Route conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// How a group's routes ended up on the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    /// Through `OpenApiRouter`, documentation included.
    Structured,
    /// Directly on the router, undocumented.
    Fallback,
}

/// Result of one registration attempt.
#[derive(Debug)]
pub enum RegistrationOutcome {
    Registered(Mechanism),
    /// The routes do not fit the structured mechanism; the fallback applies.
    Incompatible(Cow<'static, str>),
    /// The routes cannot be registered at all.
    Fatal(RegistrarError),
}

/// Registration progress of one route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationState {
    #[default]
    Unattempted,
    StructuredAttempt,
    StructuredOk,
    FallbackAttempt,
    FallbackOk,
    RegistrationFailed,
}

impl RegistrationState {
    /// Whether the group's routes are being served.
    #[must_use]
    pub const fn is_registered(self) -> bool {
        matches!(self, Self::StructuredOk | Self::FallbackOk)
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unattempted => "unattempted",
            Self::StructuredAttempt => "structured-attempt",
            Self::StructuredOk => "structured-ok",
            Self::FallbackAttempt => "fallback-attempt",
            Self::FallbackOk => "fallback-ok",
            Self::RegistrationFailed => "registration-failed",
        };
        f.write_str(name)
    }
}

/// What happened to one group.
#[derive(Debug)]
pub struct GroupRegistration {
    pub group: Cow<'static, str>,
    pub state: RegistrationState,
    /// Every state the group passed through, in order.
    pub transitions: Vec<RegistrationState>,
    pub outcomes: Vec<RegistrationOutcome>,
    pub routes: Vec<(Method, String)>,
}

/// Per-group results of one registrar run.
#[derive(Debug, Default)]
pub struct RegistrationReport {
    pub groups: Vec<GroupRegistration>,
}

impl RegistrationReport {
    #[must_use]
    pub fn get(&self, group: &str) -> Option<&GroupRegistration> {
        self.groups.iter().find(|g| g.group == group)
    }

    #[must_use]
    pub fn state_of(&self, group: &str) -> RegistrationState {
        self.get(group).map_or(RegistrationState::Unattempted, |g| g.state)
    }

    /// Number of groups that ended in `state`.
    #[must_use]
    pub fn count(&self, state: RegistrationState) -> usize {
        self.groups.iter().filter(|g| g.state == state).count()
    }
}
