use std::fmt;

use serde::Serialize;

/// Whether the database can currently serve requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "kebab-case")]
pub enum DatabaseAvailability {
    Available,
    Unavailable(UnavailableReason),
}

impl DatabaseAvailability {
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnavailableReason {
    /// No connection parameters were supplied; nothing was attempted.
    NotConfigured,
    /// Parameters exist but connecting or probing failed or timed out.
    ConnectionError,
}

impl UnavailableReason {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotConfigured => "not-configured",
            Self::ConnectionError => "connection-error",
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
