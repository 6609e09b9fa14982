use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role carried in a token and stored on the user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed token payload. Timestamps are unix seconds.
///
/// Only `sub` and `exp` are required. Claims this service does not know about are kept in
/// `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Claims {
    /// Subject: the user's email.
    pub sub: String,
    /// Absent on foreign tokens; role checks then refuse the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub nbf: i64,
    pub exp: i64,
    #[serde(flatten)]
    #[cfg_attr(feature = "openapi", schema(ignore))]
    pub extra: Map<String, Value>,
}

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum AuthFailure {
    /// No bearer token on the request.
    MissingToken,
    Malformed,
    Expired,
    NotYetValid,
    BadSignature,
    /// No signing secret is configured.
    ConfigurationError,
}

impl AuthFailure {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingToken => "missing-token",
            Self::Malformed => "malformed",
            Self::Expired => "expired",
            Self::NotYetValid => "not-yet-valid",
            Self::BadSignature => "bad-signature",
            Self::ConfigurationError => "configuration-error",
        }
    }

    /// Message suitable for a 401 body.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MissingToken => "Missing bearer token",
            Self::Malformed => "Invalid token",
            Self::Expired => "Token has expired.",
            Self::NotYetValid => "Token is not yet valid",
            Self::BadSignature => "Invalid token signature",
            Self::ConfigurationError => "Authentication is not configured",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of verifying a bearer token. Computed per request, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Valid(Claims),
    Invalid(AuthFailure),
}

impl AuthResult {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Converts into a `Result`, which is what extractors want.
    ///
    /// # Errors
    /// Returns the failure reason for `Invalid`.
    pub fn into_result(self) -> Result<Claims, AuthFailure> {
        match self {
            Self::Valid(claims) => Ok(claims),
            Self::Invalid(reason) => Err(reason),
        }
    }
}
