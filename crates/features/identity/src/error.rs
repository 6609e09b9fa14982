use std::borrow::Cow;

use rollcall_kernel::database::DatabaseError;
use rollcall_kernel::server::ApiError;

/// A specialized [`IdentityError`] enum of this crate.
#[rollcall_derive::service_error]
pub enum IdentityError {
    /// The request is well-formed JSON but not an acceptable identity.
    #[error("{message}")]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("User not found{}", format_context(.context))]
    NotFound { context: Option<Cow<'static, str>> },
    #[error("Identity storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Validation { message, .. } => Self::BadRequest(message),
            IdentityError::NotFound { .. } => Self::NotFound("Not found".into()),
            IdentityError::Database { source, .. } => source.into(),
        }
    }
}
