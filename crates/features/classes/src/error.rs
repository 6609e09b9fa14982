use std::borrow::Cow;

use rollcall_kernel::database::DatabaseError;
use rollcall_kernel::server::ApiError;

/// Classes error type.
#[rollcall_derive::service_error]
pub enum ClassesError {
    #[error("{message}")]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Classes storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },
}

impl From<ClassesError> for ApiError {
    fn from(err: ClassesError) -> Self {
        match err {
            ClassesError::Validation { message, .. } => Self::BadRequest(message),
            ClassesError::Database { source, .. } => source.into(),
        }
    }
}
