use std::borrow::Cow;

use rollcall_kernel::database::DatabaseError;
use rollcall_kernel::server::ApiError;

/// Attendance error type.
#[rollcall_derive::service_error]
pub enum AttendanceError {
    #[error("{message}")]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Attendance storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },
}

impl From<AttendanceError> for ApiError {
    fn from(err: AttendanceError) -> Self {
        match err {
            AttendanceError::Validation { message, .. } => Self::BadRequest(message),
            AttendanceError::Database { source, .. } => source.into(),
        }
    }
}
