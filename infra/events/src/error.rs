use std::borrow::Cow;

/// Errors raised while setting up an event hub.
#[rollcall_derive::service_error]
pub enum EventHubError {
    /// Capacity must be greater than zero.
    #[error("Invalid capacity{}: {message}", format_context(.context))]
    InvalidCapacity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
