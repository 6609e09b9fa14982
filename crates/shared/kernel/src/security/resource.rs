use std::borrow::Cow;

#[rollcall_derive::service_error]
pub enum ResourceGuardError {
    #[error("Resource validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Validation of client-supplied record identifiers.
#[derive(Debug)]
pub struct ResourceGuard;

impl ResourceGuard {
    /// Reduces a client-supplied ID to the bare record key for `expected_table`.
    ///
    /// Accepts `"abc123"` or `"class:abc123"`. An ID that names another table
    /// (`"user:abc123"` where a class was expected) is rejected, as is a key with
    /// characters outside `[A-Za-z0-9_-]`.
    ///
    /// # Errors
    /// [`ResourceGuardError::Validation`] for a table mismatch, an empty key or an unsafe key.
    pub fn record_key<I, T>(id: I, expected_table: T) -> Result<String, ResourceGuardError>
    where
        I: AsRef<str>,
        T: AsRef<str>,
    {
        let id = id.as_ref().trim();
        let expected = expected_table.as_ref();

        let key = match id.split_once(':') {
            Some((table, _)) if table != expected => {
                return Err(ResourceGuardError::Validation {
                    message: format!("expected '{expected}', got '{table}'").into(),
                    context: Some("ID table mismatch".into()),
                });
            },
            Some((_, key)) => key,
            None => id,
        };

        if key.is_empty() {
            return Err(ResourceGuardError::Validation {
                message: format!("{expected} id is required").into(),
                context: None,
            });
        }

        if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(ResourceGuardError::Validation {
                message: format!("'{key}' is not a valid {expected} id").into(),
                context: None,
            });
        }

        Ok(key.to_owned())
    }
}
