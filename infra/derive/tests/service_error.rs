use std::borrow::Cow;

use rollcall_derive::service_error;

#[service_error]
pub enum StoreError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Missing record{}: {key}", format_context(.context))]
    Missing { key: String, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read_missing() -> Result<(), std::io::Error> {
    Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
}

#[test]
fn compiles_on_valid_enum() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/service_error_pass.rs");
}

#[test]
fn source_errors_convert_with_question_mark() {
    fn load() -> Result<(), StoreError> {
        read_missing()?;
        Ok(())
    }

    let err = load().unwrap_err();
    assert!(matches!(err, StoreError::Io { context: None, .. }));
    assert_eq!(err.to_string(), "IO error: gone");
}

#[test]
fn context_is_attached_to_source_results() {
    let err = read_missing().context("loading roster").unwrap_err();
    assert_eq!(err.to_string(), "IO error (loading roster): gone");
}

#[test]
fn context_overrides_on_own_results() {
    let result: Result<(), StoreError> =
        Err(StoreError::Missing { key: "class:1".to_owned(), context: None });

    let err = result.context("fetching class").unwrap_err();
    assert_eq!(err.to_string(), "Missing record (fetching class): class:1");
}

#[test]
fn strings_become_internal_errors() {
    let from_static: StoreError = "boom".into();
    let from_owned: StoreError = String::from("bang").into();

    assert_eq!(from_static.to_string(), "Internal error: boom");
    assert!(matches!(from_owned, StoreError::Internal { ref message, .. } if message == "bang"));
}
