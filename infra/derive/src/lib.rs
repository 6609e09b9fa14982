#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Attribute macros shared by the service crates: typed error enums with context
//! propagation, API data models, and documented Axum handlers.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Defines an API data model (request/response DTO).
///
/// # Injected Behaviors
///
/// * **Derives**: `Debug`, `Serialize`, `Deserialize` and `utoipa::ToSchema` when missing.
/// * **Serde Policy**:
///     * `rename_all = "snake_case"` by default (can be overridden).
///     * `deny_unknown_fields` by default (can be disabled).
///
/// # Example
///
/// ```rust,ignore
/// use rollcall_derive::api_model;
///
/// #[api_model(deny_unknown_fields = false)]
/// pub struct ClassView {
///     pub id: String,
///     pub teacher_id: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::api::expand_api_model(attr.into(), input).into()
}

/// Bridges an Axum handler with its `OpenAPI` operation.
///
/// Accepts the regular `utoipa::path` arguments and silences `clippy::unused_async`,
/// which every extractor-only handler would otherwise trigger.
///
/// # Example
///
/// ```rust,ignore
/// #[api_handler(get, path = "/auth/me", responses((status = OK, body = MeResponse)), tag = "Identity")]
/// pub async fn me(AuthUser(claims): AuthUser) -> Json<MeResponse> { ... }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_api_handler(args.into(), input).into()
}

/// Turns an enum into a service error type.
///
/// # Features
///
/// * Injects `#[derive(Debug, thiserror::Error)]` when missing.
/// * Generates a companion `<Name>Ext` trait adding `.context(...)` to results.
/// * Implements `From<Source>` for every variant carrying a `source` field.
/// * Implements `From<&'static str>` and `From<String>` when an `Internal { message, context }`
///   variant exists.
///
/// Every variant must use named fields; variants with a source must also carry
/// `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// #[service_error]
/// pub enum DatabaseError {
///     #[error("Database error{}: {source}", format_context(.context))]
///     Surreal { source: surrealdb::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn service_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
