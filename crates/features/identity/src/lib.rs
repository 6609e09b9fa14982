//! Identity slice.
//!
//! Email-based login that upserts the user and returns a signed token, profile
//! lookup by email, and two token-only routes (`/auth/me`, `/auth/admin/ping`)
//! that never touch the database.

mod error;
mod handlers;
mod model;
mod repository;

pub use error::{IdentityError, IdentityErrorExt};
pub use model::{LoginRequest, LoginResponse, MeResponse, MessageResponse, ProfileQuery, UserResponse};

use axum::http::Method;
use rollcall_kernel::server::ApiState;
use rollcall_kernel::server::registrar::{RouteDef, RouteGroup};
use utoipa_axum::routes;

pub const GROUP: &str = "identity";

/// Routes of the identity slice.
#[must_use]
pub fn routes() -> RouteGroup<ApiState> {
    RouteGroup::new(GROUP)
        .route(RouteDef::documented(Method::POST, "/auth/login", routes!(handlers::login)))
        .route(RouteDef::documented(Method::GET, "/auth/profile", routes!(handlers::profile)))
        .route(RouteDef::documented(Method::GET, "/auth/me", routes!(handlers::me)))
        .route(RouteDef::documented(Method::GET, "/auth/admin/ping", routes!(handlers::admin_ping)))
}
