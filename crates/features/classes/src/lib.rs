//! Classes slice: classes owned by a teacher and their memberships.
//!
//! Writes are limited to teachers and admins and are announced on the live
//! event hub (`class_created`, `class_member_added`).

mod error;
mod handlers;
mod model;
mod repository;

pub use error::{ClassesError, ClassesErrorExt};
pub use model::{
    AddMemberRequest, ClassResponse, ClassesQuery, ClassesResponse, CreateClassRequest, MembersQuery,
    MembersResponse, MembershipResponse,
};

use axum::http::Method;
use rollcall_kernel::server::ApiState;
use rollcall_kernel::server::registrar::{RouteDef, RouteGroup};
use utoipa_axum::routes;

pub const GROUP: &str = "classes";

#[must_use]
pub fn routes() -> RouteGroup<ApiState> {
    RouteGroup::new(GROUP)
        .route(RouteDef::documented(Method::GET, "/classes", routes!(handlers::list_classes)))
        .route(RouteDef::documented(Method::POST, "/classes", routes!(handlers::create_class)))
        .route(RouteDef::documented(Method::GET, "/classes/members", routes!(handlers::list_members)))
        .route(RouteDef::documented(Method::POST, "/classes/members", routes!(handlers::add_member)))
}
