//! Attendance slice.
//!
//! Marks are append-only events (`present`, `absent`, `late`) recorded by
//! teachers and admins. Every mark is pushed to live subscribers of
//! `/attendance/stream` together with the other change notifications.

mod error;
mod handlers;
mod model;
mod repository;
mod stream;

pub use error::{AttendanceError, AttendanceErrorExt};
pub use model::{AttendanceQuery, EventResponse, EventsResponse, MarkRequest, SummaryQuery, SummaryResponse};

use axum::http::Method;
use rollcall_kernel::server::ApiState;
use rollcall_kernel::server::registrar::{RouteDef, RouteGroup};
use utoipa_axum::routes;

pub const GROUP: &str = "attendance";

#[must_use]
pub fn routes() -> RouteGroup<ApiState> {
    RouteGroup::new(GROUP)
        .route(RouteDef::documented(Method::GET, "/attendance", routes!(handlers::list)))
        .route(RouteDef::documented(Method::POST, "/attendance", routes!(handlers::mark)))
        .route(RouteDef::documented(Method::GET, "/attendance/summary", routes!(handlers::summary)))
        .route(RouteDef::documented(Method::GET, "/attendance/stream", routes!(stream::live)))
}
