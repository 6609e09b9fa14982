//! Liveness routes.
//!
//! They take no state and touch nothing else, so they stay reachable whatever
//! happens to configuration, the database or route registration.

use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use rollcall_derive::{api_handler, api_model};
use rollcall_domain::constants::{HEALTHY_MESSAGE, SYSTEM_TAG};
use utoipa::OpenApi;

/// Paths served by this module.
pub const ROUTES: [&str; 2] = ["/", "/healthz"];

#[api_model]
/// Health check response
pub struct HealthResponse {
    /// Always `Healthy`
    pub message: String,
}

fn healthy() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-store")],
        Json(HealthResponse { message: HEALTHY_MESSAGE.to_owned() }),
    )
}

#[api_handler(
    get,
    path = "/",
    responses((status = OK, description = "Service is alive", body = HealthResponse)),
    tag = SYSTEM_TAG,
)]
pub async fn root() -> impl IntoResponse {
    healthy()
}

#[api_handler(
    get,
    path = "/healthz",
    responses((status = OK, description = "Service is ready to accept requests", body = HealthResponse)),
    tag = SYSTEM_TAG,
)]
pub async fn healthz() -> impl IntoResponse {
    healthy()
}

#[derive(OpenApi)]
#[openapi(paths(root, healthz), components(schemas(HealthResponse)))]
struct HealthDoc;

/// Stateless router serving [`ROUTES`]; merge it into any application router.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(root)).route("/healthz", get(healthz))
}

/// Documentation of the health routes.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    HealthDoc::openapi()
}
