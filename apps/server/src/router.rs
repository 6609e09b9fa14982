use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use rollcall::domain::constants::{API_TITLE, API_VERSION};
use rollcall::kernel::server::registrar::{RegistrationReport, RouteGroup, RouteRegistrar, validate_path};
use rollcall::kernel::server::{ApiState, health};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::openapi::{ComponentsBuilder, OpenApi as OpenApiDoc};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable};

pub(crate) const BEARER_SCHEME: &str = "bearer_auth";

#[derive(OpenApi)]
#[openapi(info(title = API_TITLE, version = API_VERSION), modifiers(&SecurityAddon))]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut OpenApiDoc) {
        let components = openapi.components.get_or_insert_with(|| ComponentsBuilder::new().build());
        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(Http::builder().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

/// Router and documentation after every group went through the registrar.
#[derive(Debug)]
pub(crate) struct Assembled {
    pub(crate) router: Router<ApiState>,
    pub(crate) openapi: OpenApiDoc,
    pub(crate) report: RegistrationReport,
    /// Where the docs are mounted; `None` when they are not served.
    pub(crate) docs: Option<String>,
}

fn base_document() -> OpenApiDoc {
    let mut doc = ApiDoc::openapi();
    doc.merge(health::openapi());
    doc
}

/// Runs the registrar over `groups`. Health routes are reserved first so no
/// group can shadow them; the docs take whatever prefix is left afterwards.
pub(crate) fn assemble(docs_prefix: &str, groups: Vec<RouteGroup<ApiState>>) -> Assembled {
    let mut registrar = RouteRegistrar::new(base_document());
    for path in health::ROUTES {
        registrar.reserve(Method::GET, path);
    }

    registrar.register_all(groups);
    let docs = docs_mount(&registrar, docs_prefix);
    let registered = registrar.finish();

    Assembled {
        router: health::router().merge(registered.router),
        openapi: registered.openapi,
        report: registered.report,
        docs,
    }
}

/// The complete application: health, feature groups, docs and middleware.
pub(crate) fn init(state: ApiState, groups: Vec<RouteGroup<ApiState>>) -> (Router, RegistrationReport) {
    let server = &state.config.server;
    let docs_prefix = server.docs_prefix.clone();
    let timeout = server.request_timeout;

    let Assembled { router, openapi, report, docs } = assemble(&docs_prefix, groups);
    let mut app = router.with_state(state);

    if let Some(prefix) = docs {
        let document = Arc::new(openapi.clone());
        app = app
            .route(
                &openapi_path(&prefix),
                get(move || {
                    let document = Arc::clone(&document);
                    async move { Json(document.as_ref().clone()) }
                }),
            )
            .merge(Scalar::with_url(prefix, openapi));
    }

    let app = app
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    (app, report)
}

/// Docs are mounted only at a literal path the router accepts and no route claims.
fn docs_mount(registrar: &RouteRegistrar<ApiState>, prefix: &str) -> Option<String> {
    if let Err(err) = validate_path(prefix) {
        warn!(%prefix, error = %err, "Documentation prefix is not a valid path; docs are not served");
        return None;
    }
    if prefix.contains(['{', '}']) {
        warn!(%prefix, "Documentation prefix may not contain parameters; docs are not served");
        return None;
    }

    let document = openapi_path(prefix);
    if registrar.is_claimed(&Method::GET, prefix) || registrar.is_claimed(&Method::GET, &document) {
        warn!(%prefix, "Documentation prefix collides with a served route; docs are not served");
        return None;
    }

    Some(prefix.to_owned())
}

fn openapi_path(prefix: &str) -> String {
    format!("{prefix}/openapi.json")
}
