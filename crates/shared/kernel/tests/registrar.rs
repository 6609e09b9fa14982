use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use axum::routing::get;
use rollcall_kernel::server::health;
use rollcall_kernel::server::registrar::{
    Mechanism, RegistrarError, RegistrationOutcome, RegistrationState, RouteDef, RouteGroup,
    RouteRegistrar,
};
use tower::ServiceExt;
use utoipa::openapi::{InfoBuilder, OpenApi, OpenApiBuilder};
use utoipa_axum::routes;

#[utoipa::path(get, path = "/widgets", responses((status = OK, description = "All widgets")))]
async fn list_widgets() -> &'static str {
    "widgets"
}

#[utoipa::path(post, path = "/widgets", responses((status = CREATED, description = "Created")))]
async fn create_widget() -> StatusCode {
    StatusCode::CREATED
}

async fn legacy_gadgets() -> &'static str {
    "gadgets"
}

fn base_doc() -> OpenApi {
    OpenApiBuilder::new().info(InfoBuilder::new().title("test").version("1").build()).build()
}

fn registrar() -> RouteRegistrar<()> {
    let mut registrar = RouteRegistrar::new(base_doc());
    for path in health::ROUTES {
        registrar.reserve(Method::GET, path);
    }
    registrar
}

async fn call(app: &Router, method: Method, path: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().method(method).uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn documented_group_is_registered_structurally() {
    let mut registrar = registrar();
    let state = registrar.register(
        RouteGroup::new("widgets")
            .route(RouteDef::documented(Method::GET, "/widgets", routes!(list_widgets)))
            .route(RouteDef::documented(Method::POST, "/widgets", routes!(create_widget))),
    );
    assert_eq!(state, RegistrationState::StructuredOk);

    let registered = registrar.finish();
    let item = &registered.openapi.paths.paths["/widgets"];
    assert!(item.get.is_some() && item.post.is_some());

    let app = health::router().merge(registered.router);
    assert_eq!(call(&app, Method::GET, "/widgets").await, (StatusCode::OK, "widgets".to_owned()));
    assert_eq!(call(&app, Method::POST, "/widgets").await.0, StatusCode::CREATED);

    let group = registered.report.get("widgets").unwrap();
    assert_eq!(
        group.transitions,
        [RegistrationState::Unattempted, RegistrationState::StructuredAttempt, RegistrationState::StructuredOk]
    );
}

#[tokio::test]
async fn incompatible_group_falls_back_and_stays_reachable() {
    let mut registrar = registrar();
    registrar.register(
        RouteGroup::new("widgets")
            .route(RouteDef::documented(Method::GET, "/widgets", routes!(list_widgets))),
    );
    // Documented under another path: structurally incompatible.
    let state = registrar.register(
        RouteGroup::new("gadgets")
            .route(RouteDef::documented(Method::GET, "/gadgets", routes!(list_widgets)))
            .route(RouteDef::direct(Method::GET, "/gadgets/legacy", get(legacy_gadgets))),
    );
    assert_eq!(state, RegistrationState::FallbackOk);

    let registered = registrar.finish();
    assert!(!registered.openapi.paths.paths.contains_key("/gadgets"));
    assert!(registered.openapi.paths.paths.contains_key("/widgets"));

    let gadgets = registered.report.get("gadgets").unwrap();
    assert!(matches!(gadgets.outcomes[0], RegistrationOutcome::Incompatible(_)));
    assert!(matches!(gadgets.outcomes[1], RegistrationOutcome::Registered(Mechanism::Fallback)));
    assert_eq!(
        gadgets.transitions,
        [
            RegistrationState::Unattempted,
            RegistrationState::StructuredAttempt,
            RegistrationState::FallbackAttempt,
            RegistrationState::FallbackOk,
        ]
    );

    let app = health::router().merge(registered.router);
    assert_eq!(call(&app, Method::GET, "/gadgets").await.0, StatusCode::OK);
    assert_eq!(call(&app, Method::GET, "/gadgets/legacy").await, (StatusCode::OK, "gadgets".to_owned()));
    assert_eq!(call(&app, Method::GET, "/widgets").await.0, StatusCode::OK);
    assert_eq!(call(&app, Method::GET, "/healthz").await.0, StatusCode::OK);
}

#[tokio::test]
async fn conflicting_group_fails_alone() {
    let mut registrar = registrar();
    let state = registrar.register(
        RouteGroup::new("shadow")
            .route(RouteDef::direct(Method::GET, "/shadow", get(legacy_gadgets)))
            .route(RouteDef::direct(Method::GET, "/healthz", get(legacy_gadgets))),
    );
    assert_eq!(state, RegistrationState::RegistrationFailed);

    let state = registrar.register(
        RouteGroup::new("widgets")
            .route(RouteDef::documented(Method::GET, "/widgets", routes!(list_widgets))),
    );
    assert_eq!(state, RegistrationState::StructuredOk);

    let registered = registrar.finish();
    let shadow = registered.report.get("shadow").unwrap();
    assert!(matches!(shadow.outcomes.as_slice(), [RegistrationOutcome::Fatal(RegistrarError::Conflict { .. })]));
    assert_eq!(registered.report.count(RegistrationState::RegistrationFailed), 1);

    let app = health::router().merge(registered.router);
    assert_eq!(call(&app, Method::GET, "/shadow").await.0, StatusCode::NOT_FOUND);
    assert_eq!(call(&app, Method::GET, "/healthz").await.1, r#"{"message":"Healthy"}"#);
    assert_eq!(call(&app, Method::GET, "/widgets").await.0, StatusCode::OK);
}

#[test]
fn invalid_paths_and_overlaps_are_fatal() {
    let mut registrar = registrar();

    let state = registrar.register(
        RouteGroup::new("legacy-syntax")
            .route(RouteDef::direct(Method::GET, "/items/:id", get(legacy_gadgets))),
    );
    assert_eq!(state, RegistrationState::RegistrationFailed);

    registrar.register(
        RouteGroup::new("items").route(RouteDef::direct(Method::GET, "/items/{id}", get(legacy_gadgets))),
    );
    let state = registrar.register(
        RouteGroup::new("items-again")
            .route(RouteDef::direct(Method::DELETE, "/items/{item_id}", get(legacy_gadgets))),
    );
    assert_eq!(state, RegistrationState::RegistrationFailed);

    let state = registrar.register(
        RouteGroup::new("twice")
            .route(RouteDef::direct(Method::GET, "/twice", get(legacy_gadgets)))
            .route(RouteDef::direct(Method::GET, "/twice", get(legacy_gadgets))),
    );
    assert_eq!(state, RegistrationState::RegistrationFailed);

    assert_eq!(registrar.report().state_of("items"), RegistrationState::FallbackOk);
    assert_eq!(registrar.report().state_of("unknown"), RegistrationState::Unattempted);
}
