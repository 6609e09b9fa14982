use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use futures_util::StreamExt;
use rollcall_domain::auth::Role;
use rollcall_domain::config::{AppConfig, AppConfigInner, DatabaseConfig};
use rollcall_domain::events::LiveEvent;
use rollcall_domain::records::Membership;
use rollcall_kernel::server::ApiState;
use rollcall_kernel::server::registrar::{RegistrationState, RouteRegistrar};
use serde_json::{Value, json};
use tower::ServiceExt;
use utoipa::openapi::OpenApiBuilder;

fn build(with_db: bool) -> (Router, ApiState) {
    let mut inner = AppConfigInner::default();
    inner.security.secret = Some("test-secret".to_owned());
    inner.database = with_db.then(|| {
        let mut db = DatabaseConfig::new("mem://");
        db.probe_timeout = Duration::from_secs(10);
        db
    });
    let state = ApiState::from_config(AppConfig::new(inner));

    let mut registrar = RouteRegistrar::new(OpenApiBuilder::new().build());
    assert_eq!(registrar.register(rollcall_attendance::routes()), RegistrationState::StructuredOk);
    (registrar.finish().router.with_state(state.clone()), state)
}

fn token(state: &ApiState, role: Role) -> String {
    state.issuer.issue("someone@example.com", role).unwrap().token
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn mark(app: &Router, token: &str, user_id: &str, status: &str) -> Value {
    let body = json!({ "class_id": "c1", "user_id": user_id, "status": status });
    let (code, marked) = send(app, Method::POST, "/attendance", Some(token), Some(body)).await;
    assert_eq!(code, StatusCode::CREATED);
    marked
}

#[tokio::test]
async fn marks_are_listed_newest_first_with_names() {
    let (app, state) = build(true);
    let teacher = token(&state, Role::Teacher);

    let db = state.gate.acquire().await.unwrap();
    db.query("CREATE user:u1 SET email = 'ada@example.com', name = 'Ada', role = 'student'")
        .await
        .unwrap()
        .check()
        .unwrap();

    let first = mark(&app, &teacher, "u1", "present").await;
    assert_eq!(first["event"]["user_name"], "Ada");
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = mark(&app, &teacher, "ghost", "late").await;
    assert!(second["event"].get("user_name").is_none());

    let (status, listed) = send(&app, Method::GET, "/attendance?class_id=c1", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::OK);
    let events = listed["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["id"], second["event"]["id"]);
    assert_eq!(events[1]["user_name"], "Ada");
    assert_eq!(events[1]["status"], "present");

    let (_, page) = send(&app, Method::GET, "/attendance?class_id=c1&limit=0", Some(&teacher), None).await;
    assert_eq!(page["events"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn summary_counts_every_status() {
    let (app, state) = build(true);
    let teacher = token(&state, Role::Teacher);
    for status in ["present", "present", "absent"] {
        mark(&app, &teacher, "u1", status).await;
    }

    let (status, body) = send(&app, Method::GET, "/attendance/summary?user_id=u1", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user_id": "u1", "summary": { "absent": 1, "late": 0, "present": 2 } }));
}

#[tokio::test]
async fn validation_and_roles() {
    let (app, state) = build(true);
    let teacher = token(&state, Role::Teacher);
    let student = token(&state, Role::Student);

    let body = json!({ "class_id": "c1", "user_id": "u1", "status": "present" });
    assert_eq!(send(&app, Method::POST, "/attendance", Some(&student), Some(body)).await.0, StatusCode::FORBIDDEN);

    let body = json!({ "class_id": "c1", "user_id": "u1", "status": "sleeping" });
    assert_eq!(send(&app, Method::POST, "/attendance", Some(&teacher), Some(body)).await.0, StatusCode::BAD_REQUEST);

    assert_eq!(send(&app, Method::GET, "/attendance", Some(&teacher), None).await.0, StatusCode::BAD_REQUEST);
    assert_eq!(
        send(&app, Method::GET, "/attendance?class_id=c1&limit=many", Some(&teacher), None).await.0,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(send(&app, Method::GET, "/attendance/summary", Some(&teacher), None).await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn token_without_database_is_unavailable() {
    let (app, state) = build(false);
    let teacher = token(&state, Role::Teacher);

    assert_eq!(send(&app, Method::GET, "/attendance?class_id=c1", None, None).await.0, StatusCode::UNAUTHORIZED);
    let (status, body) = send(&app, Method::GET, "/attendance?class_id=c1", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["reason"], "not-configured");
}

#[tokio::test]
async fn stream_delivers_live_events() {
    let (app, state) = build(false);

    let response = app.oneshot(Request::get("/attendance/stream").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/event-stream"));

    state.events.publish(LiveEvent::ClassMemberAdded(Membership {
        class_id: "c1".to_owned(),
        user_id: "u1".to_owned(),
    }));

    let mut body = response.into_body().into_data_stream();
    let frame = tokio::time::timeout(Duration::from_secs(5), body.next()).await.unwrap().unwrap().unwrap();
    let frame = String::from_utf8(frame.to_vec()).unwrap();

    assert!(frame.contains("event: class_member_added"), "{frame}");
    assert!(frame.contains(r#""user_id":"u1""#), "{frame}");
}
