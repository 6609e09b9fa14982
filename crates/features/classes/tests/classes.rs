use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use rollcall_domain::auth::Role;
use rollcall_domain::config::{AppConfig, AppConfigInner, DatabaseConfig};
use rollcall_domain::events::LiveEvent;
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
    assert_eq!(registrar.register(rollcall_classes::routes()), RegistrationState::StructuredOk);
    (registrar.finish().router.with_state(state.clone()), state)
}

fn token(state: &ApiState, role: Role) -> String {
    state.issuer.issue("someone@example.com", role).unwrap().token
}

async fn seed_user(state: &ApiState, key: &str, name: &str) {
    let db = state.gate.acquire().await.unwrap();
    db.query("CREATE type::thing('user', $key) SET email = $email, name = $name, role = 'student'")
        .bind(("key", key.to_owned()))
        .bind(("email", format!("{key}@example.com")))
        .bind(("name", name.to_owned()))
        .await
        .unwrap()
        .check()
        .unwrap();
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

#[tokio::test]
async fn teacher_creates_and_lists_classes() {
    let (app, state) = build(true);
    let teacher = token(&state, Role::Teacher);
    let mut events = state.events.subscribe();

    let (status, first) =
        send(&app, Method::POST, "/classes", Some(&teacher), Some(json!({ "name": "Algebra", "teacher_id": "t1" })))
            .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["class"]["name"], "Algebra");
    assert_eq!(first["class"]["teacher_id"], "t1");
    assert!(first["class"]["created_at"].as_str().unwrap().ends_with('Z'));

    match events.next().await.as_deref() {
        Some(LiveEvent::ClassCreated(class)) => assert_eq!(class.name, "Algebra"),
        other => panic!("unexpected event: {other:?}"),
    }

    tokio::time::sleep(Duration::from_millis(5)).await;
    let body = json!({ "name": "Biology", "teacher_id": "user:t1" });
    assert_eq!(send(&app, Method::POST, "/classes", Some(&teacher), Some(body)).await.0, StatusCode::CREATED);

    let (status, listed) = send(&app, Method::GET, "/classes?teacher_id=t1", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = listed["classes"].as_array().unwrap().iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Biology", "Algebra"]);

    let (_, other) = send(&app, Method::GET, "/classes?teacher_id=t2", Some(&teacher), None).await;
    assert_eq!(other, json!({ "classes": [] }));
}

#[tokio::test]
async fn members_are_idempotent_and_sorted_by_name() {
    let (app, state) = build(true);
    let teacher = token(&state, Role::Teacher);
    seed_user(&state, "u1", "Zoe").await;
    seed_user(&state, "u2", "Ada").await;

    for user_id in ["u1", "u2", "u1"] {
        let body = json!({ "class_id": "c1", "user_id": user_id });
        let (status, added) = send(&app, Method::POST, "/classes/members", Some(&teacher), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(added["membership"], json!({ "class_id": "c1", "user_id": user_id }));
    }

    let (status, listed) = send(&app, Method::GET, "/classes/members?class_id=c1", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::OK);
    let members = listed["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["name"], "Ada");
    assert_eq!(members[0]["user_id"], "u2");
    assert_eq!(members[1]["name"], "Zoe");
}

#[tokio::test]
async fn writes_require_teacher_or_admin() {
    let (app, state) = build(true);
    let student = token(&state, Role::Student);
    let admin = token(&state, Role::Admin);

    let body = json!({ "name": "Algebra", "teacher_id": "t1" });
    assert_eq!(send(&app, Method::POST, "/classes", Some(&student), Some(body.clone())).await.0, StatusCode::FORBIDDEN);
    assert_eq!(send(&app, Method::POST, "/classes", None, Some(body.clone())).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(send(&app, Method::POST, "/classes", Some(&admin), Some(body)).await.0, StatusCode::CREATED);

    let member = json!({ "class_id": "c1", "user_id": "u1" });
    assert_eq!(send(&app, Method::POST, "/classes/members", Some(&student), Some(member)).await.0, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn bad_requests() {
    let (app, state) = build(true);
    let teacher = token(&state, Role::Teacher);

    let (status, body) = send(&app, Method::GET, "/classes", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "teacher_id is required");

    assert_eq!(send(&app, Method::GET, "/classes/members", Some(&teacher), None).await.0, StatusCode::BAD_REQUEST);
    assert_eq!(
        send(&app, Method::GET, "/classes/members?class_id=user:c1", Some(&teacher), None).await.0,
        StatusCode::BAD_REQUEST
    );

    for body in [
        json!({ "name": "  ", "teacher_id": "t1" }),
        json!({ "name": "Algebra", "teacher_id": "t 1" }),
        json!({ "name": "Algebra" }),
    ] {
        assert_eq!(send(&app, Method::POST, "/classes", Some(&teacher), Some(body)).await.0, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn database_unavailable_after_auth() {
    let (app, state) = build(false);
    let teacher = token(&state, Role::Teacher);

    assert_eq!(send(&app, Method::GET, "/classes?teacher_id=t1", None, None).await.0, StatusCode::UNAUTHORIZED);
    let (status, body) = send(&app, Method::GET, "/classes?teacher_id=t1", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["reason"], "not-configured");
}
