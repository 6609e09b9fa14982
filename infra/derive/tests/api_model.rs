use rollcall_derive::api_model;
use serde_json::json;

#[api_model]
pub struct MarkRequest {
    pub class_id: String,
    pub user_id: String,
}

#[api_model(rename_all = "camelCase", deny_unknown_fields = false)]
pub struct Relaxed {
    pub display_name: String,
}

#[test]
fn uses_snake_case_by_default() {
    let value = serde_json::to_value(MarkRequest {
        class_id: "c1".to_owned(),
        user_id: "u1".to_owned(),
    })
    .unwrap();

    assert_eq!(value, json!({ "class_id": "c1", "user_id": "u1" }));
}

#[test]
fn rejects_unknown_fields_by_default() {
    let parsed = serde_json::from_value::<MarkRequest>(
        json!({ "class_id": "c1", "user_id": "u1", "extra": true }),
    );
    assert!(parsed.is_err());
}

#[test]
fn honours_overrides() {
    let parsed: Relaxed =
        serde_json::from_value(json!({ "displayName": "Ada", "ignored": 1 })).unwrap();
    assert_eq!(parsed.display_name, "Ada");
}

#[test]
fn derives_openapi_schema() {
    use utoipa::ToSchema;
    assert_eq!(MarkRequest::name(), "MarkRequest");
}
