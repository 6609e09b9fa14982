use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use rollcall_derive::api_handler;
use rollcall_domain::auth::Role;
use rollcall_domain::constants::CLASSES_TAG;
use rollcall_domain::events::LiveEvent;
use rollcall_domain::records::{Class, Membership};
use rollcall_kernel::events::EventHub;
use rollcall_kernel::safe_nanoid;
use rollcall_kernel::security::ResourceGuard;
use rollcall_kernel::server::{ApiError, ApiJson, ApiQuery, AuthUser, Db, ErrorResponse};
use tracing::info;

use crate::error::ClassesError;
use crate::model::{
    AddMemberRequest, ClassResponse, ClassesQuery, ClassesResponse, CreateClassRequest, MembersQuery,
    MembersResponse, MembershipResponse,
};
use crate::repository;

const WRITERS: &[Role] = &[Role::Teacher, Role::Admin];

/// List the classes taught by a teacher, newest first.
#[api_handler(
    get,
    path = "/classes",
    params(ClassesQuery),
    responses(
        (status = OK, description = "Classes of the teacher", body = ClassesResponse),
        (status = BAD_REQUEST, description = "teacher_id missing or malformed", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Database unavailable", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = CLASSES_TAG,
)]
pub(crate) async fn list_classes(
    _user: AuthUser,
    Db(db): Db,
    ApiQuery(query): ApiQuery<ClassesQuery>,
) -> Result<Json<ClassesResponse>, ApiError> {
    let teacher_id = required(query.teacher_id, "teacher_id is required")?;
    let teacher_id = ResourceGuard::record_key(teacher_id, "user")?;

    let classes = repository::list_for_teacher(&db, &teacher_id).await.map_err(ClassesError::from)?;
    Ok(Json(ClassesResponse { classes }))
}

/// Create a class owned by a teacher.
#[api_handler(
    post,
    path = "/classes",
    request_body = CreateClassRequest,
    responses(
        (status = CREATED, description = "Class created", body = ClassResponse),
        (status = BAD_REQUEST, description = "Invalid payload", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
        (status = FORBIDDEN, description = "Caller is neither teacher nor admin", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Database unavailable", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = CLASSES_TAG,
)]
pub(crate) async fn create_class(
    user: AuthUser,
    State(events): State<EventHub<LiveEvent>>,
    Db(db): Db,
    ApiJson(request): ApiJson<CreateClassRequest>,
) -> Result<(StatusCode, Json<ClassResponse>), ApiError> {
    user.require_any(WRITERS)?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ClassesError::Validation { message: "name is required".into(), context: None }.into());
    }

    let class = Class {
        id: safe_nanoid!(),
        name: name.to_owned(),
        teacher_id: ResourceGuard::record_key(&request.teacher_id, "user")?,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    repository::create(&db, &class).await.map_err(ClassesError::from)?;

    info!(class = %class.id, teacher = %class.teacher_id, by = %user.0.sub, "Class created");
    events.publish(LiveEvent::ClassCreated(class.clone()));

    Ok((StatusCode::CREATED, Json(ClassResponse { class })))
}

/// List the members of a class, ordered by name.
#[api_handler(
    get,
    path = "/classes/members",
    params(MembersQuery),
    responses(
        (status = OK, description = "Members of the class", body = MembersResponse),
        (status = BAD_REQUEST, description = "class_id missing or malformed", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Database unavailable", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = CLASSES_TAG,
)]
pub(crate) async fn list_members(
    _user: AuthUser,
    Db(db): Db,
    ApiQuery(query): ApiQuery<MembersQuery>,
) -> Result<Json<MembersResponse>, ApiError> {
    let class_id = required(query.class_id, "class_id is required")?;
    let class_id = ResourceGuard::record_key(class_id, "class")?;

    let members = repository::members(&db, &class_id).await.map_err(ClassesError::from)?;
    Ok(Json(MembersResponse { members }))
}

/// Add a user to a class. Adding an existing member is a no-op.
#[api_handler(
    post,
    path = "/classes/members",
    request_body = AddMemberRequest,
    responses(
        (status = CREATED, description = "Membership recorded", body = MembershipResponse),
        (status = BAD_REQUEST, description = "Invalid payload", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
        (status = FORBIDDEN, description = "Caller is neither teacher nor admin", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Database unavailable", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = CLASSES_TAG,
)]
pub(crate) async fn add_member(
    user: AuthUser,
    State(events): State<EventHub<LiveEvent>>,
    Db(db): Db,
    ApiJson(request): ApiJson<AddMemberRequest>,
) -> Result<(StatusCode, Json<MembershipResponse>), ApiError> {
    user.require_any(WRITERS)?;

    let membership = Membership {
        class_id: ResourceGuard::record_key(&request.class_id, "class")?,
        user_id: ResourceGuard::record_key(&request.user_id, "user")?,
    };
    repository::add_member(&db, &membership).await.map_err(ClassesError::from)?;

    info!(class = %membership.class_id, member = %membership.user_id, "Class member added");
    events.publish(LiveEvent::ClassMemberAdded(membership.clone()));

    Ok((StatusCode::CREATED, Json(MembershipResponse { membership })))
}

fn required(value: Option<String>, message: &'static str) -> Result<String, ClassesError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(ClassesError::Validation { message: message.into(), context: None })
}
