use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use rollcall_derive::api_handler;
use rollcall_domain::auth::Role;
use rollcall_domain::constants::{ATTENDANCE_TAG, defaults};
use rollcall_domain::events::LiveEvent;
use rollcall_domain::records::{AttendanceEvent, AttendanceStatus};
use rollcall_kernel::events::EventHub;
use rollcall_kernel::safe_nanoid;
use rollcall_kernel::security::ResourceGuard;
use rollcall_kernel::server::{ApiError, ApiJson, ApiQuery, AuthUser, Db, ErrorResponse};
use tracing::info;

use crate::error::AttendanceError;
use crate::model::{AttendanceQuery, EventResponse, EventsResponse, MarkRequest, SummaryQuery, SummaryResponse};
use crate::repository::{self, StatusCount};

/// List the attendance of a class, newest first.
#[api_handler(
    get,
    path = "/attendance",
    params(AttendanceQuery),
    responses(
        (status = OK, description = "Attendance events", body = EventsResponse),
        (status = BAD_REQUEST, description = "class_id missing or malformed", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Database unavailable", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = ATTENDANCE_TAG,
)]
pub(crate) async fn list(
    _user: AuthUser,
    Db(db): Db,
    ApiQuery(query): ApiQuery<AttendanceQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    let class_id = required(query.class_id, "class_id is required")?;
    let class_id = ResourceGuard::record_key(class_id, "class")?;

    let events = repository::list(&db, &class_id, page_size(query.limit)).await.map_err(AttendanceError::from)?;
    Ok(Json(EventsResponse { events }))
}

/// Record an attendance mark.
#[api_handler(
    post,
    path = "/attendance",
    request_body = MarkRequest,
    responses(
        (status = CREATED, description = "Mark recorded", body = EventResponse),
        (status = BAD_REQUEST, description = "Invalid payload", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
        (status = FORBIDDEN, description = "Caller is neither teacher nor admin", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Database unavailable", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = ATTENDANCE_TAG,
)]
pub(crate) async fn mark(
    user: AuthUser,
    State(events): State<EventHub<LiveEvent>>,
    Db(db): Db,
    ApiJson(request): ApiJson<MarkRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    user.require_any(&[Role::Teacher, Role::Admin])?;

    let mut event = AttendanceEvent {
        id: safe_nanoid!(),
        class_id: ResourceGuard::record_key(&request.class_id, "class")?,
        user_id: ResourceGuard::record_key(&request.user_id, "user")?,
        status: request.status,
        ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        user_name: None,
    };
    repository::record(&db, &event).await.map_err(AttendanceError::from)?;

    let mut names = repository::user_names(&db, vec![event.user_id.clone()]).await.map_err(AttendanceError::from)?;
    event.user_name = names.remove(&event.user_id);

    info!(class = %event.class_id, member = %event.user_id, status = %event.status, "Attendance marked");
    events.publish(LiveEvent::AttendanceMarked(event.clone()));

    Ok((StatusCode::CREATED, Json(EventResponse { event })))
}

/// Count a user's attendance marks per status.
#[api_handler(
    get,
    path = "/attendance/summary",
    params(SummaryQuery),
    responses(
        (status = OK, description = "Counts per status", body = SummaryResponse),
        (status = BAD_REQUEST, description = "user_id missing or malformed", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Database unavailable", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = ATTENDANCE_TAG,
)]
pub(crate) async fn summary(
    _user: AuthUser,
    Db(db): Db,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let user_id = required(query.user_id, "user_id is required")?;
    let user_id = ResourceGuard::record_key(user_id, "user")?;

    let counts = repository::status_counts(&db, &user_id).await.map_err(AttendanceError::from)?;
    Ok(Json(SummaryResponse { user_id, summary: tally(counts) }))
}

fn page_size(limit: Option<i64>) -> i64 {
    #[allow(clippy::cast_possible_wrap)]
    let (default, max) = (defaults::ATTENDANCE_PAGE as i64, defaults::ATTENDANCE_PAGE_MAX as i64);
    limit.map_or(default, |limit| limit.clamp(1, max))
}

fn tally(counts: Vec<StatusCount>) -> BTreeMap<String, u64> {
    let mut summary: BTreeMap<String, u64> =
        AttendanceStatus::ALL.iter().map(|status| (status.as_str().to_owned(), 0)).collect();
    for row in counts {
        *summary.entry(row.status.as_str().to_owned()).or_default() += row.count;
    }
    summary
}

fn required(value: Option<String>, message: &'static str) -> Result<String, AttendanceError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(AttendanceError::Validation { message: message.into(), context: None })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(page_size(None), 100);
        assert_eq!(page_size(Some(0)), 1);
        assert_eq!(page_size(Some(-5)), 1);
        assert_eq!(page_size(Some(25)), 25);
        assert_eq!(page_size(Some(5_000)), 1_000);
    }

    #[test]
    fn tally_lists_every_status() {
        let summary = tally(vec![StatusCount { status: AttendanceStatus::Late, count: 2 }]);
        assert_eq!(summary["present"], 0);
        assert_eq!(summary["absent"], 0);
        assert_eq!(summary["late"], 2);
    }
}
