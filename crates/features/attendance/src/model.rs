use std::collections::BTreeMap;

use rollcall_derive::api_model;
use rollcall_domain::records::{AttendanceEvent, AttendanceStatus};

#[api_model(deny_unknown_fields = false)]
#[derive(utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    pub class_id: Option<String>,
    /// Page size, 1 to 1000 (default 100).
    pub limit: Option<i64>,
}

#[api_model]
pub struct MarkRequest {
    pub class_id: String,
    pub user_id: String,
    pub status: AttendanceStatus,
}

#[api_model]
pub struct EventsResponse {
    /// Newest first.
    pub events: Vec<AttendanceEvent>,
}

#[api_model]
pub struct EventResponse {
    pub event: AttendanceEvent,
}

#[api_model(deny_unknown_fields = false)]
#[derive(utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    pub user_id: Option<String>,
}

#[api_model]
pub struct SummaryResponse {
    pub user_id: String,
    /// Count per status; every status is present.
    pub summary: BTreeMap<String, u64>,
}
