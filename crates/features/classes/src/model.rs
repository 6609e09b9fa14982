use rollcall_derive::api_model;
use rollcall_domain::records::{Class, Member, Membership};

#[api_model(deny_unknown_fields = false)]
#[derive(utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClassesQuery {
    /// Teacher whose classes to list.
    pub teacher_id: Option<String>,
}

#[api_model]
pub struct CreateClassRequest {
    pub name: String,
    pub teacher_id: String,
}

#[api_model]
pub struct ClassesResponse {
    pub classes: Vec<Class>,
}

#[api_model]
pub struct ClassResponse {
    pub class: Class,
}

#[api_model(deny_unknown_fields = false)]
#[derive(utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MembersQuery {
    pub class_id: Option<String>,
}

#[api_model]
pub struct AddMemberRequest {
    pub class_id: String,
    pub user_id: String,
}

#[api_model]
pub struct MembersResponse {
    pub members: Vec<Member>,
}

#[api_model]
pub struct MembershipResponse {
    pub membership: Membership,
}
