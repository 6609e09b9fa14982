use rollcall_derive::api_model;
use rollcall_domain::auth::{Claims, Role};
use rollcall_domain::records::User;

#[api_model]
pub struct LoginRequest {
    /// Unique email used as the login.
    pub email: String,
    /// Display name.
    pub name: String,
    /// `teacher` or `student`.
    pub role: Role,
}

#[api_model]
pub struct LoginResponse {
    pub user: User,
    /// HS256 bearer token.
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

#[api_model]
pub struct UserResponse {
    pub user: User,
}

#[api_model(deny_unknown_fields = false)]
#[derive(utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProfileQuery {
    /// Email of the user to look up.
    pub email: Option<String>,
}

#[api_model]
pub struct MeResponse {
    pub email: String,
    /// `null` when the token carries no role.
    pub role: Option<Role>,
    /// The full verified payload, including claims this service does not use.
    pub claims: Claims,
}

#[api_model]
pub struct MessageResponse {
    pub message: String,
}
