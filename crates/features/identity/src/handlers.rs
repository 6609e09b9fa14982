use axum::Json;
use axum::extract::State;
use rollcall_derive::api_handler;
use rollcall_domain::auth::Role;
use rollcall_domain::constants::IDENTITY_TAG;
use rollcall_kernel::security::{SecurityError, TokenIssuer};
use rollcall_kernel::server::{ApiError, ApiJson, ApiQuery, AuthUser, Db, ErrorResponse};
use tracing::info;

use crate::error::IdentityError;
use crate::model::{LoginRequest, LoginResponse, MeResponse, MessageResponse, ProfileQuery, UserResponse};
use crate::repository;

/// Authenticate or create a user by email and issue a bearer token.
#[api_handler(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = OK, description = "User upserted and token issued", body = LoginResponse),
        (status = BAD_REQUEST, description = "Invalid payload", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Database or token signing unavailable", body = ErrorResponse),
    ),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn login(
    State(issuer): State<TokenIssuer>,
    Db(db): Db,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = request.email.trim().to_lowercase();
    let name = request.name.trim();
    validate_login(&email, name, request.role)?;
    if !issuer.is_configured() {
        return Err(SecurityError::NotConfigured { context: None }.into());
    }

    let user = repository::upsert(&db, &email, name, request.role)
        .await
        .map_err(IdentityError::from)?
        .ok_or_else(|| ApiError::Internal("upserted user could not be read back".into()))?;

    let issued = issuer.issue(&user.email, user.role)?;
    info!(user = %user.id, role = %user.role, "User logged in");

    Ok(Json(LoginResponse { user, token: issued.token, expires_in: issued.expires_in }))
}

fn validate_login(email: &str, name: &str, role: Role) -> Result<(), IdentityError> {
    let invalid = |message: &'static str| IdentityError::Validation { message: message.into(), context: None };

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !email.contains(' ') => {},
        _ => return Err(invalid("A valid email is required")),
    }
    if name.is_empty() {
        return Err(invalid("Name is required"));
    }
    if role == Role::Admin {
        return Err(invalid("Role must be one of: teacher, student"));
    }
    Ok(())
}

/// Get a user profile by email.
#[api_handler(
    get,
    path = "/auth/profile",
    params(ProfileQuery),
    responses(
        (status = OK, description = "User found", body = UserResponse),
        (status = BAD_REQUEST, description = "Email missing", body = ErrorResponse),
        (status = NOT_FOUND, description = "No such user", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Database unavailable", body = ErrorResponse),
    ),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn profile(
    Db(db): Db,
    ApiQuery(query): ApiQuery<ProfileQuery>,
) -> Result<Json<UserResponse>, ApiError> {
    let email = query
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email required".into()))?;

    let user = repository::find_by_email(&db, &email)
        .await
        .map_err(IdentityError::from)?
        .ok_or(IdentityError::NotFound { context: None })?;

    Ok(Json(UserResponse { user }))
}

/// Claims of the presented bearer token.
#[api_handler(
    get,
    path = "/auth/me",
    responses(
        (status = OK, description = "Token is valid", body = MeResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn me(AuthUser(claims): AuthUser) -> Json<MeResponse> {
    Json(MeResponse { email: claims.sub.clone(), role: claims.role, claims })
}

/// Admin-only liveness check.
#[api_handler(
    get,
    path = "/auth/admin/ping",
    responses(
        (status = OK, description = "Caller is an admin", body = MessageResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
        (status = FORBIDDEN, description = "Caller is not an admin", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn admin_ping(user: AuthUser) -> Result<Json<MessageResponse>, ApiError> {
    user.require_any(&[Role::Admin])?;
    Ok(Json(MessageResponse { message: "admin pong".to_owned() }))
}
