use axum::extract::{FromRef, FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use rollcall_database::Database;
use rollcall_domain::auth::{AuthFailure, Claims, Role};

use super::error::ApiError;
use super::gate::DatabaseGate;
use crate::security::AuthVerifier;

/// JSON body whose rejections answer with an [`ApiError`] body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections answer with an [`ApiError`] body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Claims of a caller holding a valid bearer token.
///
/// Rejects with 401 and the failure reason otherwise.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// # Errors
    /// [`ApiError::Forbidden`] unless the caller's role is one of `roles`. A token without a
    /// role never passes.
    pub fn require_any(&self, roles: &[Role]) -> Result<(), ApiError> {
        match self.0.role {
            Some(role) if roles.contains(&role) => Ok(()),
            Some(role) => Err(ApiError::Forbidden(format!("Role '{role}' may not perform this action").into())),
            None => Err(ApiError::Forbidden("Token carries no role".into())),
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthVerifier: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = AuthVerifier::from_ref(state);
        if !verifier.is_configured() {
            return Err(AuthFailure::ConfigurationError.into());
        }

        let token = bearer_token(parts).ok_or(AuthFailure::MissingToken)?;
        let claims = verifier.verify(token).into_result()?;

        Ok(Self(claims))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Database handle, available only once the [`DatabaseGate`] reports it usable.
///
/// Rejects with 503 otherwise.
#[derive(Debug, Clone)]
pub struct Db(pub Database);

impl<S> FromRequestParts<S> for Db
where
    S: Send + Sync,
    DatabaseGate: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = DatabaseGate::from_ref(state);
        Ok(Self(gate.acquire().await?))
    }
}
