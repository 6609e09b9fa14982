use std::borrow::Cow;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use rollcall_database::DatabaseError;
use rollcall_derive::api_model;
use rollcall_domain::auth::AuthFailure;
use rollcall_domain::availability::UnavailableReason;
use tracing::{error, warn};

use crate::security::{ResourceGuardError, SecurityError};

/// JSON body of every error response.
#[api_model]
pub struct ErrorResponse {
    pub message: String,
    /// Machine-readable cause, e.g. `expired` or `not-configured`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Errors a handler can answer with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{}", .0.message())]
    Unauthorized(AuthFailure),
    #[error("{0}")]
    Forbidden(Cow<'static, str>),
    #[error("{message}")]
    Unavailable { message: Cow<'static, str>, reason: &'static str },
    #[error("{0}")]
    BadRequest(Cow<'static, str>),
    #[error("{0}")]
    NotFound(Cow<'static, str>),
    #[error("{0}")]
    Internal(Cow<'static, str>),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reason(&self) -> Option<String> {
        match self {
            Self::Unauthorized(failure) => Some(failure.code().to_owned()),
            Self::Unavailable { reason, .. } => Some((*reason).to_owned()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            Self::Internal(detail) => {
                error!(%detail, "Request failed");
                "Internal server error".to_owned()
            },
            other => other.to_string(),
        };

        let body = ErrorResponse { message, reason: self.reason() };
        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

impl From<AuthFailure> for ApiError {
    fn from(failure: AuthFailure) -> Self {
        Self::Unauthorized(failure)
    }
}

impl From<UnavailableReason> for ApiError {
    fn from(reason: UnavailableReason) -> Self {
        let message = match reason {
            UnavailableReason::NotConfigured => "Database is not configured",
            UnavailableReason::ConnectionError => "Database is unavailable",
        };
        Self::Unavailable { message: message.into(), reason: reason.code() }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Connection { .. } => {
                warn!(error = %err, "Database connection lost mid-request");
                UnavailableReason::ConnectionError.into()
            },
            other => Self::Internal(other.to_string().into()),
        }
    }
}

impl From<rollcall_database::surrealdb::Error> for ApiError {
    fn from(err: rollcall_database::surrealdb::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

impl From<SecurityError> for ApiError {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::NotConfigured { .. } => Self::Unavailable {
                message: "Token signing is not configured".into(),
                reason: "auth-not-configured",
            },
            other => Self::Internal(other.to_string().into()),
        }
    }
}

impl From<ResourceGuardError> for ApiError {
    fn from(err: ResourceGuardError) -> Self {
        Self::BadRequest(err.to_string().into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text().into())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value, Option<HeaderValue>) {
        let response = err.into_response();
        let status = response.status();
        let challenge = response.headers().get(header::WWW_AUTHENTICATE).cloned();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap(), challenge)
    }

    #[tokio::test]
    async fn unauthorized_carries_reason_and_challenge() {
        let (status, body, challenge) = body_of(AuthFailure::Expired.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, serde_json::json!({ "message": "Token has expired.", "reason": "expired" }));
        assert_eq!(challenge, Some(HeaderValue::from_static("Bearer")));
    }

    #[tokio::test]
    async fn unavailable_database_is_503() {
        let (status, body, _) = body_of(UnavailableReason::NotConfigured.into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["reason"], "not-configured");
    }

    #[tokio::test]
    async fn internal_details_stay_in_the_logs() {
        let (status, body, _) = body_of(ApiError::Internal("disk on fire".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "message": "Internal server error" }));
    }

    #[test]
    fn missing_signing_key_maps_to_503() {
        let err: ApiError = SecurityError::NotConfigured { context: None }.into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
