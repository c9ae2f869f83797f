// HTTP error mapping
use crate::domain::errors::AuthError;
use crate::domain::session::GateState;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// The initial session check has not finished.
    SessionPending,
    /// No session; the operator has to sign in.
    Unauthenticated,
    Auth(AuthError),
}

impl ApiError {
    /// Allow through only when the gate is authenticated.
    pub fn require_session(state: &GateState) -> Result<(), ApiError> {
        match state {
            GateState::Authenticated { .. } => Ok(()),
            GateState::Unauthenticated => Err(ApiError::Unauthenticated),
            GateState::Unknown => Err(ApiError::SessionPending),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::SessionPending => (
                StatusCode::SERVICE_UNAVAILABLE,
                "session check in progress".to_string(),
            ),
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "sign in required".to_string()),
            ApiError::Auth(AuthError::InvalidCredentials(msg)) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Auth(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}
