use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::errors::AdvisorError;

/// Errors as the HTTP layer reports them.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    MethodNotAllowed(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::MethodNotAllowed(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status();
        let body = ErrBody {
            success: false,
            error: self.to_string(),
        };
        (code, Json(body)).into_response()
    }
}

impl From<AdvisorError> for AppError {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::Validation(e) => AppError::BadRequest(e.to_string()),
            AdvisorError::ModelUnavailable { reason } => {
                tracing::error!("recommendation refused, models not loaded: {reason}");
                AppError::Internal("Models not loaded".to_string())
            }
            other => {
                tracing::error!("request failed: {other}");
                AppError::Internal("Internal server error".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ValidationError;

    #[test]
    fn validation_maps_to_bad_request_with_message() {
        let err: AppError = AdvisorError::from(ValidationError::NonNumeric).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Invalid data types. All parameters must be numbers."
        );
    }

    #[test]
    fn method_not_allowed_has_its_own_status() {
        let err = AppError::method_not_allowed("Method not allowed");
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(err.to_string(), "Method not allowed");
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err: AppError = AdvisorError::inference("weight row 3 is NaN").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");

        let err: AppError = AdvisorError::model_unavailable("/srv/models missing").into();
        assert_eq!(err.to_string(), "Models not loaded");
    }
}
