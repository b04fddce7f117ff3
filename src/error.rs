use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use validator::ValidationErrors;

use crate::domain::allocator::AllocatorError;
use crate::domain::repositories::StoreError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    ServiceUnavailable { message: String, details: Value },
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AppError::ServiceUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            AppError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// HTTP status this error renders with.
    pub fn status(&self) -> StatusCode {
        self.parts().0
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, code) = self.parts();
        let (message, details) = match self {
            AppError::Validation { message, details }
            | AppError::NotFound { message, details }
            | AppError::ServiceUnavailable { message, details }
            | AppError::Internal { message, details } => (message.clone(), details.clone()),
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        AppError::bad_request(
            "Request validation failed",
            json!({ "fields": fields, "reason": errors.to_string() }),
        )
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(
            "Malformed request body",
            json!({ "reason": rejection.body_text() }),
        )
    }
}

/// Store failures on write paths surface as 503; the read path maps them itself.
impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Timeout(ms) => {
                AppError::unavailable("Store timed out", json!({ "timeout_ms": ms }))
            }
            StoreError::Constraint(reason) => {
                AppError::unavailable("Store rejected the record", json!({ "reason": reason }))
            }
            StoreError::OutOfRange(field) => {
                AppError::internal("Value out of storable range", json!({ "field": field }))
            }
            // Driver text stays in the logs.
            StoreError::Database(_) => AppError::unavailable(
                "Store unavailable",
                json!({ "reason": "database error" }),
            ),
        }
    }
}

impl From<AllocatorError> for AppError {
    fn from(e: AllocatorError) -> Self {
        match e {
            AllocatorError::RangeAuthority(reason) => AppError::unavailable(
                "Could not allocate a new slug",
                json!({ "reason": reason }),
            ),
            other => AppError::internal(
                "Slug allocator failure",
                json!({ "reason": other.to_string() }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::bad_request("x", json!({})).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("x", json!({})).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::unavailable("x", json!({})).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::internal("x", json!({})).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_timeout_is_unavailable() {
        let err: AppError = StoreError::Timeout(5000).into();
        assert!(matches!(err, AppError::ServiceUnavailable { .. }));
    }

    #[test]
    fn test_database_error_hides_driver_text() {
        let err: AppError = StoreError::Database(sqlx::Error::Protocol(
            "connection to 10.0.0.5:5432 refused for user admin".to_string(),
        ))
        .into();

        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        let info = err.to_error_info();
        assert_eq!(info.details, json!({ "reason": "database error" }));
        assert!(!info.message.contains("10.0.0.5"));
    }

    #[test]
    fn test_range_authority_failure_is_unavailable() {
        let err: AppError = AllocatorError::RangeAuthority("coordinator down".to_string()).into();
        assert!(matches!(err, AppError::ServiceUnavailable { .. }));
    }

    #[test]
    fn test_error_info_carries_code_and_message() {
        let info = AppError::not_found("Short URL not found.", json!({ "slug": "AB12" }))
            .to_error_info();

        assert_eq!(info.code, "not_found");
        assert_eq!(info.message, "Short URL not found.");
        assert_eq!(info.details["slug"], "AB12");
    }
}
