//! Error handling for the inventory platform
//!
//! Every failure a handler can return maps to one HTTP status and a stable
//! error code.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::validation::{FieldViolation, MovementViolation};
use shared::StockViolation;
use thiserror::Error;

/// Postgres SQLSTATE for foreign key violations
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// Postgres SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Operator (userId) is required")]
    OperatorRequired,

    #[error("Invalid trazability: {message}")]
    Trazability { field: String, message: String },

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },

    #[error("Referenced entity does not exist: {0}")]
    ReferenceViolation(String),

    // External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn conflict(resource: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Conflict {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Classify a database error by SQLSTATE.
    ///
    /// Foreign key violations become [`AppError::ReferenceViolation`], unique
    /// violations become [`AppError::Conflict`] naming the constraint.
    pub fn from_db(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            match db.code().as_deref() {
                Some(FOREIGN_KEY_VIOLATION) => {
                    return AppError::ReferenceViolation(
                        db.constraint().unwrap_or("foreign key").to_string(),
                    )
                }
                Some(UNIQUE_VIOLATION) => {
                    let constraint = db.constraint().unwrap_or("unique").to_string();
                    return AppError::conflict(
                        constraint.clone(),
                        format!("A record violating {} already exists", constraint),
                    );
                }
                _ => {}
            }
        }
        AppError::DatabaseError(err)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AppError::Validation { .. }
            | AppError::OperatorRequired
            | AppError::Trazability { .. }
            | AppError::InsufficientStock { .. }
            | AppError::ReferenceViolation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FieldViolation> for AppError {
    fn from(v: FieldViolation) -> Self {
        AppError::Validation {
            field: v.field,
            message: v.message,
        }
    }
}

impl From<MovementViolation> for AppError {
    fn from(v: MovementViolation) -> Self {
        match v {
            MovementViolation::Field(v) => v.into(),
            MovementViolation::OperatorRequired => AppError::OperatorRequired,
            MovementViolation::Trazability { field, message } => {
                AppError::Trazability { field, message }
            }
        }
    }
}

/// Unreadable request bodies are reported like any other invalid field
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation("body", rejection.body_text())
    }
}

impl From<StockViolation> for AppError {
    fn from(v: StockViolation) -> Self {
        match v {
            StockViolation::Insufficient {
                requested,
                available,
            } => AppError::InsufficientStock {
                requested,
                available,
            },
            StockViolation::Overflow => AppError::validation("quantity", v.to_string()),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
            details: None,
        }
    }

    fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail::new(code, message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::InvalidCredentials => {
                ErrorDetail::new("INVALID_CREDENTIALS", "Invalid email or password")
            }
            AppError::InsufficientPermissions => ErrorDetail::new(
                "INSUFFICIENT_PERMISSIONS",
                "You do not have permission to perform this action",
            ),
            AppError::Unauthorized { message } => ErrorDetail::new("UNAUTHORIZED", message.clone()),
            AppError::Validation { field, message } => {
                ErrorDetail::new("VALIDATION_ERROR", message.clone()).with_field(field)
            }
            AppError::OperatorRequired => ErrorDetail::new(
                "OPERATOR_REQUIRED",
                "userId is required: every movement must identify its operator",
            )
            .with_field("userId"),
            AppError::Trazability { field, message } => {
                ErrorDetail::new("INVALID_TRAZABILITY", message.clone()).with_field(field)
            }
            AppError::Conflict { resource, message } => {
                ErrorDetail::new("CONFLICT", message.clone()).with_field(resource)
            }
            AppError::NotFound(resource) => {
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource))
            }
            AppError::InsufficientStock {
                requested,
                available,
            } => ErrorDetail::new(
                "INSUFFICIENT_STOCK",
                format!(
                    "Insufficient stock: requested {}, available {}",
                    requested, available
                ),
            )
            .with_field("quantity"),
            AppError::ReferenceViolation(constraint) => ErrorDetail::new(
                "TRAZABILITY_FAILURE",
                "trazability failure: referenced entity does not exist",
            )
            .with_details(constraint.clone()),
            AppError::ExternalService(msg) => ErrorDetail::new(
                "EXTERNAL_SERVICE_ERROR",
                format!("External service error: {}", msg),
            ),
            AppError::Configuration(msg) => ErrorDetail::new(
                "CONFIGURATION_ERROR",
                format!("Configuration error: {}", msg),
            ),
            AppError::DatabaseError(err) => {
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred")
                    .with_details(err.to_string())
            }
            AppError::Internal(msg) => {
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred")
                    .with_details(msg.clone())
            }
            AppError::InternalError(err) => {
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred")
                    .with_details(err.to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: detail,
            }),
        )
            .into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::OperatorRequired.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InsufficientStock {
                requested: 5,
                available: 2
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ReferenceViolation("movements_supplier_id_fkey".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound("Product".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("code", "taken").status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_movement_violations_keep_their_class() {
        let err: AppError = MovementViolation::Trazability {
            field: "clientId".into(),
            message: "forbidden".into(),
        }
        .into();
        assert!(matches!(err, AppError::Trazability { ref field, .. } if field == "clientId"));

        let err: AppError = MovementViolation::OperatorRequired.into();
        assert!(matches!(err, AppError::OperatorRequired));
    }

    #[test]
    fn test_stock_violation_carries_both_values() {
        let err: AppError = StockViolation::Insufficient {
            requested: 9,
            available: 4,
        }
        .into();
        assert_eq!(err.to_string(), "Insufficient stock: requested 9, available 4");
    }
}
