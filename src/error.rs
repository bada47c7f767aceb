//! Domain error type shared by services and handlers, and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::store::StoreError;

/// One violated rule of a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Unauthorized,
    Forbidden,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    BadRequest {
        message: String,
        details: Vec<FieldError>,
    },

    #[error("Duplicate meal plan: {0}")]
    DuplicateName(String),

    #[error("Meal plan is already shared with this client")]
    DuplicateShare,

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::BadRequest { .. }
            | AppError::DuplicateName(_)
            | AppError::DuplicateShare
            | AppError::Duplicate(_) => ErrorKind::BadRequest,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::Store(StoreError::Conflict(_)) => ErrorKind::BadRequest,
            AppError::Store(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn details(&self) -> &[FieldError] {
        match self {
            AppError::BadRequest { details, .. } => details,
            _ => &[],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = kind.status();
        let message = if kind == ErrorKind::Internal {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            error: ErrorPayload {
                status: status.as_u16(),
                message,
                details: self.details().to_vec(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_bad_requests() {
        assert_eq!(AppError::DuplicateShare.kind().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::DuplicateName("Week1".into()).kind().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Store(StoreError::Conflict("users_username_key".into()))
                .kind()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internal_errors_are_redacted() {
        let resp = AppError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn body_serialization_carries_details() {
        let body = ErrorBody {
            error: ErrorPayload {
                status: 400,
                message: "invalid meal plan".into(),
                details: vec![FieldError::new("recipes", "at least one recipe is required")],
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"]["details"][0]["field"], "recipes");
        assert_eq!(json["error"]["status"], 400);
    }
}
