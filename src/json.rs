//! JSON body extractor whose rejections use the crate's error body.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{AppError, FieldError};

/// Drop-in for `axum::Json`. Malformed or mistyped bodies become 400s
/// with the offending path in `details`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(Json(value))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Splits serde's `path: message` text. Root-level errors carry no path.
fn field_error(text: &str) -> FieldError {
    let text = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(text);
    match text.split_once(": ") {
        Some((path, message)) if !path.is_empty() && !path.contains(char::is_whitespace) => {
            FieldError::new(path, message)
        }
        _ => FieldError::new("body", text),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let (message, detail) = match &rejection {
            JsonRejection::JsonDataError(e) => ("invalid request body", field_error(&e.body_text())),
            JsonRejection::JsonSyntaxError(e) => (
                "malformed JSON body",
                FieldError::new("body", e.body_text()),
            ),
            JsonRejection::MissingJsonContentType(_) => (
                "expected a JSON body",
                FieldError::new("body", "Content-Type must be application/json"),
            ),
            other => ("invalid request body", FieldError::new("body", other.body_text())),
        };
        AppError::BadRequest {
            message: message.to_string(),
            details: vec![detail],
        }
    }
}
