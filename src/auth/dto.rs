use serde::{Deserialize, Serialize};

use crate::users::dto::NewUserRequest;

/// Request body for login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Access and refresh token pair returned by login, register and refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub user: NewUserRequest,
}

/// Registers a client; `nutritionist_username` defaults to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClientRequest {
    pub user: NewUserRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutritionist_username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
