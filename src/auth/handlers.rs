use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, MessageResponse, NewClientRequest, RefreshRequest, RegisterRequest,
            TokenResponse,
        },
        Caller, Capability, JwtKeys,
    },
    error::{AppError, AppResult},
    json::Json,
    state::AppState,
    users::{
        dto::{PublicUser, RegisterUser, UserResponse},
        repo_types::{Role, User},
        services,
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/token", post(login))
        .route("/auth/register", post(register))
        .route("/auth/client/new", post(register_client))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn token_pair(keys: &JwtKeys, user: &User) -> AppResult<TokenResponse> {
    Ok(TokenResponse {
        token: keys.sign_access(user)?,
        refresh_token: keys.sign_refresh(user)?,
    })
}

#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let user = services::authenticate(&state, payload.username.trim(), &payload.password).await?;
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(token_pair(&keys, &user)?))
}

/// Open sign-up; always creates a nutritionist.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let input = payload.user.validate(Role::Nutritionist)?;
    let input = RegisterUser {
        role: Role::Nutritionist,
        ..input
    };
    let user = services::register(&state, input).await?;
    let keys = JwtKeys::from_ref(&state);
    Ok((StatusCode::CREATED, Json(token_pair(&keys, &user)?)))
}

#[instrument(skip(state, caller, payload), fields(caller = %caller.username))]
pub async fn register_client(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<NewClientRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    caller.require_any(&[Capability::Admin, Capability::Nutritionist])?;
    let input = payload.user.validate(Role::Client)?;
    let nutritionist = payload
        .nutritionist_username
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| caller.username.clone());

    let message = services::register_client(&state, input, &nutritionist).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthorized("Invalid or expired refresh token".into())
    })?;

    // The account may have been removed or its role changed since the token was issued.
    let user = services::get_user(&state, &claims.sub)
        .await
        .map_err(|_| AppError::Unauthorized("User not found".into()))?;
    info!(user_id = user.id, "tokens refreshed");
    Ok(Json(token_pair(&keys, &user)?))
}

#[instrument(skip(state, caller))]
pub async fn get_me(State(state): State<AppState>, caller: Caller) -> AppResult<Json<UserResponse>> {
    caller.require_logged_in()?;
    let user = services::get_user(&state, &caller.username)
        .await
        .map_err(|_| AppError::Unauthorized("User not found".into()))?;
    Ok(Json(UserResponse {
        user: PublicUser::from(user),
    }))
}
