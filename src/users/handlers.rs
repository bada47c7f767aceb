use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde_json::{Map, Value};
use tracing::{instrument, warn};

use crate::{
    auth::{Caller, Capability, JwtKeys},
    error::{AppError, AppResult},
    json::Json,
    state::AppState,
    users::{
        dto::{
            CreatedUserResponse, DeletedUserResponse, NewUserRequest, PublicUser,
            UpdateUserRequest, UserResponse, UsersResponse,
        },
        repo_types::{Role, SavedKind},
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route(
            "/users/:username",
            get(get_user).patch(update_user).delete(remove_user),
        )
}

pub fn saved_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/:username/ingredients",
            get(|state: State<AppState>, caller: Caller, path: Path<String>| {
                list_saved(state, caller, path, SavedKind::Ingredient)
            }),
        )
        .route(
            "/users/:username/ingredients/:id",
            post(
                |state: State<AppState>, caller: Caller, path: Path<(String, i32)>| {
                    save(state, caller, path, SavedKind::Ingredient)
                },
            )
            .delete(
                |state: State<AppState>, caller: Caller, path: Path<(String, i32)>| {
                    unsave(state, caller, path, SavedKind::Ingredient)
                },
            ),
        )
        .route(
            "/users/:username/recipes",
            get(|state: State<AppState>, caller: Caller, path: Path<String>| {
                list_saved(state, caller, path, SavedKind::Recipe)
            }),
        )
        .route(
            "/users/:username/recipes/:id",
            post(
                |state: State<AppState>, caller: Caller, path: Path<(String, i32)>| {
                    save(state, caller, path, SavedKind::Recipe)
                },
            )
            .delete(
                |state: State<AppState>, caller: Caller, path: Path<(String, i32)>| {
                    unsave(state, caller, path, SavedKind::Recipe)
                },
            ),
        )
        .route(
            "/users/:username/mealplans",
            get(|state: State<AppState>, caller: Caller, path: Path<String>| {
                list_saved(state, caller, path, SavedKind::MealPlan)
            }),
        )
        .route(
            "/users/:username/mealplans/:id",
            post(
                |state: State<AppState>, caller: Caller, path: Path<(String, i32)>| {
                    save(state, caller, path, SavedKind::MealPlan)
                },
            )
            .delete(
                |state: State<AppState>, caller: Caller, path: Path<(String, i32)>| {
                    unsave(state, caller, path, SavedKind::MealPlan)
                },
            ),
        )
}

#[instrument(skip(state, caller, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<NewUserRequest>,
) -> AppResult<(StatusCode, Json<CreatedUserResponse>)> {
    caller.require_any(&[Capability::Admin])?;
    let input = payload.validate(Role::Client)?;
    let user = services::register(&state, input).await?;
    let token = JwtKeys::from_ref(&state).sign_access(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            user: user.into(),
            token,
        }),
    ))
}

#[instrument(skip(state, caller))]
pub async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<UsersResponse>> {
    caller.require_any(&[Capability::Admin])?;
    let users = services::list_users(&state).await?;
    Ok(Json(UsersResponse {
        users: users.into_iter().map(PublicUser::from).collect(),
    }))
}

#[instrument(skip(state, caller))]
pub async fn get_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(username): Path<String>,
) -> AppResult<Json<UserResponse>> {
    caller.require_any(&[Capability::Admin, Capability::SameUser(&username)])?;
    let user = services::get_user(&state, &username).await?;
    Ok(Json(UserResponse { user: user.into() }))
}

#[instrument(skip(state, caller, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(username): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    caller.require_any(&[Capability::Admin, Capability::SameUser(&username)])?;
    let update = payload.validate()?;
    if update.role.is_some() && !caller.is_admin() {
        warn!(%username, caller = %caller.username, "role change by non-admin");
        return Err(AppError::Forbidden("Only admins may change roles".into()));
    }
    let user = services::update_user(&state, &username, update).await?;
    Ok(Json(UserResponse { user: user.into() }))
}

#[instrument(skip(state, caller))]
pub async fn remove_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(username): Path<String>,
) -> AppResult<Json<DeletedUserResponse>> {
    caller.require_any(&[Capability::Admin, Capability::SameUser(&username)])?;
    services::remove_user(&state, &username).await?;
    Ok(Json(DeletedUserResponse {
        deleted_user: username,
    }))
}

fn keyed(key: impl Into<String>, value: impl Into<Value>) -> Value {
    let mut body = Map::new();
    body.insert(key.into(), value.into());
    Value::Object(body)
}

fn noun(kind: SavedKind) -> &'static str {
    match kind {
        SavedKind::Ingredient => "ingredient",
        SavedKind::Recipe => "recipe",
        SavedKind::MealPlan => "meal plan",
    }
}

#[instrument(skip(state, caller))]
async fn save(
    State(state): State<AppState>,
    caller: Caller,
    Path((username, id)): Path<(String, i32)>,
    kind: SavedKind,
) -> AppResult<(StatusCode, Json<Value>)> {
    match kind {
        SavedKind::MealPlan => caller.require_any(&[Capability::Admin, Capability::Nutritionist])?,
        _ => caller.require_any(&[Capability::Admin, Capability::SameUser(&username)])?,
    }
    services::save_item(&state, &username, kind, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(keyed(format!("saved {}", noun(kind)), id)),
    ))
}

#[instrument(skip(state, caller))]
async fn unsave(
    State(state): State<AppState>,
    caller: Caller,
    Path((username, id)): Path<(String, i32)>,
    kind: SavedKind,
) -> AppResult<(StatusCode, Json<Value>)> {
    caller.require_any(&[Capability::Admin, Capability::SameUser(&username)])?;
    services::unsave_item(&state, &username, kind, id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(keyed(format!("deleted {}", noun(kind)), id)),
    ))
}

#[instrument(skip(state, caller))]
async fn list_saved(
    State(state): State<AppState>,
    caller: Caller,
    Path(username): Path<String>,
    kind: SavedKind,
) -> AppResult<Json<Value>> {
    caller.require_any(&[Capability::Admin, Capability::SameUser(&username)])?;
    let body = match kind {
        SavedKind::Ingredient => keyed(
            "ingredients",
            serde_json::to_value(services::saved_ingredients(&state, &username).await?)
                .map_err(anyhow::Error::from)?,
        ),
        SavedKind::Recipe => keyed(
            "recipes",
            serde_json::to_value(services::saved_recipes(&state, &username).await?)
                .map_err(anyhow::Error::from)?,
        ),
        SavedKind::MealPlan => keyed(
            "mealPlans",
            serde_json::to_value(services::saved_meal_plans(&state, &username).await?)
                .map_err(anyhow::Error::from)?,
        ),
    };
    Ok(Json(body))
}
