use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::instrument;

use super::{
    dto::{
        NewRecipeRequest, RecipeDetailsResponse, RecipeResponse, RecipesResponse,
        UpdateRecipeRequest,
    },
    services,
};
use crate::{
    auth::{Caller, Capability},
    error::AppResult,
    ingredients::dto::DeletedResponse,
    json::Json,
    state::AppState,
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe).get(list_recipes))
        .route(
            "/recipes/:id",
            get(get_recipe).patch(update_recipe).delete(remove_recipe),
        )
}

#[instrument(skip(state, caller, body))]
pub async fn create_recipe(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<NewRecipeRequest>,
) -> AppResult<(StatusCode, Json<RecipeDetailsResponse>)> {
    caller.require_any(&[Capability::Admin, Capability::Nutritionist])?;
    let recipe = services::create_recipe(&state, body.validate()?).await?;
    Ok((StatusCode::CREATED, Json(RecipeDetailsResponse { recipe })))
}

#[instrument(skip(state, caller))]
pub async fn list_recipes(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<RecipesResponse>> {
    caller.require_logged_in()?;
    let recipes = services::list_recipes(&state).await?;
    Ok(Json(RecipesResponse { recipes }))
}

#[instrument(skip(state, caller))]
pub async fn get_recipe(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> AppResult<Json<RecipeDetailsResponse>> {
    caller.require_logged_in()?;
    let recipe = services::get_recipe(&state, id).await?;
    Ok(Json(RecipeDetailsResponse { recipe }))
}

#[instrument(skip(state, caller, body))]
pub async fn update_recipe(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(body): Json<UpdateRecipeRequest>,
) -> AppResult<Json<RecipeResponse>> {
    caller.require_any(&[Capability::Admin])?;
    let recipe = services::update_recipe(&state, id, body.validate()?).await?;
    Ok(Json(RecipeResponse { recipe }))
}

#[instrument(skip(state, caller))]
pub async fn remove_recipe(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> AppResult<Json<DeletedResponse>> {
    caller.require_any(&[Capability::Admin])?;
    services::remove_recipe(&state, id).await?;
    Ok(Json(DeletedResponse { deleted: id }))
}
