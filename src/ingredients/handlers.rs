use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::instrument;

use super::{
    dto::{
        DeletedResponse, IngredientDetailsResponse, IngredientResponse, IngredientsResponse,
        NewIngredientRequest, UpdateIngredientRequest,
    },
    services,
};
use crate::{
    auth::{Caller, Capability},
    error::AppResult,
    json::Json,
    state::AppState,
};

const STAFF: &[Capability<'static>] = &[Capability::Admin, Capability::Nutritionist];

pub fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients", post(create_ingredient).get(list_ingredients))
        .route(
            "/ingredients/:id",
            get(get_ingredient)
                .patch(update_ingredient)
                .delete(remove_ingredient),
        )
}

#[instrument(skip(state, caller, body))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<NewIngredientRequest>,
) -> AppResult<(StatusCode, Json<IngredientDetailsResponse>)> {
    caller.require_any(STAFF)?;
    let (ingredient, nutrients) = body.validate()?;
    let ingredient = services::create_ingredient(&state, ingredient, nutrients).await?;
    Ok((
        StatusCode::CREATED,
        Json(IngredientDetailsResponse { ingredient }),
    ))
}

#[instrument(skip(state, caller))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<IngredientsResponse>> {
    caller.require_logged_in()?;
    let ingredients = services::list_ingredients(&state).await?;
    Ok(Json(IngredientsResponse { ingredients }))
}

#[instrument(skip(state, caller))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> AppResult<Json<IngredientDetailsResponse>> {
    caller.require_logged_in()?;
    let ingredient = services::get_ingredient(&state, id).await?;
    Ok(Json(IngredientDetailsResponse { ingredient }))
}

#[instrument(skip(state, caller, body))]
pub async fn update_ingredient(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(body): Json<UpdateIngredientRequest>,
) -> AppResult<Json<IngredientResponse>> {
    caller.require_any(STAFF)?;
    let ingredient = services::update_ingredient(&state, id, body.validate()?).await?;
    Ok(Json(IngredientResponse { ingredient }))
}

#[instrument(skip(state, caller))]
pub async fn remove_ingredient(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> AppResult<Json<DeletedResponse>> {
    caller.require_any(STAFF)?;
    services::remove_ingredient(&state, id).await?;
    Ok(Json(DeletedResponse { deleted: id }))
}
