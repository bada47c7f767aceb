use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{
        AddRecipeRequest, CreateMealPlanRequest, DeletedMealPlanResponse, DeletedRecipeResponse,
        MealPlanDetailsResponse, MealPlanResponse, MealPlansResponse, ShareRequest, ShareResponse,
        SlotResponse, UpdateMealPlanRequest,
    },
    repo_types::{MealPlanDetails, MealPlanPatch},
    services,
};
use crate::{
    auth::{Caller, Capability},
    error::{AppError, AppResult},
    json::Json,
    state::AppState,
};

const STAFF: &[Capability<'static>] = &[Capability::Admin, Capability::Nutritionist];

/// Non-admins may only name themselves as a plan's author.
fn check_created_by(caller: &Caller, created_by: &str) -> AppResult<()> {
    if caller.is_admin() || created_by == caller.username {
        return Ok(());
    }
    warn!(%created_by, caller = %caller.username, "created_by does not match caller");
    Err(AppError::bad_request("created_by must be your own username"))
}

pub fn mealplan_routes() -> Router<AppState> {
    Router::new()
        .route("/mealplans", post(create_meal_plan).get(list_meal_plans))
        .route(
            "/mealplans/:id",
            get(get_meal_plan)
                .patch(update_meal_plan)
                .delete(remove_meal_plan),
        )
        .route(
            "/mealplans/:id/recipes/:recipe_id",
            post(add_recipe).delete(remove_recipe),
        )
        .route("/mealplans/:id/share", post(share_meal_plan))
        .route("/mealplans/shared/:client_username", get(shared_meal_plans))
}

#[instrument(skip(state, caller, body), fields(caller = %caller.username))]
pub async fn create_meal_plan(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<CreateMealPlanRequest>,
) -> AppResult<(StatusCode, Json<MealPlanResponse>)> {
    caller.require_any(STAFF)?;
    let mut input = body.validate()?;

    // Nutritionists create plans for themselves; only admins may attribute or assign them.
    check_created_by(&caller, &input.created_by)?;
    if !caller.is_admin() {
        input.user_id = Some(caller.id);
    }

    let meal_plan = services::create_meal_plan(&state, input).await?;
    Ok((StatusCode::CREATED, Json(MealPlanResponse { meal_plan })))
}

#[instrument(skip(state, caller))]
pub async fn list_meal_plans(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<MealPlansResponse>> {
    caller.require_any(STAFF)?;
    let meal_plans = services::list_meal_plans(&state).await?;
    Ok(Json(MealPlansResponse { meal_plans }))
}

#[instrument(skip(state, caller))]
pub async fn get_meal_plan(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> AppResult<Json<MealPlanDetailsResponse>> {
    caller.require_any(STAFF)?;
    let meal_plan = services::get_meal_plan(&state, id).await?;
    Ok(Json(MealPlanDetailsResponse { meal_plan }))
}

#[instrument(skip(state, caller, body))]
pub async fn update_meal_plan(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(body): Json<UpdateMealPlanRequest>,
) -> AppResult<Json<MealPlanResponse>> {
    caller.require_any(STAFF)?;
    let patch: MealPlanPatch = body.into();
    if let Some(created_by) = &patch.created_by {
        check_created_by(&caller, created_by)?;
    }
    let meal_plan = services::update_meal_plan(&state, id, patch).await?;
    Ok(Json(MealPlanResponse { meal_plan }))
}

#[instrument(skip(state, caller, body))]
pub async fn add_recipe(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, recipe_id)): Path<(i32, i32)>,
    Json(body): Json<AddRecipeRequest>,
) -> AppResult<(StatusCode, Json<SlotResponse>)> {
    caller.require_any(STAFF)?;
    let slot = body.validate(recipe_id)?;
    let recipe = services::add_recipe_to_meal_plan(&state, id, slot).await?;
    Ok((StatusCode::CREATED, Json(SlotResponse { recipe })))
}

#[instrument(skip(state, caller))]
pub async fn remove_recipe(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, recipe_id)): Path<(i32, i32)>,
) -> AppResult<Json<DeletedRecipeResponse>> {
    caller.require_any(STAFF)?;
    services::remove_recipe_from_meal_plan(&state, id, recipe_id).await?;
    Ok(Json(DeletedRecipeResponse {
        deleted_recipe: recipe_id,
    }))
}

#[instrument(skip(state, caller))]
pub async fn remove_meal_plan(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> AppResult<Json<DeletedMealPlanResponse>> {
    caller.require_any(&[Capability::Admin])?;
    services::remove_meal_plan(&state, id).await?;
    Ok(Json(DeletedMealPlanResponse { deleted_meal_plan: id }))
}

#[instrument(skip(state, caller, body))]
pub async fn share_meal_plan(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(body): Json<ShareRequest>,
) -> AppResult<Json<ShareResponse>> {
    caller.require_any(STAFF)?;
    let (nutritionist, client) = body.validate()?;
    if !caller.is_admin() && nutritionist != caller.username {
        return Err(AppError::Forbidden(
            "Nutritionists may only share under their own username".into(),
        ));
    }
    let message = services::share_meal_plan(&state, id, &nutritionist, &client).await?;
    Ok(Json(ShareResponse { message }))
}

#[instrument(skip(state, caller))]
pub async fn shared_meal_plans(
    State(state): State<AppState>,
    caller: Caller,
    Path(client_username): Path<String>,
) -> AppResult<Json<Vec<MealPlanDetails>>> {
    caller.require_any(&[Capability::Admin, Capability::SameUser(&client_username)])?;
    let plans = services::get_shared_meal_plans(&state, &client_username).await?;
    Ok(Json(plans))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::Role;

    fn caller(username: &str, role: Role) -> Caller {
        Caller {
            id: 1,
            username: username.into(),
            role,
        }
    }

    #[test]
    fn only_admins_attribute_plans_to_others() {
        let alice = caller("alice", Role::Nutritionist);
        assert!(check_created_by(&alice, "alice").is_ok());
        let err = check_created_by(&alice, "mallory").unwrap_err();
        assert_eq!(err.to_string(), "created_by must be your own username");
        assert!(check_created_by(&caller("root", Role::Admin), "mallory").is_ok());
    }
}
