use tracing::info;

use crate::{
    error::{AppError, AppResult},
    ingredients::repo_types::{Ingredient, IngredientDetails, IngredientPatch, NewIngredient, Nutrient},
    state::AppState,
};

fn no_ingredient(id: i32) -> AppError {
    AppError::not_found(format!("No ingredient: {id}"))
}

/// Inserts the ingredient and its nutrients in one transaction.
pub async fn create_ingredient(
    state: &AppState,
    ingredient: NewIngredient,
    nutrients: Vec<Nutrient>,
) -> AppResult<IngredientDetails> {
    let mut uow = state.store.begin().await?;
    let ingredient = uow.insert_ingredient(ingredient).await?;
    for nutrient in &nutrients {
        uow.insert_ingredient_nutrient(ingredient.id, nutrient.clone())
            .await?;
    }
    uow.commit().await?;

    info!(ingredient_id = ingredient.id, name = %ingredient.name, nutrients = nutrients.len(), "ingredient created");
    Ok(IngredientDetails {
        ingredient,
        nutrients,
    })
}

pub async fn list_ingredients(state: &AppState) -> AppResult<Vec<Ingredient>> {
    let mut uow = state.store.begin().await?;
    Ok(uow.list_ingredients().await?)
}

pub async fn get_ingredient(state: &AppState, id: i32) -> AppResult<IngredientDetails> {
    let mut uow = state.store.begin().await?;
    let ingredient = uow.find_ingredient(id).await?.ok_or_else(|| no_ingredient(id))?;
    let nutrients = uow.ingredient_nutrients(id).await?;
    Ok(IngredientDetails {
        ingredient,
        nutrients,
    })
}

pub async fn update_ingredient(
    state: &AppState,
    id: i32,
    patch: IngredientPatch,
) -> AppResult<Ingredient> {
    if patch.is_empty() {
        return Err(AppError::bad_request("No data to update"));
    }
    let mut uow = state.store.begin().await?;
    let ingredient = uow
        .update_ingredient(id, patch)
        .await?
        .ok_or_else(|| no_ingredient(id))?;
    uow.commit().await?;
    info!(ingredient_id = id, "ingredient updated");
    Ok(ingredient)
}

pub async fn remove_ingredient(state: &AppState, id: i32) -> AppResult<()> {
    let mut uow = state.store.begin().await?;
    if !uow.delete_ingredient(id).await? {
        return Err(no_ingredient(id));
    }
    uow.commit().await?;
    info!(ingredient_id = id, "ingredient removed");
    Ok(())
}
