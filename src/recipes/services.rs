use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    recipes::{
        dto::CreateRecipe,
        repo_types::{Recipe, RecipeDetails, RecipePatch},
    },
    state::AppState,
    store::UnitOfWork,
};

fn no_recipe(id: i32) -> AppError {
    AppError::not_found(format!("No recipe: {id}"))
}

async fn compose(uow: &mut dyn UnitOfWork, recipe: Recipe) -> AppResult<RecipeDetails> {
    let ingredients = uow.recipe_ingredients(recipe.id).await?;
    let nutrients = uow.recipe_nutrients(recipe.id).await?;
    let instructions = uow.recipe_instructions(recipe.id).await?;
    Ok(RecipeDetails {
        recipe,
        ingredients,
        nutrients,
        instructions,
    })
}

/// Writes the recipe with its ingredient links, nutrients and instructions atomically.
pub async fn create_recipe(state: &AppState, input: CreateRecipe) -> AppResult<RecipeDetails> {
    let mut uow = state.store.begin().await?;

    let ingredient_ids: BTreeSet<i32> = input.ingredient_ids.iter().copied().collect();
    let mut missing = Vec::new();
    for id in &ingredient_ids {
        if uow.find_ingredient(*id).await?.is_none() {
            missing.push(id.to_string());
        }
    }
    if !missing.is_empty() {
        warn!(missing = ?missing, "recipe references unknown ingredients");
        return Err(AppError::not_found(format!(
            "No ingredient: {}",
            missing.join(", ")
        )));
    }

    let recipe = uow.insert_recipe(input.recipe).await?;
    for ingredient_id in &ingredient_ids {
        uow.insert_recipe_ingredient(recipe.id, *ingredient_id).await?;
    }
    for nutrient in input.nutrients {
        uow.insert_recipe_nutrient(recipe.id, nutrient).await?;
    }
    for instruction in input.instructions {
        uow.insert_instruction(recipe.id, instruction).await?;
    }
    let details = compose(uow.as_mut(), recipe).await?;
    uow.commit().await?;

    info!(recipe_id = details.recipe.id, title = %details.recipe.title, "recipe created");
    Ok(details)
}

pub async fn list_recipes(state: &AppState) -> AppResult<Vec<Recipe>> {
    let mut uow = state.store.begin().await?;
    Ok(uow.list_recipes().await?)
}

pub async fn get_recipe(state: &AppState, id: i32) -> AppResult<RecipeDetails> {
    let mut uow = state.store.begin().await?;
    let recipe = uow.find_recipe(id).await?.ok_or_else(|| no_recipe(id))?;
    compose(uow.as_mut(), recipe).await
}

pub async fn update_recipe(state: &AppState, id: i32, patch: RecipePatch) -> AppResult<Recipe> {
    if patch.is_empty() {
        return Err(AppError::bad_request("No data to update"));
    }
    let mut uow = state.store.begin().await?;
    let recipe = uow.update_recipe(id, patch).await?.ok_or_else(|| no_recipe(id))?;
    uow.commit().await?;
    info!(recipe_id = id, "recipe updated");
    Ok(recipe)
}

pub async fn remove_recipe(state: &AppState, id: i32) -> AppResult<()> {
    let mut uow = state.store.begin().await?;
    if !uow.delete_recipe(id).await? {
        return Err(no_recipe(id));
    }
    uow.commit().await?;
    info!(recipe_id = id, "recipe removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        ingredients::repo_types::{NewIngredient, Nutrient},
        recipes::repo_types::{Instruction, NewRecipe},
    };

    async fn oats(state: &AppState) -> i32 {
        let mut uow = state.store.begin().await.unwrap();
        let row = uow
            .insert_ingredient(NewIngredient {
                aisle: "Cereal".into(),
                image: String::new(),
                name: "Oats".into(),
                amount: 50.0,
                unit: "g".into(),
                details: String::new(),
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();
        row.id
    }

    fn porridge(ingredient_ids: Vec<i32>) -> CreateRecipe {
        CreateRecipe {
            recipe: NewRecipe {
                title: "Porridge".into(),
                servings: 1,
                ready_in_minutes: 10,
                dish_types: vec!["breakfast".into()],
                ..NewRecipe::default()
            },
            ingredient_ids,
            nutrients: vec![Nutrient {
                name: "Calories".into(),
                amount: 190.0,
                unit: "kcal".into(),
                percent_of_daily_needs: 9.5,
            }],
            instructions: vec![
                Instruction {
                    number: 2,
                    step: "Stir".into(),
                },
                Instruction {
                    number: 1,
                    step: "Boil".into(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn create_writes_every_relation() {
        let state = AppState::fake();
        let oats = oats(&state).await;
        let created = create_recipe(&state, porridge(vec![oats])).await.unwrap();

        let fetched = get_recipe(&state, created.recipe.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.ingredients[0].name, "Oats");
        assert_eq!(fetched.nutrients.len(), 1);
        let steps: Vec<_> = fetched.instructions.iter().map(|i| i.step.as_str()).collect();
        assert_eq!(steps, vec!["Boil", "Stir"]);
    }

    #[tokio::test]
    async fn repeated_ingredient_ids_link_once() {
        let state = AppState::fake();
        let oats = oats(&state).await;
        let created = create_recipe(&state, porridge(vec![oats, oats])).await.unwrap();
        assert_eq!(created.ingredients.len(), 1);
        assert_eq!(created.ingredients[0].id, oats);
    }

    #[tokio::test]
    async fn unknown_ingredient_writes_nothing() {
        let state = AppState::fake();
        let err = create_recipe(&state, porridge(vec![404])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(list_recipes(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_and_remove() {
        let state = AppState::fake();
        let id = create_recipe(&state, porridge(vec![])).await.unwrap().recipe.id;

        let updated = update_recipe(
            &state,
            id,
            RecipePatch {
                vegan: Some(true),
                ..RecipePatch::default()
            },
        )
        .await
        .unwrap();
        assert!(updated.vegan);
        assert_eq!(updated.title, "Porridge");

        remove_recipe(&state, id).await.unwrap();
        assert_eq!(get_recipe(&state, id).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(remove_recipe(&state, id).await.unwrap_err().kind(), ErrorKind::NotFound);
    }
}
