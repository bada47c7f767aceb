use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};

use super::{Store, StoreError, StoreResult, UnitOfWork};
use crate::{
    config::AppConfig,
    ingredients::{
        self,
        repo_types::{Ingredient, IngredientPatch, NewIngredient, Nutrient},
    },
    mealplans::{
        self,
        repo_types::{
            MealPlan, MealPlanPatch, MealPlanRecipe, MealPlanSummary, NewMealPlan, NewSlot,
            PlannedRecipe, Share,
        },
    },
    recipes::{
        self,
        repo_types::{Instruction, NewRecipe, Recipe, RecipePatch},
    },
    users::{
        self,
        repo_types::{NewUser, SavedKind, User, UserPatch},
    },
};

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.constraint().unwrap_or("unique").to_string())
            }
            _ => StoreError::Database(e),
        }
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    // ---- users ----

    async fn insert_user(&mut self, user: NewUser) -> StoreResult<User> {
        Ok(users::repo::insert(&mut self.tx, user).await?)
    }

    async fn list_users(&mut self) -> StoreResult<Vec<User>> {
        Ok(users::repo::list(&mut self.tx).await?)
    }

    async fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
        Ok(users::repo::find_by_username(&mut self.tx, username).await?)
    }

    async fn update_user(&mut self, username: &str, patch: UserPatch) -> StoreResult<Option<User>> {
        Ok(users::repo::update(&mut self.tx, username, patch).await?)
    }

    async fn delete_user(&mut self, username: &str) -> StoreResult<bool> {
        Ok(users::repo::delete(&mut self.tx, username).await?)
    }

    async fn client_link_exists(&mut self, client_id: i32, nutritionist_id: i32) -> StoreResult<bool> {
        Ok(users::repo::client_link_exists(&mut self.tx, client_id, nutritionist_id).await?)
    }

    async fn insert_client_link(&mut self, client_id: i32, nutritionist_id: i32) -> StoreResult<()> {
        Ok(users::repo::insert_client_link(&mut self.tx, client_id, nutritionist_id).await?)
    }

    async fn role_references_exist(&mut self, user_id: i32) -> StoreResult<bool> {
        Ok(users::repo::role_references_exist(&mut self.tx, user_id).await?)
    }

    // ---- saved items ----

    async fn saved_exists(&mut self, kind: SavedKind, user_id: i32, item_id: i32) -> StoreResult<bool> {
        Ok(users::repo::saved_exists(&mut self.tx, kind, user_id, item_id).await?)
    }

    async fn insert_saved(&mut self, kind: SavedKind, user_id: i32, item_id: i32) -> StoreResult<()> {
        Ok(users::repo::insert_saved(&mut self.tx, kind, user_id, item_id).await?)
    }

    async fn delete_saved(&mut self, kind: SavedKind, user_id: i32, item_id: i32) -> StoreResult<bool> {
        Ok(users::repo::delete_saved(&mut self.tx, kind, user_id, item_id).await?)
    }

    async fn saved_ingredients(&mut self, user_id: i32) -> StoreResult<Vec<Ingredient>> {
        Ok(users::repo::saved_ingredients(&mut self.tx, user_id).await?)
    }

    async fn saved_recipes(&mut self, user_id: i32) -> StoreResult<Vec<Recipe>> {
        Ok(users::repo::saved_recipes(&mut self.tx, user_id).await?)
    }

    async fn saved_meal_plans(&mut self, user_id: i32) -> StoreResult<Vec<MealPlanSummary>> {
        Ok(users::repo::saved_meal_plans(&mut self.tx, user_id).await?)
    }

    // ---- ingredients ----

    async fn insert_ingredient(&mut self, ingredient: NewIngredient) -> StoreResult<Ingredient> {
        Ok(ingredients::repo::insert(&mut self.tx, ingredient).await?)
    }

    async fn insert_ingredient_nutrient(&mut self, ingredient_id: i32, nutrient: Nutrient) -> StoreResult<()> {
        Ok(ingredients::repo::insert_nutrient(&mut self.tx, ingredient_id, nutrient).await?)
    }

    async fn list_ingredients(&mut self) -> StoreResult<Vec<Ingredient>> {
        Ok(ingredients::repo::list(&mut self.tx).await?)
    }

    async fn find_ingredient(&mut self, id: i32) -> StoreResult<Option<Ingredient>> {
        Ok(ingredients::repo::find(&mut self.tx, id).await?)
    }

    async fn ingredient_nutrients(&mut self, id: i32) -> StoreResult<Vec<Nutrient>> {
        Ok(ingredients::repo::nutrients(&mut self.tx, id).await?)
    }

    async fn update_ingredient(&mut self, id: i32, patch: IngredientPatch) -> StoreResult<Option<Ingredient>> {
        Ok(ingredients::repo::update(&mut self.tx, id, patch).await?)
    }

    async fn delete_ingredient(&mut self, id: i32) -> StoreResult<bool> {
        Ok(ingredients::repo::delete(&mut self.tx, id).await?)
    }

    // ---- recipes ----

    async fn insert_recipe(&mut self, recipe: NewRecipe) -> StoreResult<Recipe> {
        Ok(recipes::repo::insert(&mut self.tx, recipe).await?)
    }

    async fn insert_recipe_ingredient(&mut self, recipe_id: i32, ingredient_id: i32) -> StoreResult<()> {
        Ok(recipes::repo::insert_ingredient_link(&mut self.tx, recipe_id, ingredient_id).await?)
    }

    async fn insert_recipe_nutrient(&mut self, recipe_id: i32, nutrient: Nutrient) -> StoreResult<()> {
        Ok(recipes::repo::insert_nutrient(&mut self.tx, recipe_id, nutrient).await?)
    }

    async fn insert_instruction(&mut self, recipe_id: i32, instruction: Instruction) -> StoreResult<()> {
        Ok(recipes::repo::insert_instruction(&mut self.tx, recipe_id, instruction).await?)
    }

    async fn list_recipes(&mut self) -> StoreResult<Vec<Recipe>> {
        Ok(recipes::repo::list(&mut self.tx).await?)
    }

    async fn find_recipe(&mut self, id: i32) -> StoreResult<Option<Recipe>> {
        Ok(recipes::repo::find(&mut self.tx, id).await?)
    }

    async fn existing_recipe_ids(&mut self, ids: &[i32]) -> StoreResult<Vec<i32>> {
        Ok(recipes::repo::existing_ids(&mut self.tx, ids).await?)
    }

    async fn recipe_ingredients(&mut self, id: i32) -> StoreResult<Vec<Ingredient>> {
        Ok(recipes::repo::ingredients(&mut self.tx, id).await?)
    }

    async fn recipe_nutrients(&mut self, id: i32) -> StoreResult<Vec<Nutrient>> {
        Ok(recipes::repo::nutrients(&mut self.tx, id).await?)
    }

    async fn recipe_instructions(&mut self, id: i32) -> StoreResult<Vec<Instruction>> {
        Ok(recipes::repo::instructions(&mut self.tx, id).await?)
    }

    async fn update_recipe(&mut self, id: i32, patch: RecipePatch) -> StoreResult<Option<Recipe>> {
        Ok(recipes::repo::update(&mut self.tx, id, patch).await?)
    }

    async fn delete_recipe(&mut self, id: i32) -> StoreResult<bool> {
        Ok(recipes::repo::delete(&mut self.tx, id).await?)
    }

    // ---- meal plans ----

    async fn insert_meal_plan(&mut self, plan: NewMealPlan) -> StoreResult<MealPlan> {
        Ok(mealplans::repo::insert(&mut self.tx, plan).await?)
    }

    async fn insert_slot(&mut self, meal_plan_id: i32, slot: NewSlot) -> StoreResult<MealPlanRecipe> {
        Ok(mealplans::repo::insert_slot(&mut self.tx, meal_plan_id, slot).await?)
    }

    async fn list_meal_plans(&mut self) -> StoreResult<Vec<MealPlanSummary>> {
        Ok(mealplans::repo::list(&mut self.tx).await?)
    }

    async fn find_meal_plan(&mut self, id: i32) -> StoreResult<Option<MealPlan>> {
        Ok(mealplans::repo::find(&mut self.tx, id).await?)
    }

    async fn find_meal_plan_by_name(&mut self, name: &str) -> StoreResult<Option<MealPlan>> {
        Ok(mealplans::repo::find_by_name(&mut self.tx, name).await?)
    }

    async fn planned_recipes(&mut self, plan_ids: &[i32]) -> StoreResult<Vec<PlannedRecipe>> {
        Ok(mealplans::repo::planned_recipes(&mut self.tx, plan_ids).await?)
    }

    async fn update_meal_plan(&mut self, id: i32, patch: MealPlanPatch) -> StoreResult<Option<MealPlan>> {
        Ok(mealplans::repo::update(&mut self.tx, id, patch).await?)
    }

    async fn delete_slots_for_recipe(&mut self, meal_plan_id: i32, recipe_id: i32) -> StoreResult<u64> {
        Ok(mealplans::repo::delete_slots_for_recipe(&mut self.tx, meal_plan_id, recipe_id).await?)
    }

    async fn delete_slots_for_plan(&mut self, meal_plan_id: i32) -> StoreResult<u64> {
        Ok(mealplans::repo::delete_slots_for_plan(&mut self.tx, meal_plan_id).await?)
    }

    async fn delete_meal_plan(&mut self, id: i32) -> StoreResult<bool> {
        Ok(mealplans::repo::delete(&mut self.tx, id).await?)
    }

    // ---- sharing ----

    async fn share_exists(&mut self, meal_plan_id: i32, client_id: i32) -> StoreResult<bool> {
        Ok(mealplans::repo::share_exists(&mut self.tx, meal_plan_id, client_id).await?)
    }

    async fn insert_share(&mut self, share: Share) -> StoreResult<()> {
        Ok(mealplans::repo::insert_share(&mut self.tx, share).await?)
    }

    async fn shared_meal_plans(&mut self, client_id: i32) -> StoreResult<Vec<MealPlan>> {
        Ok(mealplans::repo::shared_with_client(&mut self.tx, client_id).await?)
    }
}
