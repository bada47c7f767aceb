//! Persistence port. Services talk to a [`UnitOfWork`]; adapters decide how
//! it is backed (PostgreSQL in production, memory in tests).

use async_trait::async_trait;

use crate::{
    ingredients::repo_types::{Ingredient, IngredientPatch, NewIngredient, Nutrient},
    mealplans::repo_types::{
        MealPlan, MealPlanPatch, MealPlanRecipe, MealPlanSummary, NewMealPlan, NewSlot,
        PlannedRecipe, Share,
    },
    recipes::repo_types::{Instruction, NewRecipe, Recipe, RecipePatch},
    users::repo_types::{NewUser, SavedKind, User, UserPatch},
};

pub mod memory;
pub mod postgres;
pub(crate) mod sql;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the constraint name.
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// Any other driver failure. Built through `From<sqlx::Error>`, which
    /// routes unique violations to `Conflict` instead.
    #[error(transparent)]
    Database(sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;
}

/// One transaction. Dropping it without [`UnitOfWork::commit`] discards every write.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    // ---- users ----
    async fn insert_user(&mut self, user: NewUser) -> StoreResult<User>;
    async fn list_users(&mut self) -> StoreResult<Vec<User>>;
    async fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>>;
    async fn update_user(&mut self, username: &str, patch: UserPatch) -> StoreResult<Option<User>>;
    async fn delete_user(&mut self, username: &str) -> StoreResult<bool>;
    async fn client_link_exists(&mut self, client_id: i32, nutritionist_id: i32) -> StoreResult<bool>;
    async fn insert_client_link(&mut self, client_id: i32, nutritionist_id: i32) -> StoreResult<()>;
    /// Whether any client link or share names this user as client or nutritionist.
    async fn role_references_exist(&mut self, user_id: i32) -> StoreResult<bool>;

    // ---- saved items ----
    async fn saved_exists(&mut self, kind: SavedKind, user_id: i32, item_id: i32) -> StoreResult<bool>;
    async fn insert_saved(&mut self, kind: SavedKind, user_id: i32, item_id: i32) -> StoreResult<()>;
    async fn delete_saved(&mut self, kind: SavedKind, user_id: i32, item_id: i32) -> StoreResult<bool>;
    async fn saved_ingredients(&mut self, user_id: i32) -> StoreResult<Vec<Ingredient>>;
    async fn saved_recipes(&mut self, user_id: i32) -> StoreResult<Vec<Recipe>>;
    async fn saved_meal_plans(&mut self, user_id: i32) -> StoreResult<Vec<MealPlanSummary>>;

    // ---- ingredients ----
    async fn insert_ingredient(&mut self, ingredient: NewIngredient) -> StoreResult<Ingredient>;
    async fn insert_ingredient_nutrient(&mut self, ingredient_id: i32, nutrient: Nutrient) -> StoreResult<()>;
    async fn list_ingredients(&mut self) -> StoreResult<Vec<Ingredient>>;
    async fn find_ingredient(&mut self, id: i32) -> StoreResult<Option<Ingredient>>;
    async fn ingredient_nutrients(&mut self, id: i32) -> StoreResult<Vec<Nutrient>>;
    async fn update_ingredient(&mut self, id: i32, patch: IngredientPatch) -> StoreResult<Option<Ingredient>>;
    async fn delete_ingredient(&mut self, id: i32) -> StoreResult<bool>;

    // ---- recipes ----
    async fn insert_recipe(&mut self, recipe: NewRecipe) -> StoreResult<Recipe>;
    async fn insert_recipe_ingredient(&mut self, recipe_id: i32, ingredient_id: i32) -> StoreResult<()>;
    async fn insert_recipe_nutrient(&mut self, recipe_id: i32, nutrient: Nutrient) -> StoreResult<()>;
    async fn insert_instruction(&mut self, recipe_id: i32, instruction: Instruction) -> StoreResult<()>;
    async fn list_recipes(&mut self) -> StoreResult<Vec<Recipe>>;
    async fn find_recipe(&mut self, id: i32) -> StoreResult<Option<Recipe>>;
    /// Returns the subset of `ids` that exist.
    async fn existing_recipe_ids(&mut self, ids: &[i32]) -> StoreResult<Vec<i32>>;
    async fn recipe_ingredients(&mut self, id: i32) -> StoreResult<Vec<Ingredient>>;
    async fn recipe_nutrients(&mut self, id: i32) -> StoreResult<Vec<Nutrient>>;
    async fn recipe_instructions(&mut self, id: i32) -> StoreResult<Vec<Instruction>>;
    async fn update_recipe(&mut self, id: i32, patch: RecipePatch) -> StoreResult<Option<Recipe>>;
    async fn delete_recipe(&mut self, id: i32) -> StoreResult<bool>;

    // ---- meal plans ----
    async fn insert_meal_plan(&mut self, plan: NewMealPlan) -> StoreResult<MealPlan>;
    async fn insert_slot(&mut self, meal_plan_id: i32, slot: NewSlot) -> StoreResult<MealPlanRecipe>;
    async fn list_meal_plans(&mut self) -> StoreResult<Vec<MealPlanSummary>>;
    async fn find_meal_plan(&mut self, id: i32) -> StoreResult<Option<MealPlan>>;
    async fn find_meal_plan_by_name(&mut self, name: &str) -> StoreResult<Option<MealPlan>>;
    /// Associations of every plan in `plan_ids`, ordered by plan then `PlannedRecipe::sort_key`.
    async fn planned_recipes(&mut self, plan_ids: &[i32]) -> StoreResult<Vec<PlannedRecipe>>;
    async fn update_meal_plan(&mut self, id: i32, patch: MealPlanPatch) -> StoreResult<Option<MealPlan>>;
    /// Deletes every association of `recipe_id` inside `meal_plan_id`; returns the count.
    async fn delete_slots_for_recipe(&mut self, meal_plan_id: i32, recipe_id: i32) -> StoreResult<u64>;
    async fn delete_slots_for_plan(&mut self, meal_plan_id: i32) -> StoreResult<u64>;
    async fn delete_meal_plan(&mut self, id: i32) -> StoreResult<bool>;

    // ---- sharing ----
    async fn share_exists(&mut self, meal_plan_id: i32, client_id: i32) -> StoreResult<bool>;
    async fn insert_share(&mut self, share: Share) -> StoreResult<()>;
    async fn shared_meal_plans(&mut self, client_id: i32) -> StoreResult<Vec<MealPlan>>;
}
