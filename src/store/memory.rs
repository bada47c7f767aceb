//! In-memory adapter used by `AppState::fake()` and the test suites.
//!
//! A unit of work holds the table lock for its whole lifetime and edits a
//! private copy; `commit` swaps the copy in, dropping discards it.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Store, StoreError, StoreResult, UnitOfWork};
use crate::{
    ingredients::repo_types::{Ingredient, IngredientPatch, NewIngredient, Nutrient},
    mealplans::repo_types::{
        MealPlan, MealPlanPatch, MealPlanRecipe, MealPlanSummary, NewMealPlan, NewSlot,
        PlannedRecipe, Share,
    },
    recipes::repo_types::{Instruction, NewRecipe, Recipe, RecipePatch},
    users::repo_types::{NewUser, SavedKind, User, UserPatch},
};

#[derive(Debug, Clone, Default)]
struct Sequences {
    users: i32,
    ingredients: i32,
    recipes: i32,
    meal_plans: i32,
    slots: i32,
}

fn next(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

#[derive(Debug, Clone, Default)]
struct Tables {
    seq: Sequences,
    users: BTreeMap<i32, User>,
    /// (client_id, nutritionist_id)
    client_links: BTreeSet<(i32, i32)>,
    /// (kind, user_id, item_id)
    saved: BTreeSet<(SavedKind, i32, i32)>,
    ingredients: BTreeMap<i32, Ingredient>,
    ingredient_nutrients: Vec<(i32, Nutrient)>,
    recipes: BTreeMap<i32, Recipe>,
    /// (recipe_id, ingredient_id)
    recipe_ingredients: BTreeSet<(i32, i32)>,
    recipe_nutrients: Vec<(i32, Nutrient)>,
    instructions: Vec<(i32, Instruction)>,
    meal_plans: BTreeMap<i32, MealPlan>,
    slots: BTreeMap<i32, MealPlanRecipe>,
    shares: Vec<Share>,
}

impl Tables {
    fn user_id(&self, username: &str) -> Option<i32> {
        self.users
            .values()
            .find(|u| u.username == username)
            .map(|u| u.id)
    }

    fn saved_ids(&self, kind: SavedKind, user_id: i32) -> Vec<i32> {
        self.saved
            .iter()
            .filter(|(k, u, _)| *k == kind && *u == user_id)
            .map(|(_, _, item)| *item)
            .collect()
    }

    fn remove_user(&mut self, id: i32) {
        self.users.remove(&id);
        self.client_links.retain(|(c, n)| *c != id && *n != id);
        self.saved.retain(|(_, u, _)| *u != id);
        self.shares
            .retain(|s| s.client_id != id && s.nutritionist_id != id);
        for plan in self.meal_plans.values_mut() {
            if plan.user_id == Some(id) {
                plan.user_id = None;
            }
        }
    }

    fn remove_ingredient(&mut self, id: i32) {
        self.ingredients.remove(&id);
        self.ingredient_nutrients.retain(|(i, _)| *i != id);
        self.recipe_ingredients.retain(|(_, i)| *i != id);
        self.saved
            .retain(|(k, _, item)| !(*k == SavedKind::Ingredient && *item == id));
    }

    fn remove_recipe(&mut self, id: i32) {
        self.recipes.remove(&id);
        self.recipe_ingredients.retain(|(r, _)| *r != id);
        self.recipe_nutrients.retain(|(r, _)| *r != id);
        self.instructions.retain(|(r, _)| *r != id);
        self.slots.retain(|_, s| s.recipe_id != id);
        self.saved
            .retain(|(k, _, item)| !(*k == SavedKind::Recipe && *item == id));
    }

    fn remove_meal_plan(&mut self, id: i32) {
        self.meal_plans.remove(&id);
        self.slots.retain(|_, s| s.meal_plan_id != id);
        self.shares.retain(|s| s.mealplan_id != id);
        self.saved
            .retain(|(k, _, item)| !(*k == SavedKind::MealPlan && *item == id));
    }
}

fn conflict(constraint: &str) -> StoreError {
    StoreError::Conflict(constraint.to_string())
}

fn summary(plan: &MealPlan) -> MealPlanSummary {
    MealPlanSummary {
        id: plan.id,
        name: plan.name.clone(),
        created_by: plan.created_by.clone(),
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, work }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryUnitOfWork { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }

    // ---- users ----

    async fn insert_user(&mut self, user: NewUser) -> StoreResult<User> {
        let t = &mut self.work;
        if t.user_id(&user.username).is_some() {
            return Err(conflict("users_username_key"));
        }
        let id = next(&mut t.seq.users);
        let row = User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
        };
        t.users.insert(id, row.clone());
        Ok(row)
    }

    async fn list_users(&mut self) -> StoreResult<Vec<User>> {
        let mut users: Vec<_> = self.work.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .work
            .user_id(username)
            .and_then(|id| self.work.users.get(&id).cloned()))
    }

    async fn update_user(&mut self, username: &str, patch: UserPatch) -> StoreResult<Option<User>> {
        let Some(id) = self.work.user_id(username) else {
            return Ok(None);
        };
        let Some(user) = self.work.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = patch.first_name {
            user.first_name = v;
        }
        if let Some(v) = patch.last_name {
            user.last_name = v;
        }
        if let Some(v) = patch.email {
            user.email = v;
        }
        if let Some(v) = patch.password_hash {
            user.password_hash = v;
        }
        if let Some(v) = patch.role {
            user.role = v;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&mut self, username: &str) -> StoreResult<bool> {
        match self.work.user_id(username) {
            Some(id) => {
                self.work.remove_user(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn client_link_exists(&mut self, client_id: i32, nutritionist_id: i32) -> StoreResult<bool> {
        Ok(self.work.client_links.contains(&(client_id, nutritionist_id)))
    }

    async fn insert_client_link(&mut self, client_id: i32, nutritionist_id: i32) -> StoreResult<()> {
        if !self.work.client_links.insert((client_id, nutritionist_id)) {
            return Err(conflict("client_nutritionist_pkey"));
        }
        Ok(())
    }

    async fn role_references_exist(&mut self, user_id: i32) -> StoreResult<bool> {
        let tables = &self.work;
        Ok(tables
            .client_links
            .iter()
            .any(|(c, n)| *c == user_id || *n == user_id)
            || tables
                .shares
                .iter()
                .any(|s| s.client_id == user_id || s.nutritionist_id == user_id))
    }

    // ---- saved items ----

    async fn saved_exists(&mut self, kind: SavedKind, user_id: i32, item_id: i32) -> StoreResult<bool> {
        Ok(self.work.saved.contains(&(kind, user_id, item_id)))
    }

    async fn insert_saved(&mut self, kind: SavedKind, user_id: i32, item_id: i32) -> StoreResult<()> {
        if !self.work.saved.insert((kind, user_id, item_id)) {
            return Err(conflict(&format!("{}_pkey", kind.table())));
        }
        Ok(())
    }

    async fn delete_saved(&mut self, kind: SavedKind, user_id: i32, item_id: i32) -> StoreResult<bool> {
        Ok(self.work.saved.remove(&(kind, user_id, item_id)))
    }

    async fn saved_ingredients(&mut self, user_id: i32) -> StoreResult<Vec<Ingredient>> {
        let t = &self.work;
        let mut rows: Vec<_> = t
            .saved_ids(SavedKind::Ingredient, user_id)
            .into_iter()
            .filter_map(|id| t.ingredients.get(&id).cloned())
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn saved_recipes(&mut self, user_id: i32) -> StoreResult<Vec<Recipe>> {
        let t = &self.work;
        let mut rows: Vec<_> = t
            .saved_ids(SavedKind::Recipe, user_id)
            .into_iter()
            .filter_map(|id| t.recipes.get(&id).cloned())
            .collect();
        rows.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(rows)
    }

    async fn saved_meal_plans(&mut self, user_id: i32) -> StoreResult<Vec<MealPlanSummary>> {
        let t = &self.work;
        let mut rows: Vec<_> = t
            .saved_ids(SavedKind::MealPlan, user_id)
            .into_iter()
            .filter_map(|id| t.meal_plans.get(&id).map(summary))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    // ---- ingredients ----

    async fn insert_ingredient(&mut self, ingredient: NewIngredient) -> StoreResult<Ingredient> {
        let t = &mut self.work;
        let id = next(&mut t.seq.ingredients);
        let row = Ingredient {
            id,
            aisle: ingredient.aisle,
            image: ingredient.image,
            name: ingredient.name,
            amount: ingredient.amount,
            unit: ingredient.unit,
            details: ingredient.details,
        };
        t.ingredients.insert(id, row.clone());
        Ok(row)
    }

    async fn insert_ingredient_nutrient(&mut self, ingredient_id: i32, nutrient: Nutrient) -> StoreResult<()> {
        self.work.ingredient_nutrients.push((ingredient_id, nutrient));
        Ok(())
    }

    async fn list_ingredients(&mut self) -> StoreResult<Vec<Ingredient>> {
        let mut rows: Vec<_> = self.work.ingredients.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_ingredient(&mut self, id: i32) -> StoreResult<Option<Ingredient>> {
        Ok(self.work.ingredients.get(&id).cloned())
    }

    async fn ingredient_nutrients(&mut self, id: i32) -> StoreResult<Vec<Nutrient>> {
        Ok(self
            .work
            .ingredient_nutrients
            .iter()
            .filter(|(i, _)| *i == id)
            .map(|(_, n)| n.clone())
            .collect())
    }

    async fn update_ingredient(&mut self, id: i32, patch: IngredientPatch) -> StoreResult<Option<Ingredient>> {
        let Some(row) = self.work.ingredients.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = patch.aisle {
            row.aisle = v;
        }
        if let Some(v) = patch.image {
            row.image = v;
        }
        if let Some(v) = patch.name {
            row.name = v;
        }
        if let Some(v) = patch.amount {
            row.amount = v;
        }
        if let Some(v) = patch.unit {
            row.unit = v;
        }
        if let Some(v) = patch.details {
            row.details = v;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_ingredient(&mut self, id: i32) -> StoreResult<bool> {
        if !self.work.ingredients.contains_key(&id) {
            return Ok(false);
        }
        self.work.remove_ingredient(id);
        Ok(true)
    }

    // ---- recipes ----

    async fn insert_recipe(&mut self, recipe: NewRecipe) -> StoreResult<Recipe> {
        let t = &mut self.work;
        let id = next(&mut t.seq.recipes);
        let row = Recipe {
            id,
            vegetarian: recipe.vegetarian,
            vegan: recipe.vegan,
            dairy_free: recipe.dairy_free,
            weight_watcher_points: recipe.weight_watcher_points,
            credits_text: recipe.credits_text,
            title: recipe.title,
            ready_in_minutes: recipe.ready_in_minutes,
            servings: recipe.servings,
            source_url: recipe.source_url,
            image: recipe.image,
            image_type: recipe.image_type,
            dish_types: recipe.dish_types,
            diets: recipe.diets,
            summary: recipe.summary,
        };
        t.recipes.insert(id, row.clone());
        Ok(row)
    }

    async fn insert_recipe_ingredient(&mut self, recipe_id: i32, ingredient_id: i32) -> StoreResult<()> {
        if !self.work.recipe_ingredients.insert((recipe_id, ingredient_id)) {
            return Err(conflict("recipe_ingredients_pkey"));
        }
        Ok(())
    }

    async fn insert_recipe_nutrient(&mut self, recipe_id: i32, nutrient: Nutrient) -> StoreResult<()> {
        self.work.recipe_nutrients.push((recipe_id, nutrient));
        Ok(())
    }

    async fn insert_instruction(&mut self, recipe_id: i32, instruction: Instruction) -> StoreResult<()> {
        let taken = self
            .work
            .instructions
            .iter()
            .any(|(r, i)| *r == recipe_id && i.number == instruction.number);
        if taken {
            return Err(conflict("instructions_pkey"));
        }
        self.work.instructions.push((recipe_id, instruction));
        Ok(())
    }

    async fn list_recipes(&mut self) -> StoreResult<Vec<Recipe>> {
        let mut rows: Vec<_> = self.work.recipes.values().cloned().collect();
        rows.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(rows)
    }

    async fn find_recipe(&mut self, id: i32) -> StoreResult<Option<Recipe>> {
        Ok(self.work.recipes.get(&id).cloned())
    }

    async fn existing_recipe_ids(&mut self, ids: &[i32]) -> StoreResult<Vec<i32>> {
        let found: BTreeSet<i32> = ids
            .iter()
            .copied()
            .filter(|id| self.work.recipes.contains_key(id))
            .collect();
        Ok(found.into_iter().collect())
    }

    async fn recipe_ingredients(&mut self, id: i32) -> StoreResult<Vec<Ingredient>> {
        let t = &self.work;
        let mut rows: Vec<_> = t
            .recipe_ingredients
            .iter()
            .filter(|(r, _)| *r == id)
            .filter_map(|(_, i)| t.ingredients.get(i).cloned())
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn recipe_nutrients(&mut self, id: i32) -> StoreResult<Vec<Nutrient>> {
        Ok(self
            .work
            .recipe_nutrients
            .iter()
            .filter(|(r, _)| *r == id)
            .map(|(_, n)| n.clone())
            .collect())
    }

    async fn recipe_instructions(&mut self, id: i32) -> StoreResult<Vec<Instruction>> {
        let mut rows: Vec<_> = self
            .work
            .instructions
            .iter()
            .filter(|(r, _)| *r == id)
            .map(|(_, i)| i.clone())
            .collect();
        rows.sort_by_key(|i| i.number);
        Ok(rows)
    }

    async fn update_recipe(&mut self, id: i32, patch: RecipePatch) -> StoreResult<Option<Recipe>> {
        let Some(row) = self.work.recipes.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = patch.vegetarian {
            row.vegetarian = v;
        }
        if let Some(v) = patch.vegan {
            row.vegan = v;
        }
        if let Some(v) = patch.dairy_free {
            row.dairy_free = v;
        }
        if let Some(v) = patch.weight_watcher_points {
            row.weight_watcher_points = v;
        }
        if let Some(v) = patch.credits_text {
            row.credits_text = v;
        }
        if let Some(v) = patch.title {
            row.title = v;
        }
        if let Some(v) = patch.ready_in_minutes {
            row.ready_in_minutes = v;
        }
        if let Some(v) = patch.servings {
            row.servings = v;
        }
        if let Some(v) = patch.source_url {
            row.source_url = v;
        }
        if let Some(v) = patch.image {
            row.image = v;
        }
        if let Some(v) = patch.image_type {
            row.image_type = v;
        }
        if let Some(v) = patch.dish_types {
            row.dish_types = v;
        }
        if let Some(v) = patch.diets {
            row.diets = v;
        }
        if let Some(v) = patch.summary {
            row.summary = v;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_recipe(&mut self, id: i32) -> StoreResult<bool> {
        if !self.work.recipes.contains_key(&id) {
            return Ok(false);
        }
        self.work.remove_recipe(id);
        Ok(true)
    }

    // ---- meal plans ----

    async fn insert_meal_plan(&mut self, plan: NewMealPlan) -> StoreResult<MealPlan> {
        let t = &mut self.work;
        if t.meal_plans.values().any(|p| p.name == plan.name) {
            return Err(conflict("meal_plans_name_key"));
        }
        let id = next(&mut t.seq.meal_plans);
        let row = MealPlan {
            id,
            name: plan.name,
            created_by: plan.created_by,
            user_id: plan.user_id,
        };
        t.meal_plans.insert(id, row.clone());
        Ok(row)
    }

    async fn insert_slot(&mut self, meal_plan_id: i32, slot: NewSlot) -> StoreResult<MealPlanRecipe> {
        let t = &mut self.work;
        let id = next(&mut t.seq.slots);
        let row = MealPlanRecipe {
            id,
            meal_plan_id,
            recipe_id: slot.recipe_id,
            meal_type: slot.meal_type,
            meal_day: slot.meal_day,
        };
        t.slots.insert(id, row.clone());
        Ok(row)
    }

    async fn list_meal_plans(&mut self) -> StoreResult<Vec<MealPlanSummary>> {
        let mut rows: Vec<_> = self.work.meal_plans.values().map(summary).collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_meal_plan(&mut self, id: i32) -> StoreResult<Option<MealPlan>> {
        Ok(self.work.meal_plans.get(&id).cloned())
    }

    async fn find_meal_plan_by_name(&mut self, name: &str) -> StoreResult<Option<MealPlan>> {
        Ok(self
            .work
            .meal_plans
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn planned_recipes(&mut self, plan_ids: &[i32]) -> StoreResult<Vec<PlannedRecipe>> {
        let t = &self.work;
        let mut rows: Vec<_> = t
            .slots
            .values()
            .filter(|s| plan_ids.contains(&s.meal_plan_id))
            .filter_map(|s| {
                t.recipes.get(&s.recipe_id).map(|recipe| PlannedRecipe {
                    slot_id: s.id,
                    meal_plan_id: s.meal_plan_id,
                    recipe_id: s.recipe_id,
                    meal_type: s.meal_type,
                    meal_day: s.meal_day,
                    recipe: recipe.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            a.meal_plan_id
                .cmp(&b.meal_plan_id)
                .then_with(|| a.sort_key().cmp(&b.sort_key()))
        });
        Ok(rows)
    }

    async fn update_meal_plan(&mut self, id: i32, patch: MealPlanPatch) -> StoreResult<Option<MealPlan>> {
        let t = &mut self.work;
        if let Some(name) = &patch.name {
            if t.meal_plans.values().any(|p| p.id != id && &p.name == name) {
                return Err(conflict("meal_plans_name_key"));
            }
        }
        let Some(row) = t.meal_plans.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = patch.name {
            row.name = v;
        }
        if let Some(v) = patch.created_by {
            row.created_by = v;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_slots_for_recipe(&mut self, meal_plan_id: i32, recipe_id: i32) -> StoreResult<u64> {
        let before = self.work.slots.len();
        self.work
            .slots
            .retain(|_, s| !(s.meal_plan_id == meal_plan_id && s.recipe_id == recipe_id));
        Ok((before - self.work.slots.len()) as u64)
    }

    async fn delete_slots_for_plan(&mut self, meal_plan_id: i32) -> StoreResult<u64> {
        let before = self.work.slots.len();
        self.work.slots.retain(|_, s| s.meal_plan_id != meal_plan_id);
        Ok((before - self.work.slots.len()) as u64)
    }

    async fn delete_meal_plan(&mut self, id: i32) -> StoreResult<bool> {
        if !self.work.meal_plans.contains_key(&id) {
            return Ok(false);
        }
        self.work.remove_meal_plan(id);
        Ok(true)
    }

    // ---- sharing ----

    async fn share_exists(&mut self, meal_plan_id: i32, client_id: i32) -> StoreResult<bool> {
        Ok(self
            .work
            .shares
            .iter()
            .any(|s| s.mealplan_id == meal_plan_id && s.client_id == client_id))
    }

    async fn insert_share(&mut self, share: Share) -> StoreResult<()> {
        if self.share_exists(share.mealplan_id, share.client_id).await? {
            return Err(conflict("shared_mealplans_plan_client_key"));
        }
        self.work.shares.push(share);
        Ok(())
    }

    async fn shared_meal_plans(&mut self, client_id: i32) -> StoreResult<Vec<MealPlan>> {
        let t = &self.work;
        let mut rows: Vec<_> = t
            .shares
            .iter()
            .filter(|s| s.client_id == client_id)
            .filter_map(|s| t.meal_plans.get(&s.mealplan_id).cloned())
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mealplans::repo_types::MealType, users::repo_types::Role};

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.into(),
            password_hash: "hash".into(),
            first_name: "First".into(),
            last_name: "Last".into(),
            email: format!("{username}@example.com"),
            role,
        }
    }

    #[tokio::test]
    async fn dropped_unit_of_work_rolls_back() {
        let store = MemoryStore::new();
        {
            let mut uow = store.begin().await.unwrap();
            uow.insert_user(new_user("alice", Role::Nutritionist)).await.unwrap();
        }
        let mut uow = store.begin().await.unwrap();
        assert!(uow.find_user_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.insert_user(new_user("alice", Role::Nutritionist)).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let alice = uow.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.role, Role::Nutritionist);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.insert_user(new_user("alice", Role::Client)).await.unwrap();
        let err = uow.insert_user(new_user("alice", Role::Client)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(c) if c == "users_username_key"));
    }

    #[tokio::test]
    async fn deleting_a_plan_cascades() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let recipe = uow
            .insert_recipe(NewRecipe {
                title: "Soup".into(),
                ..NewRecipe::default()
            })
            .await
            .unwrap();
        let plan = uow
            .insert_meal_plan(NewMealPlan {
                name: "Week1".into(),
                created_by: "alice".into(),
                user_id: None,
            })
            .await
            .unwrap();
        uow.insert_slot(
            plan.id,
            NewSlot {
                recipe_id: recipe.id,
                meal_type: MealType::Lunch,
                meal_day: 2,
            },
        )
        .await
        .unwrap();

        assert!(uow.delete_meal_plan(plan.id).await.unwrap());
        assert!(uow.planned_recipes(&[plan.id]).await.unwrap().is_empty());
        assert!(!uow.delete_meal_plan(plan.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_the_owner_keeps_the_plan() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let alice = uow.insert_user(new_user("alice", Role::Nutritionist)).await.unwrap();
        let plan = uow
            .insert_meal_plan(NewMealPlan {
                name: "Week1".into(),
                created_by: "alice".into(),
                user_id: Some(alice.id),
            })
            .await
            .unwrap();
        assert!(uow.delete_user("alice").await.unwrap());
        let plan = uow.find_meal_plan(plan.id).await.unwrap().unwrap();
        assert_eq!(plan.user_id, None);
    }
}
