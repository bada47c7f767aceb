//! Meal-plan workflow: assembly, composition, and sharing with clients.
//!
//! Every operation runs in one unit of work. Writes that span several rows
//! (plan plus slots, share validation plus insert, slot and plan removal)
//! commit together or not at all.

use std::collections::{BTreeSet, HashMap};

use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    mealplans::repo_types::{
        is_valid_meal_day, MealPlan, MealPlanDetails, MealPlanPatch, MealPlanRecipe,
        MealPlanSummary, NewMealPlan, NewSlot, PlannedRecipe, Share, DAYS_PER_WEEK,
    },
    state::AppState,
    store::StoreError,
    users::repo_types::Role,
    validation::Violations,
};

const NAME_CONSTRAINT: &str = "meal_plans_name_key";
const SHARE_CONSTRAINT: &str = "shared_mealplans_plan_client_key";

#[derive(Debug, Clone)]
pub struct CreateMealPlan {
    pub name: String,
    pub created_by: String,
    pub user_id: Option<i32>,
    pub recipes: Vec<NewSlot>,
}

fn no_meal_plan(id: i32) -> AppError {
    AppError::not_found(format!("No meal plan: {id}"))
}

fn on_name_conflict(name: &str) -> impl FnOnce(StoreError) -> AppError + '_ {
    move |e| match e {
        StoreError::Conflict(c) if c == NAME_CONSTRAINT => AppError::DuplicateName(name.to_string()),
        other => other.into(),
    }
}

fn day_message() -> String {
    format!("must be between 1 and {DAYS_PER_WEEK}")
}

/// Groups associations under their plans, keeping the order of both inputs.
fn compose(plans: Vec<MealPlan>, planned: Vec<PlannedRecipe>) -> Vec<MealPlanDetails> {
    let mut by_plan: HashMap<i32, Vec<PlannedRecipe>> = HashMap::new();
    for p in planned {
        by_plan.entry(p.meal_plan_id).or_default().push(p);
    }
    plans
        .into_iter()
        .map(|plan| {
            let mut recipes = by_plan.remove(&plan.id).unwrap_or_default();
            recipes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
            MealPlanDetails { plan, recipes }
        })
        .collect()
}

pub async fn create_meal_plan(state: &AppState, input: CreateMealPlan) -> AppResult<MealPlan> {
    let mut v = Violations::new();
    let name = v.required("mealPlanName", Some(input.name.as_str()));
    let created_by = v.required("created_by", Some(input.created_by.as_str()));
    v.check(!input.recipes.is_empty(), "recipes", "at least one recipe is required");
    for (i, slot) in input.recipes.iter().enumerate() {
        v.check(
            is_valid_meal_day(slot.meal_day),
            &format!("recipes[{i}].meal_day"),
            day_message(),
        );
    }
    v.finish("meal plan")?;
    let (Some(name), Some(created_by)) = (name, created_by) else {
        return Err(AppError::bad_request("invalid meal plan"));
    };

    let mut uow = state.store.begin().await?;

    if uow.find_meal_plan_by_name(&name).await?.is_some() {
        warn!(%name, "duplicate meal plan name");
        return Err(AppError::DuplicateName(name));
    }

    let wanted: BTreeSet<i32> = input.recipes.iter().map(|s| s.recipe_id).collect();
    let wanted: Vec<i32> = wanted.into_iter().collect();
    let existing = uow.existing_recipe_ids(&wanted).await?;
    let missing: Vec<String> = wanted
        .iter()
        .filter(|id| !existing.contains(id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::not_found(format!("No recipe: {}", missing.join(", "))));
    }

    let plan = uow
        .insert_meal_plan(NewMealPlan {
            name: name.clone(),
            created_by,
            user_id: input.user_id,
        })
        .await
        .map_err(on_name_conflict(&name))?;
    for slot in &input.recipes {
        uow.insert_slot(plan.id, *slot).await?;
    }
    uow.commit().await?;

    info!(plan_id = plan.id, name = %plan.name, slots = input.recipes.len(), "meal plan created");
    Ok(plan)
}

pub async fn list_meal_plans(state: &AppState) -> AppResult<Vec<MealPlanSummary>> {
    let mut uow = state.store.begin().await?;
    Ok(uow.list_meal_plans().await?)
}

pub async fn get_meal_plan(state: &AppState, id: i32) -> AppResult<MealPlanDetails> {
    let mut uow = state.store.begin().await?;
    let plan = uow.find_meal_plan(id).await?.ok_or_else(|| no_meal_plan(id))?;
    let planned = uow.planned_recipes(&[id]).await?;
    let mut composed = compose(vec![plan], planned);
    composed.pop().ok_or_else(|| no_meal_plan(id))
}

pub async fn update_meal_plan(state: &AppState, id: i32, patch: MealPlanPatch) -> AppResult<MealPlan> {
    if patch.is_empty() {
        return Err(AppError::bad_request("No data to update"));
    }
    let mut v = Violations::new();
    if let Some(name) = &patch.name {
        v.check(!name.trim().is_empty(), "name", "must not be blank");
    }
    if let Some(created_by) = &patch.created_by {
        v.check(!created_by.trim().is_empty(), "created_by", "must not be blank");
    }
    v.finish("meal plan")?;

    let mut uow = state.store.begin().await?;
    if let Some(name) = &patch.name {
        if let Some(other) = uow.find_meal_plan_by_name(name).await? {
            if other.id != id {
                return Err(AppError::DuplicateName(name.clone()));
            }
        }
    }
    let name = patch.name.clone().unwrap_or_default();
    let plan = uow
        .update_meal_plan(id, patch)
        .await
        .map_err(on_name_conflict(&name))?
        .ok_or_else(|| no_meal_plan(id))?;
    uow.commit().await?;

    info!(plan_id = id, "meal plan updated");
    Ok(plan)
}

pub async fn add_recipe_to_meal_plan(
    state: &AppState,
    plan_id: i32,
    slot: NewSlot,
) -> AppResult<MealPlanRecipe> {
    let mut v = Violations::new();
    v.check(is_valid_meal_day(slot.meal_day), "meal_day", day_message());
    v.finish("meal plan recipe")?;

    let mut uow = state.store.begin().await?;
    uow.find_meal_plan(plan_id)
        .await?
        .ok_or_else(|| no_meal_plan(plan_id))?;
    uow.find_recipe(slot.recipe_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No recipe: {}", slot.recipe_id)))?;
    let row = uow.insert_slot(plan_id, slot).await?;
    uow.commit().await?;

    info!(plan_id, recipe_id = slot.recipe_id, meal_type = %slot.meal_type, meal_day = slot.meal_day, "recipe added to meal plan");
    Ok(row)
}

/// Removes every slot holding `recipe_id` in this plan only.
pub async fn remove_recipe_from_meal_plan(state: &AppState, plan_id: i32, recipe_id: i32) -> AppResult<u64> {
    let mut uow = state.store.begin().await?;
    let removed = uow.delete_slots_for_recipe(plan_id, recipe_id).await?;
    if removed == 0 {
        return Err(AppError::not_found(format!(
            "No recipe {recipe_id} in meal plan {plan_id}"
        )));
    }
    uow.commit().await?;

    info!(plan_id, recipe_id, removed, "recipe removed from meal plan");
    Ok(removed)
}

pub async fn remove_meal_plan(state: &AppState, id: i32) -> AppResult<()> {
    let mut uow = state.store.begin().await?;
    let slots = uow.delete_slots_for_plan(id).await?;
    if !uow.delete_meal_plan(id).await? {
        // dropping the unit of work discards the slot deletion
        return Err(no_meal_plan(id));
    }
    uow.commit().await?;

    info!(plan_id = id, slots, "meal plan removed");
    Ok(())
}

pub async fn share_meal_plan(
    state: &AppState,
    plan_id: i32,
    nutritionist_username: &str,
    client_username: &str,
) -> AppResult<String> {
    let mut uow = state.store.begin().await?;

    if uow.find_meal_plan(plan_id).await?.is_none() {
        return Err(AppError::not_found(format!(
            "Meal plan with id {plan_id} does not exist"
        )));
    }
    let nutritionist = uow
        .find_user_by_username(nutritionist_username)
        .await?
        .filter(|u| u.role == Role::Nutritionist)
        .ok_or_else(|| {
            AppError::not_found(format!(
                "Nutritionist with username {nutritionist_username} does not exist"
            ))
        })?;
    let client = uow
        .find_user_by_username(client_username)
        .await?
        .filter(|u| u.role == Role::Client)
        .ok_or_else(|| {
            AppError::not_found(format!("Client with username {client_username} does not exist"))
        })?;

    if uow.share_exists(plan_id, client.id).await? {
        warn!(plan_id, client = %client_username, "meal plan already shared");
        return Err(AppError::DuplicateShare);
    }
    uow.insert_share(Share {
        mealplan_id: plan_id,
        nutritionist_id: nutritionist.id,
        client_id: client.id,
    })
    .await
    .map_err(|e| match e {
        StoreError::Conflict(c) if c == SHARE_CONSTRAINT => AppError::DuplicateShare,
        other => other.into(),
    })?;
    uow.commit().await?;

    info!(plan_id, nutritionist = %nutritionist_username, client = %client_username, "meal plan shared");
    Ok(format!(
        "Meal plan {plan_id} is now shared with client {client_username} by nutritionist {nutritionist_username}"
    ))
}

/// Every plan shared with the client, composed with two queries regardless of count.
pub async fn get_shared_meal_plans(state: &AppState, client_username: &str) -> AppResult<Vec<MealPlanDetails>> {
    let mut uow = state.store.begin().await?;
    let client = uow
        .find_user_by_username(client_username)
        .await?
        .filter(|u| u.role == Role::Client)
        .ok_or_else(|| {
            AppError::not_found(format!("Client with username {client_username} does not exist"))
        })?;

    let plans = uow.shared_meal_plans(client.id).await?;
    if plans.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = plans.iter().map(|p| p.id).collect();
    let planned = uow.planned_recipes(&ids).await?;
    Ok(compose(plans, planned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        mealplans::repo_types::MealType,
        recipes::repo_types::NewRecipe,
        users::repo_types::NewUser,
    };

    async fn seed_user(state: &AppState, username: &str, role: Role) -> i32 {
        let mut uow = state.store.begin().await.unwrap();
        let user = uow
            .insert_user(NewUser {
                username: username.into(),
                password_hash: "hash".into(),
                first_name: "First".into(),
                last_name: "Last".into(),
                email: format!("{username}@example.com"),
                role,
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();
        user.id
    }

    async fn seed_recipe(state: &AppState, title: &str) -> i32 {
        let mut uow = state.store.begin().await.unwrap();
        let recipe = uow
            .insert_recipe(NewRecipe {
                title: title.into(),
                servings: 2,
                ..NewRecipe::default()
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();
        recipe.id
    }

    fn slot(recipe_id: i32, meal_type: MealType, meal_day: i32) -> NewSlot {
        NewSlot {
            recipe_id,
            meal_type,
            meal_day,
        }
    }

    fn week(name: &str, recipes: Vec<NewSlot>) -> CreateMealPlan {
        CreateMealPlan {
            name: name.into(),
            created_by: "alice".into(),
            user_id: None,
            recipes,
        }
    }

    async fn slot_count(state: &AppState, plan_id: i32) -> usize {
        let mut uow = state.store.begin().await.unwrap();
        uow.planned_recipes(&[plan_id]).await.unwrap().len()
    }

    #[tokio::test]
    async fn create_then_get_composes_recipes() {
        let state = AppState::fake();
        let soup = seed_recipe(&state, "Soup").await;
        let plan = create_meal_plan(&state, week("Week1", vec![slot(soup, MealType::Breakfast, 1)]))
            .await
            .unwrap();

        let details = get_meal_plan(&state, plan.id).await.unwrap();
        assert_eq!(details.plan.name, "Week1");
        assert_eq!(details.recipes.len(), 1);
        assert_eq!(details.recipes[0].recipe_id, soup);
        assert_eq!(details.recipes[0].recipe.title, "Soup");
    }

    #[tokio::test]
    async fn duplicate_name_fails_and_writes_nothing() {
        let state = AppState::fake();
        let soup = seed_recipe(&state, "Soup").await;
        let first = create_meal_plan(&state, week("Week1", vec![slot(soup, MealType::Lunch, 2)]))
            .await
            .unwrap();

        let err = create_meal_plan(
            &state,
            week(
                "Week1",
                vec![slot(soup, MealType::Dinner, 3), slot(soup, MealType::Snack, 4)],
            ),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::DuplicateName(ref n) if n == "Week1"));
        assert_eq!(list_meal_plans(&state).await.unwrap().len(), 1);
        assert_eq!(slot_count(&state, first.id).await, 1);
    }

    #[tokio::test]
    async fn create_validates_everything_at_once() {
        let state = AppState::fake();
        let err = create_meal_plan(
            &state,
            CreateMealPlan {
                name: "  ".into(),
                created_by: String::new(),
                user_id: None,
                recipes: vec![slot(1, MealType::Lunch, 0), slot(1, MealType::Lunch, 8)],
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        let fields: Vec<_> = err.details().iter().map(|d| d.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["mealPlanName", "created_by", "recipes[0].meal_day", "recipes[1].meal_day"]
        );
    }

    #[tokio::test]
    async fn empty_recipe_list_is_rejected() {
        let state = AppState::fake();
        let err = create_meal_plan(&state, week("Empty", vec![])).await.unwrap_err();
        assert_eq!(err.details()[0].field, "recipes");
    }

    #[tokio::test]
    async fn unknown_recipe_rolls_back_the_plan() {
        let state = AppState::fake();
        let soup = seed_recipe(&state, "Soup").await;
        let err = create_meal_plan(
            &state,
            week("Week1", vec![slot(soup, MealType::Lunch, 1), slot(99, MealType::Lunch, 2)]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(list_meal_plans(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn added_recipe_appears_once_in_slot_order() {
        let state = AppState::fake();
        let soup = seed_recipe(&state, "Soup").await;
        let salad = seed_recipe(&state, "Salad").await;
        let plan = create_meal_plan(
            &state,
            week(
                "Week1",
                vec![slot(soup, MealType::Snack, 1), slot(soup, MealType::Breakfast, 3)],
            ),
        )
        .await
        .unwrap();

        add_recipe_to_meal_plan(&state, plan.id, slot(salad, MealType::Dinner, 2))
            .await
            .unwrap();

        let details = get_meal_plan(&state, plan.id).await.unwrap();
        let order: Vec<_> = details
            .recipes
            .iter()
            .map(|r| (r.meal_type.as_str(), r.meal_day, r.recipe_id))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Breakfast", 3, soup),
                ("Dinner", 2, salad),
                ("Snack", 1, soup)
            ]
        );
        assert_eq!(details.recipes.iter().filter(|r| r.recipe_id == salad).count(), 1);
    }

    #[tokio::test]
    async fn slots_may_hold_several_recipes() {
        let state = AppState::fake();
        let soup = seed_recipe(&state, "Soup").await;
        let salad = seed_recipe(&state, "Salad").await;
        let plan = create_meal_plan(&state, week("Week1", vec![slot(soup, MealType::Lunch, 1)]))
            .await
            .unwrap();
        add_recipe_to_meal_plan(&state, plan.id, slot(salad, MealType::Lunch, 1))
            .await
            .unwrap();
        assert_eq!(slot_count(&state, plan.id).await, 2);
    }

    #[tokio::test]
    async fn add_recipe_checks_plan_recipe_and_day() {
        let state = AppState::fake();
        let soup = seed_recipe(&state, "Soup").await;
        let plan = create_meal_plan(&state, week("Week1", vec![slot(soup, MealType::Lunch, 1)]))
            .await
            .unwrap();

        let err = add_recipe_to_meal_plan(&state, 404, slot(soup, MealType::Lunch, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = add_recipe_to_meal_plan(&state, plan.id, slot(404, MealType::Lunch, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = add_recipe_to_meal_plan(&state, plan.id, slot(soup, MealType::Lunch, 9))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn recipe_removal_is_scoped_to_the_plan() {
        let state = AppState::fake();
        let soup = seed_recipe(&state, "Soup").await;
        let a = create_meal_plan(
            &state,
            week("A", vec![slot(soup, MealType::Lunch, 1), slot(soup, MealType::Dinner, 1)]),
        )
        .await
        .unwrap();
        let b = create_meal_plan(&state, week("B", vec![slot(soup, MealType::Lunch, 1)]))
            .await
            .unwrap();

        assert_eq!(remove_recipe_from_meal_plan(&state, a.id, soup).await.unwrap(), 2);
        assert_eq!(slot_count(&state, a.id).await, 0);
        assert_eq!(slot_count(&state, b.id).await, 1);

        let err = remove_recipe_from_meal_plan(&state, a.id, soup).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn removing_a_plan_removes_its_slots() {
        let state = AppState::fake();
        let soup = seed_recipe(&state, "Soup").await;
        let plan = create_meal_plan(&state, week("Week1", vec![slot(soup, MealType::Lunch, 1)]))
            .await
            .unwrap();

        remove_meal_plan(&state, plan.id).await.unwrap();
        assert_eq!(slot_count(&state, plan.id).await, 0);
        let err = get_meal_plan(&state, plan.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = remove_meal_plan(&state, plan.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(m) if m == format!("No meal plan: {}", plan.id)));
    }

    #[tokio::test]
    async fn update_merges_and_guards_names() {
        let state = AppState::fake();
        let soup = seed_recipe(&state, "Soup").await;
        let a = create_meal_plan(&state, week("A", vec![slot(soup, MealType::Lunch, 1)]))
            .await
            .unwrap();
        create_meal_plan(&state, week("B", vec![slot(soup, MealType::Lunch, 1)]))
            .await
            .unwrap();

        let updated = update_meal_plan(
            &state,
            a.id,
            MealPlanPatch {
                name: Some("A2".into()),
                created_by: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "A2");
        assert_eq!(updated.created_by, "alice");

        let err = update_meal_plan(
            &state,
            a.id,
            MealPlanPatch {
                name: Some("B".into()),
                created_by: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::DuplicateName(_)));

        let err = update_meal_plan(&state, a.id, MealPlanPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let err = update_meal_plan(
            &state,
            999,
            MealPlanPatch {
                created_by: Some("bob".into()),
                name: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn second_share_is_a_duplicate() {
        let state = AppState::fake();
        seed_user(&state, "alice", Role::Nutritionist).await;
        let bob = seed_user(&state, "bob", Role::Client).await;
        let soup = seed_recipe(&state, "Soup").await;
        let plan = create_meal_plan(&state, week("Week1", vec![slot(soup, MealType::Lunch, 1)]))
            .await
            .unwrap();

        let msg = share_meal_plan(&state, plan.id, "alice", "bob").await.unwrap();
        assert!(msg.contains("alice") && msg.contains("bob"));

        let err = share_meal_plan(&state, plan.id, "alice", "bob").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateShare));

        let mut uow = state.store.begin().await.unwrap();
        assert_eq!(uow.shared_meal_plans(bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn share_validates_each_party() {
        let state = AppState::fake();
        seed_user(&state, "alice", Role::Nutritionist).await;
        seed_user(&state, "bob", Role::Client).await;
        let soup = seed_recipe(&state, "Soup").await;
        let plan = create_meal_plan(&state, week("Week1", vec![slot(soup, MealType::Lunch, 1)]))
            .await
            .unwrap();

        let err = share_meal_plan(&state, 999, "alice", "bob").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m.starts_with("Meal plan")));

        let err = share_meal_plan(&state, plan.id, "bob", "bob").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m.starts_with("Nutritionist")));

        let err = share_meal_plan(&state, plan.id, "alice", "alice").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m.starts_with("Client")));

        let err = share_meal_plan(&state, plan.id, "alice", "nobody").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m.starts_with("Client")));
    }

    #[tokio::test]
    async fn shared_plans_are_fully_composed() {
        let state = AppState::fake();
        seed_user(&state, "alice", Role::Nutritionist).await;
        seed_user(&state, "bob", Role::Client).await;
        seed_user(&state, "carol", Role::Client).await;
        let soup = seed_recipe(&state, "Soup").await;
        let salad = seed_recipe(&state, "Salad").await;
        let w1 = create_meal_plan(&state, week("Week1", vec![slot(soup, MealType::Breakfast, 1)]))
            .await
            .unwrap();
        let w2 = create_meal_plan(
            &state,
            week("Week2", vec![slot(salad, MealType::Lunch, 2), slot(soup, MealType::Dinner, 2)]),
        )
        .await
        .unwrap();
        share_meal_plan(&state, w1.id, "alice", "bob").await.unwrap();
        share_meal_plan(&state, w2.id, "alice", "bob").await.unwrap();
        share_meal_plan(&state, w2.id, "alice", "carol").await.unwrap();

        let shared = get_shared_meal_plans(&state, "bob").await.unwrap();
        let names: Vec<_> = shared.iter().map(|p| p.plan.name.as_str()).collect();
        assert_eq!(names, vec!["Week1", "Week2"]);
        assert_eq!(shared[0].recipes.len(), 1);
        assert_eq!(shared[1].recipes.len(), 2);
        assert!(shared[1].recipes.iter().all(|r| r.meal_plan_id == w2.id));

        assert!(get_shared_meal_plans(&state, "alice").await.is_err());
        assert!(get_shared_meal_plans(&state, "nobody").await.is_err());
    }
}
