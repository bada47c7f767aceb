use sqlx::PgConnection;

use crate::{
    mealplans::repo_types::{
        MealPlan, MealPlanPatch, MealPlanRecipe, MealPlanSummary, NewMealPlan, NewSlot,
        PlannedRecipe, Share,
    },
    recipes::repo::RECIPE_COLUMNS,
    store::sql::PartialUpdate,
};

const PLAN_COLUMNS: &str = "id, name, created_by, user_id";

pub async fn insert(conn: &mut PgConnection, plan: NewMealPlan) -> sqlx::Result<MealPlan> {
    sqlx::query_as::<_, MealPlan>(&format!(
        r#"
        INSERT INTO meal_plans (name, created_by, user_id)
        VALUES ($1, $2, $3)
        RETURNING {PLAN_COLUMNS}
        "#
    ))
    .bind(plan.name)
    .bind(plan.created_by)
    .bind(plan.user_id)
    .fetch_one(&mut *conn)
    .await
}

pub async fn insert_slot(
    conn: &mut PgConnection,
    meal_plan_id: i32,
    slot: NewSlot,
) -> sqlx::Result<MealPlanRecipe> {
    sqlx::query_as::<_, MealPlanRecipe>(
        r#"
        INSERT INTO meal_plan_recipes (meal_plan_id, recipe_id, meal_type, meal_day)
        VALUES ($1, $2, $3, $4)
        RETURNING id, meal_plan_id, recipe_id, meal_type, meal_day
        "#,
    )
    .bind(meal_plan_id)
    .bind(slot.recipe_id)
    .bind(slot.meal_type.as_str())
    .bind(slot.meal_day)
    .fetch_one(&mut *conn)
    .await
}

pub async fn list(conn: &mut PgConnection) -> sqlx::Result<Vec<MealPlanSummary>> {
    sqlx::query_as::<_, MealPlanSummary>("SELECT id, name, created_by FROM meal_plans ORDER BY name")
        .fetch_all(&mut *conn)
        .await
}

pub async fn find(conn: &mut PgConnection, id: i32) -> sqlx::Result<Option<MealPlan>> {
    sqlx::query_as::<_, MealPlan>(&format!("SELECT {PLAN_COLUMNS} FROM meal_plans WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_by_name(conn: &mut PgConnection, name: &str) -> sqlx::Result<Option<MealPlan>> {
    sqlx::query_as::<_, MealPlan>(&format!(
        "SELECT {PLAN_COLUMNS} FROM meal_plans WHERE name = $1"
    ))
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn planned_recipes(
    conn: &mut PgConnection,
    plan_ids: &[i32],
) -> sqlx::Result<Vec<PlannedRecipe>> {
    sqlx::query_as::<_, PlannedRecipe>(&format!(
        r#"
        SELECT mpr.id AS slot_id,
               mpr.meal_plan_id,
               mpr.recipe_id,
               mpr.meal_type,
               mpr.meal_day,
               {RECIPE_COLUMNS}
          FROM meal_plan_recipes mpr
          JOIN recipes r ON mpr.recipe_id = r.id
         WHERE mpr.meal_plan_id = ANY($1)
         ORDER BY mpr.meal_plan_id, mpr.meal_type, mpr.meal_day, mpr.id
        "#
    ))
    .bind(plan_ids)
    .fetch_all(&mut *conn)
    .await
}

pub async fn update(
    conn: &mut PgConnection,
    id: i32,
    patch: MealPlanPatch,
) -> sqlx::Result<Option<MealPlan>> {
    let mut update = PartialUpdate::new("meal_plans");
    update
        .set("name", patch.name)
        .set("created_by", patch.created_by);
    if update.is_empty() {
        return find(conn, id).await;
    }
    let mut qb = update.finish("id", id, PLAN_COLUMNS);
    qb.build_query_as::<MealPlan>().fetch_optional(&mut *conn).await
}

pub async fn delete_slots_for_recipe(
    conn: &mut PgConnection,
    meal_plan_id: i32,
    recipe_id: i32,
) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM meal_plan_recipes WHERE meal_plan_id = $1 AND recipe_id = $2")
        .bind(meal_plan_id)
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_slots_for_plan(conn: &mut PgConnection, meal_plan_id: i32) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM meal_plan_recipes WHERE meal_plan_id = $1")
        .bind(meal_plan_id)
        .execute(&mut *conn)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete(conn: &mut PgConnection, id: i32) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM meal_plans WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(res.rows_affected() > 0)
}

// ---- sharing ----

pub async fn share_exists(conn: &mut PgConnection, meal_plan_id: i32, client_id: i32) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM shared_mealplans
             WHERE mealplan_id = $1 AND client_id = $2
        )
        "#,
    )
    .bind(meal_plan_id)
    .bind(client_id)
    .fetch_one(&mut *conn)
    .await
}

pub async fn insert_share(conn: &mut PgConnection, share: Share) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO shared_mealplans (mealplan_id, nutritionist_id, client_id) VALUES ($1, $2, $3)",
    )
    .bind(share.mealplan_id)
    .bind(share.nutritionist_id)
    .bind(share.client_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn shared_with_client(conn: &mut PgConnection, client_id: i32) -> sqlx::Result<Vec<MealPlan>> {
    sqlx::query_as::<_, MealPlan>(
        r#"
        SELECT m.id, m.name, m.created_by, m.user_id
          FROM shared_mealplans s
          JOIN meal_plans m ON s.mealplan_id = m.id
         WHERE s.client_id = $1
         ORDER BY m.name
        "#,
    )
    .bind(client_id)
    .fetch_all(&mut *conn)
    .await
}
