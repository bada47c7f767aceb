use sqlx::PgConnection;

use crate::{
    ingredients::{
        repo::INGREDIENT_COLUMNS,
        repo_types::{Ingredient, Nutrient},
    },
    recipes::repo_types::{Instruction, NewRecipe, Recipe, RecipePatch},
    store::sql::PartialUpdate,
};

/// Selected through the `r` alias.
pub(crate) const RECIPE_COLUMNS: &str = "r.id, r.vegetarian, r.vegan, r.dairy_free, \
     r.weight_watcher_points, r.credits_text, r.title, r.ready_in_minutes, r.servings, \
     r.source_url, r.image, r.image_type, r.dish_types, r.diets, r.summary";

const RETURNING: &str = "id, vegetarian, vegan, dairy_free, weight_watcher_points, credits_text, \
     title, ready_in_minutes, servings, source_url, image, image_type, dish_types, diets, summary";

pub async fn insert(conn: &mut PgConnection, recipe: NewRecipe) -> sqlx::Result<Recipe> {
    sqlx::query_as::<_, Recipe>(&format!(
        r#"
        INSERT INTO recipes (vegetarian, vegan, dairy_free, weight_watcher_points, credits_text,
                             title, ready_in_minutes, servings, source_url, image, image_type,
                             dish_types, diets, summary)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING {RETURNING}
        "#
    ))
    .bind(recipe.vegetarian)
    .bind(recipe.vegan)
    .bind(recipe.dairy_free)
    .bind(recipe.weight_watcher_points)
    .bind(recipe.credits_text)
    .bind(recipe.title)
    .bind(recipe.ready_in_minutes)
    .bind(recipe.servings)
    .bind(recipe.source_url)
    .bind(recipe.image)
    .bind(recipe.image_type)
    .bind(recipe.dish_types)
    .bind(recipe.diets)
    .bind(recipe.summary)
    .fetch_one(&mut *conn)
    .await
}

pub async fn insert_ingredient_link(
    conn: &mut PgConnection,
    recipe_id: i32,
    ingredient_id: i32,
) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO recipe_ingredients (recipe_id, ingredient_id) VALUES ($1, $2)")
        .bind(recipe_id)
        .bind(ingredient_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn insert_nutrient(
    conn: &mut PgConnection,
    recipe_id: i32,
    nutrient: Nutrient,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO recipe_nutrients (recipe_id, name, amount, unit, percent_of_daily_needs)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(recipe_id)
    .bind(nutrient.name)
    .bind(nutrient.amount)
    .bind(nutrient.unit)
    .bind(nutrient.percent_of_daily_needs)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_instruction(
    conn: &mut PgConnection,
    recipe_id: i32,
    instruction: Instruction,
) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO instructions (recipe_id, number, step) VALUES ($1, $2, $3)")
        .bind(recipe_id)
        .bind(instruction.number)
        .bind(instruction.step)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn list(conn: &mut PgConnection) -> sqlx::Result<Vec<Recipe>> {
    sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes r ORDER BY r.title"
    ))
    .fetch_all(&mut *conn)
    .await
}

pub async fn find(conn: &mut PgConnection, id: i32) -> sqlx::Result<Option<Recipe>> {
    sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn existing_ids(conn: &mut PgConnection, ids: &[i32]) -> sqlx::Result<Vec<i32>> {
    sqlx::query_scalar::<_, i32>("SELECT id FROM recipes WHERE id = ANY($1) ORDER BY id")
        .bind(ids)
        .fetch_all(&mut *conn)
        .await
}

pub async fn ingredients(conn: &mut PgConnection, id: i32) -> sqlx::Result<Vec<Ingredient>> {
    sqlx::query_as::<_, Ingredient>(&format!(
        r#"
        SELECT {INGREDIENT_COLUMNS}
          FROM recipe_ingredients ri
          JOIN ingredients i ON ri.ingredient_id = i.id
         WHERE ri.recipe_id = $1
         ORDER BY i.name
        "#
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn nutrients(conn: &mut PgConnection, id: i32) -> sqlx::Result<Vec<Nutrient>> {
    sqlx::query_as::<_, Nutrient>(
        r#"
        SELECT name, amount, unit, percent_of_daily_needs
          FROM recipe_nutrients
         WHERE recipe_id = $1
         ORDER BY id
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn instructions(conn: &mut PgConnection, id: i32) -> sqlx::Result<Vec<Instruction>> {
    sqlx::query_as::<_, Instruction>(
        "SELECT number, step FROM instructions WHERE recipe_id = $1 ORDER BY number",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn update(
    conn: &mut PgConnection,
    id: i32,
    patch: RecipePatch,
) -> sqlx::Result<Option<Recipe>> {
    let mut update = PartialUpdate::new("recipes");
    update
        .set("vegetarian", patch.vegetarian)
        .set("vegan", patch.vegan)
        .set("dairy_free", patch.dairy_free)
        .set("weight_watcher_points", patch.weight_watcher_points)
        .set("credits_text", patch.credits_text)
        .set("title", patch.title)
        .set("ready_in_minutes", patch.ready_in_minutes)
        .set("servings", patch.servings)
        .set("source_url", patch.source_url)
        .set("image", patch.image)
        .set("image_type", patch.image_type)
        .set("dish_types", patch.dish_types)
        .set("diets", patch.diets)
        .set("summary", patch.summary);
    if update.is_empty() {
        return find(conn, id).await;
    }
    let mut qb = update.finish("id", id, RETURNING);
    qb.build_query_as::<Recipe>().fetch_optional(&mut *conn).await
}

pub async fn delete(conn: &mut PgConnection, id: i32) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(res.rows_affected() > 0)
}
