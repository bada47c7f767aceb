use sqlx::PgConnection;

use crate::{
    ingredients::repo_types::{Ingredient, IngredientPatch, NewIngredient, Nutrient},
    store::sql::PartialUpdate,
};

/// Selected through the `i` alias.
pub(crate) const INGREDIENT_COLUMNS: &str =
    "i.id, i.aisle, i.image, i.name, i.amount, i.unit, i.details";

const RETURNING: &str = "id, aisle, image, name, amount, unit, details";

pub async fn insert(conn: &mut PgConnection, ingredient: NewIngredient) -> sqlx::Result<Ingredient> {
    sqlx::query_as::<_, Ingredient>(&format!(
        r#"
        INSERT INTO ingredients (aisle, image, name, amount, unit, details)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {RETURNING}
        "#
    ))
    .bind(ingredient.aisle)
    .bind(ingredient.image)
    .bind(ingredient.name)
    .bind(ingredient.amount)
    .bind(ingredient.unit)
    .bind(ingredient.details)
    .fetch_one(&mut *conn)
    .await
}

pub async fn insert_nutrient(
    conn: &mut PgConnection,
    ingredient_id: i32,
    nutrient: Nutrient,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ingredient_nutrients (ingredient_id, name, amount, unit, percent_of_daily_needs)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(ingredient_id)
    .bind(nutrient.name)
    .bind(nutrient.amount)
    .bind(nutrient.unit)
    .bind(nutrient.percent_of_daily_needs)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn list(conn: &mut PgConnection) -> sqlx::Result<Vec<Ingredient>> {
    sqlx::query_as::<_, Ingredient>(&format!(
        "SELECT {INGREDIENT_COLUMNS} FROM ingredients i ORDER BY i.name"
    ))
    .fetch_all(&mut *conn)
    .await
}

pub async fn find(conn: &mut PgConnection, id: i32) -> sqlx::Result<Option<Ingredient>> {
    sqlx::query_as::<_, Ingredient>(&format!(
        "SELECT {INGREDIENT_COLUMNS} FROM ingredients i WHERE i.id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn nutrients(conn: &mut PgConnection, id: i32) -> sqlx::Result<Vec<Nutrient>> {
    sqlx::query_as::<_, Nutrient>(
        r#"
        SELECT name, amount, unit, percent_of_daily_needs
          FROM ingredient_nutrients
         WHERE ingredient_id = $1
         ORDER BY id
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn update(
    conn: &mut PgConnection,
    id: i32,
    patch: IngredientPatch,
) -> sqlx::Result<Option<Ingredient>> {
    let mut update = PartialUpdate::new("ingredients");
    update
        .set("aisle", patch.aisle)
        .set("image", patch.image)
        .set("name", patch.name)
        .set("amount", patch.amount)
        .set("unit", patch.unit)
        .set("details", patch.details);
    if update.is_empty() {
        return find(conn, id).await;
    }
    let mut qb = update.finish("id", id, RETURNING);
    qb.build_query_as::<Ingredient>().fetch_optional(&mut *conn).await
}

pub async fn delete(conn: &mut PgConnection, id: i32) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM ingredients WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(res.rows_affected() > 0)
}
