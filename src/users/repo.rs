use sqlx::PgConnection;

use crate::{
    ingredients::{repo::INGREDIENT_COLUMNS, repo_types::Ingredient},
    mealplans::repo_types::MealPlanSummary,
    recipes::{repo::RECIPE_COLUMNS, repo_types::Recipe},
    store::sql::PartialUpdate,
    users::repo_types::{NewUser, SavedKind, User, UserPatch},
};

const USER_COLUMNS: &str = "id, username, password, first_name, last_name, email, role";

pub async fn insert(conn: &mut PgConnection, user: NewUser) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, password, first_name, last_name, email, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user.username)
    .bind(user.password_hash)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.email)
    .bind(user.role.as_str())
    .fetch_one(&mut *conn)
    .await
}

pub async fn list(conn: &mut PgConnection) -> sqlx::Result<Vec<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY username"
    ))
    .fetch_all(&mut *conn)
    .await
}

pub async fn find_by_username(conn: &mut PgConnection, username: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
    ))
    .bind(username)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn update(
    conn: &mut PgConnection,
    username: &str,
    patch: UserPatch,
) -> sqlx::Result<Option<User>> {
    let mut update = PartialUpdate::new("users");
    update
        .set("first_name", patch.first_name)
        .set("last_name", patch.last_name)
        .set("email", patch.email)
        .set("password", patch.password_hash)
        .set("role", patch.role.map(|r| r.as_str().to_string()));
    if update.is_empty() {
        return find_by_username(conn, username).await;
    }
    let mut qb = update.finish("username", username.to_string(), USER_COLUMNS);
    qb.build_query_as::<User>().fetch_optional(&mut *conn).await
}

pub async fn delete(conn: &mut PgConnection, username: &str) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(username)
        .execute(&mut *conn)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn client_link_exists(
    conn: &mut PgConnection,
    client_id: i32,
    nutritionist_id: i32,
) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM client_nutritionist
             WHERE client_id = $1 AND nutritionist_id = $2
        )
        "#,
    )
    .bind(client_id)
    .bind(nutritionist_id)
    .fetch_one(&mut *conn)
    .await
}

/// True when the user appears in a client link or a share, on either side.
pub async fn role_references_exist(conn: &mut PgConnection, user_id: i32) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM client_nutritionist
             WHERE client_id = $1 OR nutritionist_id = $1
        ) OR EXISTS (
            SELECT 1 FROM shared_mealplans
             WHERE client_id = $1 OR nutritionist_id = $1
        )
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await
}

pub async fn insert_client_link(
    conn: &mut PgConnection,
    client_id: i32,
    nutritionist_id: i32,
) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO client_nutritionist (client_id, nutritionist_id) VALUES ($1, $2)")
        .bind(client_id)
        .bind(nutritionist_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// ---- saved items ----

pub async fn saved_exists(
    conn: &mut PgConnection,
    kind: SavedKind,
    user_id: i32,
    item_id: i32,
) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND {} = $2)",
        kind.table(),
        kind.column()
    ))
    .bind(user_id)
    .bind(item_id)
    .fetch_one(&mut *conn)
    .await
}

pub async fn insert_saved(
    conn: &mut PgConnection,
    kind: SavedKind,
    user_id: i32,
    item_id: i32,
) -> sqlx::Result<()> {
    sqlx::query(&format!(
        "INSERT INTO {} (user_id, {}) VALUES ($1, $2)",
        kind.table(),
        kind.column()
    ))
    .bind(user_id)
    .bind(item_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn delete_saved(
    conn: &mut PgConnection,
    kind: SavedKind,
    user_id: i32,
    item_id: i32,
) -> sqlx::Result<bool> {
    let res = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
        kind.table(),
        kind.column()
    ))
    .bind(user_id)
    .bind(item_id)
    .execute(&mut *conn)
    .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn saved_ingredients(conn: &mut PgConnection, user_id: i32) -> sqlx::Result<Vec<Ingredient>> {
    sqlx::query_as::<_, Ingredient>(&format!(
        r#"
        SELECT {INGREDIENT_COLUMNS}
          FROM ingredients i
          JOIN user_saved_ingredients usi ON i.id = usi.ingredient_id
         WHERE usi.user_id = $1
         ORDER BY i.name
        "#
    ))
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn saved_recipes(conn: &mut PgConnection, user_id: i32) -> sqlx::Result<Vec<Recipe>> {
    sqlx::query_as::<_, Recipe>(&format!(
        r#"
        SELECT {RECIPE_COLUMNS}
          FROM recipes r
          JOIN user_saved_recipes usr ON r.id = usr.recipe_id
         WHERE usr.user_id = $1
         ORDER BY r.title
        "#
    ))
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn saved_meal_plans(
    conn: &mut PgConnection,
    user_id: i32,
) -> sqlx::Result<Vec<MealPlanSummary>> {
    sqlx::query_as::<_, MealPlanSummary>(
        r#"
        SELECT m.id, m.name, m.created_by
          FROM meal_plans m
          JOIN user_saved_meal_plans usm ON m.id = usm.meal_plan_id
         WHERE usm.user_id = $1
         ORDER BY m.name
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
}
