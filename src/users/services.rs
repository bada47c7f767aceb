use tracing::{info, warn};

use crate::{
    auth::password::{hash_password, verify_password},
    error::{AppError, AppResult},
    ingredients::repo_types::Ingredient,
    mealplans::repo_types::MealPlanSummary,
    recipes::repo_types::Recipe,
    state::AppState,
    store::{StoreError, UnitOfWork},
    users::{
        dto::{RegisterUser, UserUpdate},
        repo_types::{NewUser, Role, SavedKind, User, UserPatch},
    },
};

fn no_user(username: &str) -> AppError {
    AppError::not_found(format!("No user: {username}"))
}

fn duplicate_username(username: &str) -> impl FnOnce(StoreError) -> AppError + '_ {
    move |e| match e {
        StoreError::Conflict(_) => AppError::Duplicate(format!("Duplicate username: {username}")),
        other => other.into(),
    }
}

async fn insert_new_user(
    uow: &mut dyn UnitOfWork,
    input: RegisterUser,
    fast_hashing: bool,
) -> AppResult<User> {
    if uow.find_user_by_username(&input.username).await?.is_some() {
        warn!(username = %input.username, "username taken");
        return Err(AppError::Duplicate(format!(
            "Duplicate username: {}",
            input.username
        )));
    }
    let password_hash = hash_password(&input.password, fast_hashing)?;
    let username = input.username.clone();
    uow.insert_user(NewUser {
        username: input.username,
        password_hash,
        first_name: input.first_name,
        last_name: input.last_name,
        email: input.email,
        role: input.role,
    })
    .await
    .map_err(duplicate_username(&username))
}

async fn user_by_name(uow: &mut dyn UnitOfWork, username: &str) -> AppResult<User> {
    uow.find_user_by_username(username)
        .await?
        .ok_or_else(|| no_user(username))
}

pub async fn register(state: &AppState, input: RegisterUser) -> AppResult<User> {
    let mut uow = state.store.begin().await?;
    let user = insert_new_user(uow.as_mut(), input, state.config.fast_password_hashing).await?;
    uow.commit().await?;
    info!(user_id = user.id, username = %user.username, role = %user.role, "user registered");
    Ok(user)
}

/// Registers a client and links it to `nutritionist_username` in one transaction.
pub async fn register_client(
    state: &AppState,
    input: RegisterUser,
    nutritionist_username: &str,
) -> AppResult<String> {
    let mut uow = state.store.begin().await?;
    let nutritionist = uow
        .find_user_by_username(nutritionist_username)
        .await?
        .filter(|u| u.role == Role::Nutritionist)
        .ok_or_else(|| {
            AppError::bad_request(format!(
                "Nutritionist with username {nutritionist_username} does not exist"
            ))
        })?;

    let client = insert_new_user(
        uow.as_mut(),
        RegisterUser {
            role: Role::Client,
            ..input
        },
        state.config.fast_password_hashing,
    )
    .await?;

    if uow.client_link_exists(client.id, nutritionist.id).await? {
        return Err(AppError::Duplicate(
            "Client is already linked to this nutritionist".into(),
        ));
    }
    uow.insert_client_link(client.id, nutritionist.id).await?;
    uow.commit().await?;

    info!(client = %client.username, nutritionist = %nutritionist.username, "client registered");
    Ok(format!(
        "Client {} registered and linked to nutritionist {}",
        client.username, nutritionist.username
    ))
}

pub async fn authenticate(state: &AppState, username: &str, password: &str) -> AppResult<User> {
    let invalid = || AppError::Unauthorized("Invalid username/password".into());
    let found = {
        let mut uow = state.store.begin().await?;
        uow.find_user_by_username(username).await?
    };
    let user = match found {
        Some(u) => u,
        None => {
            warn!(%username, "login unknown username");
            return Err(invalid());
        }
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(%username, user_id = user.id, "login invalid password");
        return Err(invalid());
    }
    info!(user_id = user.id, %username, "user logged in");
    Ok(user)
}

pub async fn list_users(state: &AppState) -> AppResult<Vec<User>> {
    let mut uow = state.store.begin().await?;
    Ok(uow.list_users().await?)
}

pub async fn get_user(state: &AppState, username: &str) -> AppResult<User> {
    let mut uow = state.store.begin().await?;
    user_by_name(uow.as_mut(), username).await
}

pub async fn update_user(state: &AppState, username: &str, update: UserUpdate) -> AppResult<User> {
    let password_hash = match &update.password {
        Some(p) => Some(hash_password(p, state.config.fast_password_hashing)?),
        None => None,
    };
    let patch = UserPatch {
        first_name: update.first_name,
        last_name: update.last_name,
        email: update.email,
        password_hash,
        role: update.role,
    };
    if patch.is_empty() {
        return Err(AppError::bad_request("No data to update"));
    }

    let mut uow = state.store.begin().await?;
    if let Some(role) = patch.role {
        let current = user_by_name(uow.as_mut(), username).await?;
        if current.role != role && uow.role_references_exist(current.id).await? {
            warn!(user_id = current.id, from = ?current.role, to = ?role, "role change blocked");
            return Err(AppError::bad_request(
                "User has shares or links under their current role",
            ));
        }
    }
    let user = uow
        .update_user(username, patch)
        .await?
        .ok_or_else(|| no_user(username))?;
    uow.commit().await?;

    info!(user_id = user.id, %username, "user updated");
    Ok(user)
}

pub async fn remove_user(state: &AppState, username: &str) -> AppResult<()> {
    let mut uow = state.store.begin().await?;
    if !uow.delete_user(username).await? {
        return Err(no_user(username));
    }
    uow.commit().await?;
    info!(%username, "user removed");
    Ok(())
}

// ---- saved items ----

async fn item_exists(uow: &mut dyn UnitOfWork, kind: SavedKind, id: i32) -> AppResult<bool> {
    Ok(match kind {
        SavedKind::Ingredient => uow.find_ingredient(id).await?.is_some(),
        SavedKind::Recipe => uow.find_recipe(id).await?.is_some(),
        SavedKind::MealPlan => uow.find_meal_plan(id).await?.is_some(),
    })
}

async fn require_item(uow: &mut dyn UnitOfWork, kind: SavedKind, id: i32) -> AppResult<()> {
    if item_exists(uow, kind, id).await? {
        Ok(())
    } else {
        Err(AppError::not_found(format!(
            "{} with id {id} does not exist",
            kind.label()
        )))
    }
}

pub async fn save_item(state: &AppState, username: &str, kind: SavedKind, item_id: i32) -> AppResult<()> {
    let mut uow = state.store.begin().await?;
    let user = user_by_name(uow.as_mut(), username).await?;
    require_item(uow.as_mut(), kind, item_id).await?;

    let already = || AppError::Duplicate(format!("{} already saved", kind.label()));
    if uow.saved_exists(kind, user.id, item_id).await? {
        return Err(already());
    }
    uow.insert_saved(kind, user.id, item_id)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => already(),
            other => other.into(),
        })?;
    uow.commit().await?;

    info!(%username, kind = kind.label(), item_id, "item saved");
    Ok(())
}

pub async fn unsave_item(state: &AppState, username: &str, kind: SavedKind, item_id: i32) -> AppResult<()> {
    let mut uow = state.store.begin().await?;
    let user = user_by_name(uow.as_mut(), username).await?;
    require_item(uow.as_mut(), kind, item_id).await?;

    if !uow.delete_saved(kind, user.id, item_id).await? {
        return Err(AppError::bad_request(format!(
            "{} not saved by this user",
            kind.label()
        )));
    }
    uow.commit().await?;

    info!(%username, kind = kind.label(), item_id, "item unsaved");
    Ok(())
}

pub async fn saved_ingredients(state: &AppState, username: &str) -> AppResult<Vec<Ingredient>> {
    let mut uow = state.store.begin().await?;
    let user = user_by_name(uow.as_mut(), username).await?;
    Ok(uow.saved_ingredients(user.id).await?)
}

pub async fn saved_recipes(state: &AppState, username: &str) -> AppResult<Vec<Recipe>> {
    let mut uow = state.store.begin().await?;
    let user = user_by_name(uow.as_mut(), username).await?;
    Ok(uow.saved_recipes(user.id).await?)
}

pub async fn saved_meal_plans(state: &AppState, username: &str) -> AppResult<Vec<MealPlanSummary>> {
    let mut uow = state.store.begin().await?;
    let user = user_by_name(uow.as_mut(), username).await?;
    Ok(uow.saved_meal_plans(user.id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        ingredients::repo_types::NewIngredient,
        mealplans::repo_types::{NewMealPlan, Share},
    };

    fn person(username: &str, role: Role) -> RegisterUser {
        RegisterUser {
            username: username.into(),
            password: "password1".into(),
            first_name: "First".into(),
            last_name: "Last".into(),
            email: format!("{username}@example.com"),
            role,
        }
    }

    async fn seed_ingredient(state: &AppState, name: &str) -> i32 {
        let mut uow = state.store.begin().await.unwrap();
        let row = uow
            .insert_ingredient(NewIngredient {
                aisle: "Produce".into(),
                image: String::new(),
                name: name.into(),
                amount: 1.0,
                unit: "piece".into(),
                details: String::new(),
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();
        row.id
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let state = AppState::fake();
        register(&state, person("alice", Role::Nutritionist)).await.unwrap();

        let user = authenticate(&state, "alice", "password1").await.unwrap();
        assert_eq!(user.role, Role::Nutritionist);
        assert_ne!(user.password_hash, "password1");

        let err = authenticate(&state, "alice", "wrong").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        let err = authenticate(&state, "nobody", "password1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_bad_request() {
        let state = AppState::fake();
        register(&state, person("alice", Role::Nutritionist)).await.unwrap();
        let err = register(&state, person("alice", Role::Client)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.to_string(), "Duplicate username: alice");
    }

    #[tokio::test]
    async fn client_registration_links_or_rolls_back() {
        let state = AppState::fake();
        register(&state, person("alice", Role::Nutritionist)).await.unwrap();

        let msg = register_client(&state, person("bob", Role::Admin), "alice")
            .await
            .unwrap();
        assert!(msg.contains("bob") && msg.contains("alice"));
        assert_eq!(get_user(&state, "bob").await.unwrap().role, Role::Client);

        let err = register_client(&state, person("carol", Role::Client), "bob")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(get_user(&state, "carol").await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn partial_update_rehashes_password() {
        let state = AppState::fake();
        register(&state, person("alice", Role::Nutritionist)).await.unwrap();
        let updated = update_user(
            &state,
            "alice",
            UserUpdate {
                first_name: Some("Alicia".into()),
                password: Some("newpass1".into()),
                ..UserUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.first_name, "Alicia");
        assert_eq!(updated.last_name, "Last");
        assert!(authenticate(&state, "alice", "newpass1").await.is_ok());

        let err = update_user(&state, "alice", UserUpdate::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        let err = update_user(
            &state,
            "ghost",
            UserUpdate {
                email: Some("ghost@example.com".into()),
                ..UserUpdate::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    fn promote(role: Role) -> UserUpdate {
        UserUpdate {
            role: Some(role),
            ..UserUpdate::default()
        }
    }

    #[tokio::test]
    async fn role_change_is_refused_while_linked_or_shared() {
        let state = AppState::fake();
        register(&state, person("alice", Role::Nutritionist)).await.unwrap();
        register_client(&state, person("bob", Role::Client), "alice")
            .await
            .unwrap();
        register(&state, person("carol", Role::Client)).await.unwrap();
        register(&state, person("dave", Role::Client)).await.unwrap();

        let err = update_user(&state, "bob", promote(Role::Nutritionist))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.to_string(), "User has shares or links under their current role");
        assert_eq!(get_user(&state, "bob").await.unwrap().role, Role::Client);
        let err = update_user(&state, "alice", promote(Role::Client))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        // A share alone also pins the role.
        let alice = get_user(&state, "alice").await.unwrap();
        let carol = get_user(&state, "carol").await.unwrap();
        let mut uow = state.store.begin().await.unwrap();
        let plan = uow
            .insert_meal_plan(NewMealPlan {
                name: "Week1".into(),
                created_by: "alice".into(),
                user_id: Some(alice.id),
            })
            .await
            .unwrap();
        uow.insert_share(Share {
            mealplan_id: plan.id,
            nutritionist_id: alice.id,
            client_id: carol.id,
        })
        .await
        .unwrap();
        uow.commit().await.unwrap();
        let err = update_user(&state, "carol", promote(Role::Nutritionist))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        // Same role, or no references, goes through.
        assert_eq!(
            update_user(&state, "bob", promote(Role::Client)).await.unwrap().role,
            Role::Client
        );
        assert_eq!(
            update_user(&state, "dave", promote(Role::Nutritionist))
                .await
                .unwrap()
                .role,
            Role::Nutritionist
        );
    }

    #[tokio::test]
    async fn remove_user_reports_missing() {
        let state = AppState::fake();
        register(&state, person("alice", Role::Nutritionist)).await.unwrap();
        remove_user(&state, "alice").await.unwrap();
        assert_eq!(remove_user(&state, "alice").await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn saved_items_are_unique_per_user() {
        let state = AppState::fake();
        register(&state, person("bob", Role::Client)).await.unwrap();
        let apple = seed_ingredient(&state, "Apple").await;

        save_item(&state, "bob", SavedKind::Ingredient, apple).await.unwrap();
        let err = save_item(&state, "bob", SavedKind::Ingredient, apple)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Ingredient already saved");

        let saved = saved_ingredients(&state, "bob").await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "Apple");

        unsave_item(&state, "bob", SavedKind::Ingredient, apple).await.unwrap();
        let err = unsave_item(&state, "bob", SavedKind::Ingredient, apple)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let err = save_item(&state, "bob", SavedKind::Recipe, 42).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
