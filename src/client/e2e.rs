use super::{planner::RecipeChoice, Favorite, MealPlanBuilder, MealPlanGrid, RemplrClient};
use crate::{
    app::build_app,
    error::ErrorBody,
    mealplans::{dto::UpdateMealPlanRequest, repo_types::MealType},
    recipes::dto::NewRecipeRequest,
    state::AppState,
    users::{dto::NewUserRequest, repo_types::SavedKind},
};

async fn serve_at() -> (RemplrClient, String) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_app(AppState::fake());
    tokio::spawn(async move { axum::serve(listener, app).await });
    let base = format!("http://{addr}");
    (RemplrClient::new(&base).unwrap(), base)
}

async fn serve() -> RemplrClient {
    serve_at().await.0
}

fn person(username: &str) -> NewUserRequest {
    NewUserRequest {
        username: Some(username.into()),
        password: Some("password1".into()),
        first_name: Some("First".into()),
        last_name: Some("Last".into()),
        email: Some(format!("{username}@example.com")),
        role: None,
    }
}

#[tokio::test]
async fn nutritionist_builds_and_shares_a_week() {
    let client = serve().await;

    let tokens = client.register_nutritionist(person("alice")).await.unwrap();
    let alice = client.session_from(tokens).await.unwrap();
    assert!(alice.user.is_nutritionist);

    let message = client.add_client(&alice, person("bob"), None).await.unwrap();
    assert!(message.contains("bob"));

    let recipe = client
        .create_recipe(
            &alice,
            &NewRecipeRequest {
                title: Some("Porridge".into()),
                servings: 1,
                ..NewRecipeRequest::default()
            },
        )
        .await
        .unwrap();

    let mut builder = MealPlanBuilder::new();
    builder.set_name("Week1");
    builder.show_row(MealType::Breakfast);
    builder
        .set_cell(
            MealType::Breakfast,
            0,
            RecipeChoice {
                id: recipe.recipe.id,
                title: recipe.recipe.title.clone(),
            },
        )
        .unwrap();
    let request = builder.submit(&alice, "alice").unwrap();
    let plan = client.create_meal_plan(&alice, &request).await.unwrap();
    assert_eq!(plan.name, "Week1");
    assert_eq!(plan.user_id, Some(alice.user.id));

    let err = client.create_meal_plan(&alice, &request).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    let err = client
        .update_meal_plan(
            &alice,
            plan.id,
            &UpdateMealPlanRequest {
                name: None,
                created_by: Some("mallory".into()),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.messages(), vec!["created_by must be your own username"]);

    let shared = client
        .share_meal_plan(&alice, plan.id, "alice", "bob")
        .await
        .unwrap();
    assert_eq!(
        shared,
        format!("Meal plan {} is now shared with client bob by nutritionist alice", plan.id)
    );
    let err = client
        .share_meal_plan(&alice, plan.id, "alice", "bob")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));

    let bob = client.sign_in("bob", "password1").await.unwrap();
    let plans = client.get_shared_meal_plans(&bob, "bob").await.unwrap();
    assert_eq!(plans.len(), 1);
    let grid = MealPlanGrid::from_details(&plans[0]);
    assert_eq!(grid.name, "Week1");
    assert_eq!(grid.cell(MealType::Breakfast, 1)[0].recipe.title, "Porridge");

    let err = client.get_meal_plans(&bob).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    let err = client.get_shared_meal_plans(&bob, "alice").await.unwrap_err();
    assert_eq!(err.status(), Some(403));

    let mut fav = Favorite::load(&client, &bob, SavedKind::Recipe, recipe.recipe.id, "Porridge")
        .await
        .unwrap();
    assert!(!fav.is_saved());
    assert_eq!(fav.toggle(&client, &bob).await.unwrap(), "Liked recipe Porridge!");
    assert_eq!(client.saved_recipes(&bob, "bob").await.unwrap().len(), 1);
    assert_eq!(fav.toggle(&client, &bob).await.unwrap(), "Unliked recipe Porridge!");
    assert!(client.saved_recipes(&bob, "bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn bad_credentials_and_invalid_bodies_surface_as_api_errors() {
    let client = serve().await;

    let err = client.login("nobody", "password1").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.messages(), vec!["Invalid username/password"]);

    let tokens = client.register_nutritionist(person("alice")).await.unwrap();
    let alice = client.session_from(tokens).await.unwrap();
    let err = client
        .create_meal_plan(&alice, &Default::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    let messages = err.messages();
    assert_eq!(messages[0], "invalid meal plan");
    assert!(messages.iter().any(|m| m == "mealPlanName is required"));
}

#[tokio::test]
async fn mistyped_bodies_are_bad_requests_with_a_field_path() {
    let (client, base) = serve_at().await;
    let tokens = client.register_nutritionist(person("alice")).await.unwrap();

    let res = reqwest::Client::new()
        .post(format!("{base}/mealplans"))
        .bearer_auth(&tokens.token)
        .json(&serde_json::json!({
            "mealPlanName": "W",
            "created_by": "alice",
            "recipes": [{"recipe_id": 1, "meal_type": "Lunch", "meal_day": "one"}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.error.status, 400);
    assert_eq!(body.error.message, "invalid request body");
    assert_eq!(body.error.details[0].field, "recipes[0].meal_day");

    let res = reqwest::Client::new()
        .post(format!("{base}/auth/token"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.error.message, "malformed JSON body");
}
