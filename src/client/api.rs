//! Reqwest-backed API client.
//!
//! Owns transport only: request building, bearer headers and mapping of the
//! server's error body back into [`ClientError`]. Callers hold the [`Session`].

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use super::session::Session;
use crate::{
    auth::dto::{
        LoginRequest, MessageResponse, NewClientRequest, RefreshRequest, RegisterRequest,
        TokenResponse,
    },
    error::ErrorBody,
    ingredients::{
        dto::{
            DeletedResponse, IngredientDetailsResponse, IngredientResponse, IngredientsResponse,
            NewIngredientRequest, UpdateIngredientRequest,
        },
        repo_types::{Ingredient, IngredientDetails},
    },
    mealplans::{
        dto::{
            AddRecipeRequest, CreateMealPlanRequest, DeletedMealPlanResponse,
            DeletedRecipeResponse, MealPlanDetailsResponse, MealPlanResponse, MealPlansResponse,
            ShareRequest, ShareResponse, SlotResponse, UpdateMealPlanRequest,
        },
        repo_types::{MealPlan, MealPlanDetails, MealPlanRecipe, MealPlanSummary, MealType},
    },
    recipes::{
        dto::{
            NewRecipeRequest, RecipeDetailsResponse, RecipeResponse, RecipesResponse,
            UpdateRecipeRequest,
        },
        repo_types::{Recipe, RecipeDetails},
    },
    users::{
        dto::{
            CreatedUserResponse, DeletedUserResponse, NewUserRequest, PublicUser,
            UpdateUserRequest, UserResponse, UsersResponse,
        },
        repo_types::SavedKind,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an error body.
    #[error("{status}: {}", messages.join("; "))]
    Api { status: u16, messages: Vec<String> },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::Url(_) => None,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        match self {
            ClientError::Api { messages, .. } => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Turns a non-success response body into messages: the top-level message
/// followed by one `field message` line per violation.
fn api_error(status: StatusCode, body: &[u8]) -> ClientError {
    let messages = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => {
            let mut messages = vec![parsed.error.message];
            messages.extend(
                parsed
                    .error
                    .details
                    .into_iter()
                    .map(|d| format!("{} {}", d.field, d.message)),
            );
            messages
        }
        Err(_) => vec![status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()],
    };
    ClientError::Api {
        status: status.as_u16(),
        messages,
    }
}

fn saved_segment(kind: SavedKind) -> &'static str {
    match kind {
        SavedKind::Ingredient => "ingredients",
        SavedKind::Recipe => "recipes",
        SavedKind::MealPlan => "mealplans",
    }
}

#[derive(Debug, Clone)]
pub struct RemplrClient {
    http: Client,
    base: Url,
}

impl RemplrClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: Client::builder().build()?,
            base,
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> ClientResult<RequestBuilder> {
        let url = self.base.join(path.trim_start_matches('/'))?;
        debug!(%method, %url, "api call");
        let mut req = self.http.request(method, url);
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        Ok(req)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let res = req.send().await?;
        let status = res.status();
        let body = res.bytes().await?;
        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        serde_json::from_slice(&body).map_err(|e| ClientError::Api {
            status: status.as_u16(),
            messages: vec![format!("unexpected response body: {e}")],
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> ClientResult<T> {
        let req = self.request(Method::GET, path, token)?;
        self.send(req).await
    }

    async fn with_body<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ClientResult<T> {
        let req = self.request(method, path, token)?.json(body);
        self.send(req).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str, session: &Session) -> ClientResult<T> {
        let req = self.request(Method::DELETE, path, Some(&session.token))?;
        self.send(req).await
    }

    // ---- auth ----

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<TokenResponse> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.with_body(Method::POST, "auth/token", None, &body).await
    }

    /// Logs in and loads the signed-in user.
    pub async fn sign_in(&self, username: &str, password: &str) -> ClientResult<Session> {
        let tokens = self.login(username, password).await?;
        self.session_from(tokens).await
    }

    /// Builds a session from a token pair by asking the server who it belongs to.
    pub async fn session_from(&self, tokens: TokenResponse) -> ClientResult<Session> {
        let res: UserResponse = self.get("me", Some(&tokens.token)).await?;
        Ok(Session::new(tokens.token, Some(tokens.refresh_token), res.user))
    }

    pub async fn register_nutritionist(&self, user: NewUserRequest) -> ClientResult<TokenResponse> {
        self.with_body(Method::POST, "auth/register", None, &RegisterRequest { user })
            .await
    }

    /// `nutritionist_username` defaults to the session user on the server.
    pub async fn add_client(
        &self,
        session: &Session,
        user: NewUserRequest,
        nutritionist_username: Option<&str>,
    ) -> ClientResult<String> {
        let body = NewClientRequest {
            user,
            nutritionist_username: nutritionist_username.map(str::to_string),
        };
        let res: MessageResponse = self
            .with_body(Method::POST, "auth/client/new", Some(&session.token), &body)
            .await?;
        Ok(res.message)
    }

    pub async fn refresh(&self, refresh_token: &str) -> ClientResult<TokenResponse> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.with_body(Method::POST, "auth/refresh", None, &body).await
    }

    pub async fn me(&self, session: &Session) -> ClientResult<PublicUser> {
        let res: UserResponse = self.get("me", Some(&session.token)).await?;
        Ok(res.user)
    }

    // ---- users ----

    pub async fn add_user(&self, session: &Session, user: NewUserRequest) -> ClientResult<CreatedUserResponse> {
        self.with_body(Method::POST, "users", Some(&session.token), &user).await
    }

    pub async fn get_all_users(&self, session: &Session) -> ClientResult<Vec<PublicUser>> {
        let res: UsersResponse = self.get("users", Some(&session.token)).await?;
        Ok(res.users)
    }

    pub async fn get_user(&self, session: &Session, username: &str) -> ClientResult<PublicUser> {
        let res: UserResponse = self.get(&format!("users/{username}"), Some(&session.token)).await?;
        Ok(res.user)
    }

    pub async fn update_user(
        &self,
        session: &Session,
        username: &str,
        update: &UpdateUserRequest,
    ) -> ClientResult<PublicUser> {
        let res: UserResponse = self
            .with_body(Method::PATCH, &format!("users/{username}"), Some(&session.token), update)
            .await?;
        Ok(res.user)
    }

    pub async fn delete_user(&self, session: &Session, username: &str) -> ClientResult<String> {
        let res: DeletedUserResponse = self.delete(&format!("users/{username}"), session).await?;
        Ok(res.deleted_user)
    }

    // ---- saved items ----

    pub async fn save_item(
        &self,
        session: &Session,
        username: &str,
        kind: SavedKind,
        id: i32,
    ) -> ClientResult<()> {
        let path = format!("users/{username}/{}/{id}", saved_segment(kind));
        let _: Value = self
            .with_body(Method::POST, &path, Some(&session.token), &Value::Null)
            .await?;
        Ok(())
    }

    pub async fn unsave_item(
        &self,
        session: &Session,
        username: &str,
        kind: SavedKind,
        id: i32,
    ) -> ClientResult<()> {
        let path = format!("users/{username}/{}/{id}", saved_segment(kind));
        let _: Value = self.delete(&path, session).await?;
        Ok(())
    }

    /// Ids of every item of `kind` the user has saved.
    pub async fn saved_ids(&self, session: &Session, username: &str, kind: SavedKind) -> ClientResult<Vec<i32>> {
        Ok(match kind {
            SavedKind::Ingredient => self
                .saved_ingredients(session, username)
                .await?
                .into_iter()
                .map(|i| i.id)
                .collect(),
            SavedKind::Recipe => self
                .saved_recipes(session, username)
                .await?
                .into_iter()
                .map(|r| r.id)
                .collect(),
            SavedKind::MealPlan => self
                .saved_meal_plans(session, username)
                .await?
                .into_iter()
                .map(|p| p.id)
                .collect(),
        })
    }

    pub async fn saved_ingredients(&self, session: &Session, username: &str) -> ClientResult<Vec<Ingredient>> {
        let res: IngredientsResponse = self
            .get(&format!("users/{username}/ingredients"), Some(&session.token))
            .await?;
        Ok(res.ingredients)
    }

    pub async fn saved_recipes(&self, session: &Session, username: &str) -> ClientResult<Vec<Recipe>> {
        let res: RecipesResponse = self
            .get(&format!("users/{username}/recipes"), Some(&session.token))
            .await?;
        Ok(res.recipes)
    }

    pub async fn saved_meal_plans(&self, session: &Session, username: &str) -> ClientResult<Vec<MealPlanSummary>> {
        let res: MealPlansResponse = self
            .get(&format!("users/{username}/mealplans"), Some(&session.token))
            .await?;
        Ok(res.meal_plans)
    }

    // ---- ingredients ----

    pub async fn create_ingredient(
        &self,
        session: &Session,
        ingredient: &NewIngredientRequest,
    ) -> ClientResult<IngredientDetails> {
        let res: IngredientDetailsResponse = self
            .with_body(Method::POST, "ingredients", Some(&session.token), ingredient)
            .await?;
        Ok(res.ingredient)
    }

    pub async fn get_ingredients(&self, session: &Session) -> ClientResult<Vec<Ingredient>> {
        let res: IngredientsResponse = self.get("ingredients", Some(&session.token)).await?;
        Ok(res.ingredients)
    }

    pub async fn get_ingredient(&self, session: &Session, id: i32) -> ClientResult<IngredientDetails> {
        let res: IngredientDetailsResponse = self.get(&format!("ingredients/{id}"), Some(&session.token)).await?;
        Ok(res.ingredient)
    }

    pub async fn update_ingredient(
        &self,
        session: &Session,
        id: i32,
        update: &UpdateIngredientRequest,
    ) -> ClientResult<Ingredient> {
        let res: IngredientResponse = self
            .with_body(Method::PATCH, &format!("ingredients/{id}"), Some(&session.token), update)
            .await?;
        Ok(res.ingredient)
    }

    pub async fn delete_ingredient(&self, session: &Session, id: i32) -> ClientResult<i32> {
        let res: DeletedResponse = self.delete(&format!("ingredients/{id}"), session).await?;
        Ok(res.deleted)
    }

    // ---- recipes ----

    pub async fn create_recipe(&self, session: &Session, recipe: &NewRecipeRequest) -> ClientResult<RecipeDetails> {
        let res: RecipeDetailsResponse = self
            .with_body(Method::POST, "recipes", Some(&session.token), recipe)
            .await?;
        Ok(res.recipe)
    }

    pub async fn get_recipes(&self, session: &Session) -> ClientResult<Vec<Recipe>> {
        let res: RecipesResponse = self.get("recipes", Some(&session.token)).await?;
        Ok(res.recipes)
    }

    pub async fn get_recipe(&self, session: &Session, id: i32) -> ClientResult<RecipeDetails> {
        let res: RecipeDetailsResponse = self.get(&format!("recipes/{id}"), Some(&session.token)).await?;
        Ok(res.recipe)
    }

    pub async fn update_recipe(
        &self,
        session: &Session,
        id: i32,
        update: &UpdateRecipeRequest,
    ) -> ClientResult<Recipe> {
        let res: RecipeResponse = self
            .with_body(Method::PATCH, &format!("recipes/{id}"), Some(&session.token), update)
            .await?;
        Ok(res.recipe)
    }

    pub async fn delete_recipe(&self, session: &Session, id: i32) -> ClientResult<i32> {
        let res: DeletedResponse = self.delete(&format!("recipes/{id}"), session).await?;
        Ok(res.deleted)
    }

    // ---- meal plans ----

    pub async fn create_meal_plan(&self, session: &Session, plan: &CreateMealPlanRequest) -> ClientResult<MealPlan> {
        let res: MealPlanResponse = self
            .with_body(Method::POST, "mealplans", Some(&session.token), plan)
            .await?;
        Ok(res.meal_plan)
    }

    pub async fn get_meal_plans(&self, session: &Session) -> ClientResult<Vec<MealPlanSummary>> {
        let res: MealPlansResponse = self.get("mealplans", Some(&session.token)).await?;
        Ok(res.meal_plans)
    }

    pub async fn get_meal_plan(&self, session: &Session, id: i32) -> ClientResult<MealPlanDetails> {
        let res: MealPlanDetailsResponse = self.get(&format!("mealplans/{id}"), Some(&session.token)).await?;
        Ok(res.meal_plan)
    }

    pub async fn update_meal_plan(
        &self,
        session: &Session,
        id: i32,
        update: &UpdateMealPlanRequest,
    ) -> ClientResult<MealPlan> {
        let res: MealPlanResponse = self
            .with_body(Method::PATCH, &format!("mealplans/{id}"), Some(&session.token), update)
            .await?;
        Ok(res.meal_plan)
    }

    pub async fn add_recipe_to_meal_plan(
        &self,
        session: &Session,
        id: i32,
        recipe_id: i32,
        meal_type: MealType,
        meal_day: i32,
    ) -> ClientResult<MealPlanRecipe> {
        let body = AddRecipeRequest {
            meal_type: Some(meal_type.as_str().to_string()),
            meal_day: Some(meal_day),
        };
        let res: SlotResponse = self
            .with_body(
                Method::POST,
                &format!("mealplans/{id}/recipes/{recipe_id}"),
                Some(&session.token),
                &body,
            )
            .await?;
        Ok(res.recipe)
    }

    pub async fn remove_recipe_from_meal_plan(&self, session: &Session, id: i32, recipe_id: i32) -> ClientResult<i32> {
        let res: DeletedRecipeResponse = self
            .delete(&format!("mealplans/{id}/recipes/{recipe_id}"), session)
            .await?;
        Ok(res.deleted_recipe)
    }

    pub async fn delete_meal_plan(&self, session: &Session, id: i32) -> ClientResult<i32> {
        let res: DeletedMealPlanResponse = self.delete(&format!("mealplans/{id}"), session).await?;
        Ok(res.deleted_meal_plan)
    }

    pub async fn share_meal_plan(
        &self,
        session: &Session,
        id: i32,
        nutritionist_username: &str,
        client_username: &str,
    ) -> ClientResult<String> {
        let body = ShareRequest {
            nutritionist_username: Some(nutritionist_username.to_string()),
            client_username: Some(client_username.to_string()),
        };
        let res: ShareResponse = self
            .with_body(Method::POST, &format!("mealplans/{id}/share"), Some(&session.token), &body)
            .await?;
        Ok(res.message)
    }

    pub async fn get_shared_meal_plans(&self, session: &Session, client_username: &str) -> ClientResult<Vec<MealPlanDetails>> {
        self.get(&format!("mealplans/shared/{client_username}"), Some(&session.token))
            .await
    }
}
