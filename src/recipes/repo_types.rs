use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ingredients::repo_types::{Ingredient, Nutrient};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: i32,
    pub vegetarian: bool,
    pub vegan: bool,
    pub dairy_free: bool,
    pub weight_watcher_points: i32,
    pub credits_text: String,
    pub title: String,
    pub ready_in_minutes: i32,
    pub servings: i32,
    pub source_url: String,
    pub image: String,
    pub image_type: String,
    pub dish_types: Vec<String>,
    pub diets: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Instruction {
    pub number: i32,
    pub step: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub vegetarian: bool,
    pub vegan: bool,
    pub dairy_free: bool,
    pub weight_watcher_points: i32,
    pub credits_text: String,
    pub title: String,
    pub ready_in_minutes: i32,
    pub servings: i32,
    pub source_url: String,
    pub image: String,
    pub image_type: String,
    pub dish_types: Vec<String>,
    pub diets: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Default)]
pub struct RecipePatch {
    pub vegetarian: Option<bool>,
    pub vegan: Option<bool>,
    pub dairy_free: Option<bool>,
    pub weight_watcher_points: Option<i32>,
    pub credits_text: Option<String>,
    pub title: Option<String>,
    pub ready_in_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub source_url: Option<String>,
    pub image: Option<String>,
    pub image_type: Option<String>,
    pub dish_types: Option<Vec<String>>,
    pub diets: Option<Vec<String>>,
    pub summary: Option<String>,
}

impl RecipePatch {
    pub fn is_empty(&self) -> bool {
        self.vegetarian.is_none()
            && self.vegan.is_none()
            && self.dairy_free.is_none()
            && self.weight_watcher_points.is_none()
            && self.credits_text.is_none()
            && self.title.is_none()
            && self.ready_in_minutes.is_none()
            && self.servings.is_none()
            && self.source_url.is_none()
            && self.image.is_none()
            && self.image_type.is_none()
            && self.dish_types.is_none()
            && self.diets.is_none()
            && self.summary.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetails {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<Ingredient>,
    pub nutrients: Vec<Nutrient>,
    pub instructions: Vec<Instruction>,
}
