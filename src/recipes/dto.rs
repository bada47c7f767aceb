use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    ingredients::{
        dto::{check_nutrients, NutrientRequest},
        repo_types::Nutrient,
    },
    recipes::repo_types::{Instruction, NewRecipe, Recipe, RecipeDetails, RecipePatch},
    validation::Violations,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstructionRequest {
    #[serde(default)]
    pub number: Option<i32>,
    pub step: Option<String>,
}

/// Everything written by one recipe creation.
#[derive(Debug, Clone, Default)]
pub struct CreateRecipe {
    pub recipe: NewRecipe,
    pub ingredient_ids: Vec<i32>,
    pub nutrients: Vec<Nutrient>,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewRecipeRequest {
    pub vegetarian: bool,
    pub vegan: bool,
    pub dairy_free: bool,
    pub weight_watcher_points: i32,
    pub credits_text: String,
    pub title: Option<String>,
    pub ready_in_minutes: i32,
    pub servings: i32,
    pub source_url: String,
    pub image: String,
    pub image_type: String,
    pub dish_types: Vec<String>,
    pub diets: Vec<String>,
    pub summary: String,
    pub ingredient_ids: Vec<i32>,
    pub nutrients: Vec<NutrientRequest>,
    pub instructions: Vec<InstructionRequest>,
}

impl NewRecipeRequest {
    pub fn validate(self) -> AppResult<CreateRecipe> {
        let mut v = Violations::new();
        let title = v.required("title", self.title.as_deref());
        v.check(self.ready_in_minutes >= 0, "readyInMinutes", "must not be negative");
        v.check(self.servings >= 0, "servings", "must not be negative");
        let nutrients = check_nutrients(&mut v, "nutrients", self.nutrients);

        let instructions: Vec<Instruction> = self
            .instructions
            .into_iter()
            .enumerate()
            .filter_map(|(i, ins)| {
                let step = v.required(&format!("instructions[{i}].step"), ins.step.as_deref())?;
                Some(Instruction {
                    number: ins.number.unwrap_or(i as i32 + 1),
                    step,
                })
            })
            .collect();
        let mut numbers: Vec<i32> = instructions.iter().map(|i| i.number).collect();
        numbers.sort_unstable();
        let unique = numbers.len();
        numbers.dedup();
        v.check(numbers.len() == unique, "instructions", "step numbers must be unique");
        v.finish("recipe")?;

        let title = title.ok_or_else(|| AppError::bad_request("invalid recipe"))?;
        let mut ingredient_ids = self.ingredient_ids;
        ingredient_ids.sort_unstable();
        ingredient_ids.dedup();

        Ok(CreateRecipe {
            recipe: NewRecipe {
                vegetarian: self.vegetarian,
                vegan: self.vegan,
                dairy_free: self.dairy_free,
                weight_watcher_points: self.weight_watcher_points,
                credits_text: self.credits_text,
                title,
                ready_in_minutes: self.ready_in_minutes,
                servings: self.servings,
                source_url: self.source_url,
                image: self.image,
                image_type: self.image_type,
                dish_types: self.dish_types,
                diets: self.diets,
                summary: self.summary,
            },
            ingredient_ids,
            nutrients,
            instructions,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRecipeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vegetarian: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vegan: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dairy_free: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_watcher_points: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_in_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dish_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl UpdateRecipeRequest {
    pub fn validate(self) -> AppResult<RecipePatch> {
        let mut v = Violations::new();
        if let Some(t) = &self.title {
            v.check(!t.trim().is_empty(), "title", "must not be blank");
        }
        if let Some(m) = self.ready_in_minutes {
            v.check(m >= 0, "readyInMinutes", "must not be negative");
        }
        if let Some(s) = self.servings {
            v.check(s >= 0, "servings", "must not be negative");
        }
        v.finish("recipe")?;
        Ok(RecipePatch {
            vegetarian: self.vegetarian,
            vegan: self.vegan,
            dairy_free: self.dairy_free,
            weight_watcher_points: self.weight_watcher_points,
            credits_text: self.credits_text,
            title: self.title.map(|t| t.trim().to_string()),
            ready_in_minutes: self.ready_in_minutes,
            servings: self.servings,
            source_url: self.source_url,
            image: self.image,
            image_type: self.image_type,
            dish_types: self.dish_types,
            diets: self.diets,
            summary: self.summary,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeResponse {
    pub recipe: Recipe,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeDetailsResponse {
    pub recipe: RecipeDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipesResponse {
    pub recipes: Vec<Recipe>,
}
