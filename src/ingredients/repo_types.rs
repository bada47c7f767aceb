use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: i32,
    pub aisle: String,
    pub image: String,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub details: String,
}

/// One line of a nutrition breakdown; shared by ingredients and recipes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Nutrient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    #[serde(default)]
    pub percent_of_daily_needs: f64,
}

#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub aisle: String,
    pub image: String,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub details: String,
}

#[derive(Debug, Clone, Default)]
pub struct IngredientPatch {
    pub aisle: Option<String>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub details: Option<String>,
}

impl IngredientPatch {
    pub fn is_empty(&self) -> bool {
        self.aisle.is_none()
            && self.image.is_none()
            && self.name.is_none()
            && self.amount.is_none()
            && self.unit.is_none()
            && self.details.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientDetails {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub nutrients: Vec<Nutrient>,
}
