use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::recipes::repo_types::Recipe;

pub const DAYS_PER_WEEK: i32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown meal type: {0}")]
pub struct UnknownMealType(pub String);

impl MealType {
    /// Grid row order.
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }

    pub fn row(self) -> usize {
        match self {
            MealType::Breakfast => 0,
            MealType::Lunch => 1,
            MealType::Dinner => 2,
            MealType::Snack => 3,
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = UnknownMealType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownMealType(s.to_string()))
    }
}

impl TryFrom<String> for MealType {
    type Error = UnknownMealType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

pub fn is_valid_meal_day(day: i32) -> bool {
    (1..=DAYS_PER_WEEK).contains(&day)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MealPlan {
    pub id: i32,
    pub name: String,
    pub created_by: String,
    pub user_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MealPlanSummary {
    pub id: i32,
    pub name: String,
    pub created_by: String,
}

/// Association row: one recipe in one slot of one plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MealPlanRecipe {
    pub id: i32,
    pub meal_plan_id: i32,
    pub recipe_id: i32,
    #[sqlx(try_from = "String")]
    pub meal_type: MealType,
    pub meal_day: i32,
}

#[derive(Debug, Clone)]
pub struct NewMealPlan {
    pub name: String,
    pub created_by: String,
    pub user_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSlot {
    pub recipe_id: i32,
    pub meal_type: MealType,
    pub meal_day: i32,
}

#[derive(Debug, Clone, Default)]
pub struct MealPlanPatch {
    pub name: Option<String>,
    pub created_by: Option<String>,
}

impl MealPlanPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.created_by.is_none()
    }
}

/// An association joined with the full recipe it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PlannedRecipe {
    #[serde(skip)]
    pub slot_id: i32,
    #[serde(skip)]
    pub meal_plan_id: i32,
    pub recipe_id: i32,
    #[sqlx(try_from = "String")]
    pub meal_type: MealType,
    pub meal_day: i32,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub recipe: Recipe,
}

impl PlannedRecipe {
    /// `(meal_type, meal_day)` ascending with meal types compared by name, then insertion order.
    pub fn sort_key(&self) -> (&'static str, i32, i32) {
        (self.meal_type.as_str(), self.meal_day, self.slot_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanDetails {
    #[serde(flatten)]
    pub plan: MealPlan,
    pub recipes: Vec<PlannedRecipe>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Share {
    pub mealplan_id: i32,
    pub nutritionist_id: i32,
    pub client_id: i32,
}
