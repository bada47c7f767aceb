use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    mealplans::{
        repo_types::{
            is_valid_meal_day, MealPlan, MealPlanDetails, MealPlanPatch, MealPlanRecipe,
            MealPlanSummary, MealType, NewSlot, DAYS_PER_WEEK,
        },
        services::CreateMealPlan,
    },
    validation::Violations,
};

/// One `(recipe, slot)` pair as sent over the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotRequest {
    pub recipe_id: Option<i32>,
    pub meal_type: Option<String>,
    pub meal_day: Option<i32>,
}

impl SlotRequest {
    pub fn new(recipe_id: i32, meal_type: MealType, meal_day: i32) -> Self {
        Self {
            recipe_id: Some(recipe_id),
            meal_type: Some(meal_type.as_str().to_string()),
            meal_day: Some(meal_day),
        }
    }
}

fn check_slot(
    v: &mut Violations,
    prefix: &str,
    recipe_id: Option<i32>,
    meal_type: Option<&str>,
    meal_day: Option<i32>,
) -> Option<NewSlot> {
    let recipe_id = recipe_id.or_else(|| {
        v.push(format!("{prefix}recipe_id"), "is required");
        None
    });
    let meal_type = match meal_type.map(str::parse::<MealType>) {
        Some(Ok(t)) => Some(t),
        Some(Err(e)) => {
            v.push(format!("{prefix}meal_type"), e.to_string());
            None
        }
        None => {
            v.push(format!("{prefix}meal_type"), "is required");
            None
        }
    };
    let meal_day = match meal_day {
        Some(d) if is_valid_meal_day(d) => Some(d),
        Some(_) => {
            v.push(
                format!("{prefix}meal_day"),
                format!("must be between 1 and {DAYS_PER_WEEK}"),
            );
            None
        }
        None => {
            v.push(format!("{prefix}meal_day"), "is required");
            None
        }
    };
    Some(NewSlot {
        recipe_id: recipe_id?,
        meal_type: meal_type?,
        meal_day: meal_day?,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateMealPlanRequest {
    #[serde(rename = "mealPlanName")]
    pub meal_plan_name: Option<String>,
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
    pub recipes: Option<Vec<SlotRequest>>,
}

impl CreateMealPlanRequest {
    pub fn validate(self) -> AppResult<CreateMealPlan> {
        let mut v = Violations::new();
        let name = v.required("mealPlanName", self.meal_plan_name.as_deref());
        let created_by = v.required("created_by", self.created_by.as_deref());
        let raw = self.recipes.unwrap_or_default();
        v.check(!raw.is_empty(), "recipes", "at least one recipe is required");

        let recipes: Vec<Option<NewSlot>> = raw
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                check_slot(
                    &mut v,
                    &format!("recipes[{i}]."),
                    s.recipe_id,
                    s.meal_type.as_deref(),
                    s.meal_day,
                )
            })
            .collect();
        v.finish("meal plan")?;

        let recipes: Option<Vec<NewSlot>> = recipes.into_iter().collect();
        match (name, created_by, recipes) {
            (Some(name), Some(created_by), Some(recipes)) => Ok(CreateMealPlan {
                name,
                created_by,
                user_id: self.user_id,
                recipes,
            }),
            _ => Err(AppError::bad_request("invalid meal plan")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMealPlanRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl From<UpdateMealPlanRequest> for MealPlanPatch {
    fn from(r: UpdateMealPlanRequest) -> Self {
        MealPlanPatch {
            name: r.name.map(|s| s.trim().to_string()),
            created_by: r.created_by.map(|s| s.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddRecipeRequest {
    pub meal_type: Option<String>,
    pub meal_day: Option<i32>,
}

impl AddRecipeRequest {
    pub fn validate(self, recipe_id: i32) -> AppResult<NewSlot> {
        let mut v = Violations::new();
        let slot = check_slot(
            &mut v,
            "",
            Some(recipe_id),
            self.meal_type.as_deref(),
            self.meal_day,
        );
        v.finish("meal plan recipe")?;
        slot.ok_or_else(|| AppError::bad_request("invalid meal plan recipe"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub nutritionist_username: Option<String>,
    pub client_username: Option<String>,
}

impl ShareRequest {
    /// Returns `(nutritionist, client)`.
    pub fn validate(self) -> AppResult<(String, String)> {
        let mut v = Violations::new();
        let nutritionist = v.required("nutritionistUsername", self.nutritionist_username.as_deref());
        let client = v.required("clientUsername", self.client_username.as_deref());
        v.finish("share request")?;
        match (nutritionist, client) {
            (Some(n), Some(c)) => Ok((n, c)),
            _ => Err(AppError::bad_request("invalid share request")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MealPlanResponse {
    #[serde(rename = "mealPlan")]
    pub meal_plan: MealPlan,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MealPlanDetailsResponse {
    #[serde(rename = "mealPlan")]
    pub meal_plan: MealPlanDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MealPlansResponse {
    #[serde(rename = "mealPlans")]
    pub meal_plans: Vec<MealPlanSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SlotResponse {
    pub recipe: MealPlanRecipe,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedRecipeResponse {
    #[serde(rename = "deleted recipe")]
    pub deleted_recipe: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedMealPlanResponse {
    #[serde(rename = "deleted meal plan")]
    pub deleted_meal_plan: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_uses_wire_names() {
        let req: CreateMealPlanRequest = serde_json::from_value(serde_json::json!({
            "mealPlanName": "Week1",
            "created_by": "alice",
            "recipes": [{"recipe_id": 5, "meal_type": "Breakfast", "meal_day": 1}]
        }))
        .unwrap();
        let input = req.validate().unwrap();
        assert_eq!(input.name, "Week1");
        assert_eq!(input.user_id, None);
        assert_eq!(
            input.recipes,
            vec![NewSlot {
                recipe_id: 5,
                meal_type: MealType::Breakfast,
                meal_day: 1
            }]
        );
    }

    #[test]
    fn create_request_reports_all_slot_problems() {
        let req = CreateMealPlanRequest {
            meal_plan_name: Some("Week1".into()),
            created_by: None,
            user_id: None,
            recipes: Some(vec![
                SlotRequest {
                    recipe_id: None,
                    meal_type: Some("Brunch".into()),
                    meal_day: Some(0),
                },
                SlotRequest::new(3, MealType::Snack, 7),
            ]),
        };
        let err = req.validate().unwrap_err();
        let fields: Vec<_> = err.details().iter().map(|d| d.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "created_by",
                "recipes[0].recipe_id",
                "recipes[0].meal_type",
                "recipes[0].meal_day"
            ]
        );
    }

    #[test]
    fn share_request_needs_both_usernames() {
        let err = ShareRequest {
            nutritionist_username: Some("alice".into()),
            client_username: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.details()[0].field, "clientUsername");
    }

    #[test]
    fn deletion_responses_keep_spaced_keys() {
        let json = serde_json::to_value(DeletedMealPlanResponse { deleted_meal_plan: 3 }).unwrap();
        assert_eq!(json["deleted meal plan"], 3);
    }
}
