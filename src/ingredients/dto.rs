use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    ingredients::repo_types::{Ingredient, IngredientDetails, IngredientPatch, NewIngredient, Nutrient},
    validation::Violations,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientRequest {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    #[serde(default)]
    pub percent_of_daily_needs: Option<f64>,
}

/// Validates a nutrient list, reporting problems as `{field}[i].name` etc.
pub(crate) fn check_nutrients(
    v: &mut Violations,
    field: &str,
    raw: Vec<NutrientRequest>,
) -> Vec<Nutrient> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(i, n)| {
            let name = v.required(&format!("{field}[{i}].name"), n.name.as_deref());
            let unit = n.unit.unwrap_or_default();
            let amount = match n.amount {
                Some(a) if a >= 0.0 => Some(a),
                Some(_) => {
                    v.push(format!("{field}[{i}].amount"), "must not be negative");
                    None
                }
                None => {
                    v.push(format!("{field}[{i}].amount"), "is required");
                    None
                }
            };
            Some(Nutrient {
                name: name?,
                amount: amount?,
                unit,
                percent_of_daily_needs: n.percent_of_daily_needs.unwrap_or(0.0),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewIngredientRequest {
    #[serde(default)]
    pub aisle: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    #[serde(default, alias = "original")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrients: Option<Vec<NutrientRequest>>,
}

impl NewIngredientRequest {
    pub fn validate(self) -> AppResult<(NewIngredient, Vec<Nutrient>)> {
        let mut v = Violations::new();
        let name = v.required("name", self.name.as_deref());
        let unit = v.required("unit", self.unit.as_deref());
        let amount = self.amount.or_else(|| {
            v.push("amount", "is required");
            None
        });
        if let Some(a) = amount {
            v.check(a >= 0.0, "amount", "must not be negative");
        }
        let nutrients = check_nutrients(&mut v, "nutrients", self.nutrients.unwrap_or_default());
        v.finish("ingredient")?;

        match (name, unit, amount) {
            (Some(name), Some(unit), Some(amount)) => Ok((
                NewIngredient {
                    aisle: self.aisle.unwrap_or_default(),
                    image: self.image.unwrap_or_default(),
                    name,
                    amount,
                    unit,
                    details: self.details.unwrap_or_default(),
                },
                nutrients,
            )),
            _ => Err(AppError::bad_request("invalid ingredient")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIngredientRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aisle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, alias = "original", skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl UpdateIngredientRequest {
    pub fn validate(self) -> AppResult<IngredientPatch> {
        let mut v = Violations::new();
        if let Some(name) = &self.name {
            v.check(!name.trim().is_empty(), "name", "must not be blank");
        }
        if let Some(a) = self.amount {
            v.check(a >= 0.0, "amount", "must not be negative");
        }
        v.finish("ingredient")?;
        Ok(IngredientPatch {
            aisle: self.aisle,
            image: self.image,
            name: self.name.map(|n| n.trim().to_string()),
            amount: self.amount,
            unit: self.unit,
            details: self.details,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngredientResponse {
    pub ingredient: Ingredient,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngredientDetailsResponse {
    pub ingredient: IngredientDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngredientsResponse {
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: i32,
}
