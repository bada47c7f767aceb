use crate::mealplans::repo_types::{MealPlanDetails, MealType, PlannedRecipe, DAYS_PER_WEEK};

/// Column headers; `meal_day` 1 is the first entry.
pub const DAY_NAMES: [&str; DAYS_PER_WEEK as usize] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Read-only view of a stored plan laid out as meal type x day.
/// Unlike the builder, a cell may hold several recipes.
#[derive(Debug, Clone, PartialEq)]
pub struct MealPlanGrid {
    pub name: String,
    pub created_by: String,
    cells: Vec<Vec<Vec<PlannedRecipe>>>,
}

impl MealPlanGrid {
    pub fn from_details(details: &MealPlanDetails) -> Self {
        let mut cells =
            vec![vec![Vec::new(); DAYS_PER_WEEK as usize]; MealType::ALL.len()];
        for planned in &details.recipes {
            let day = (planned.meal_day - 1).clamp(0, DAYS_PER_WEEK - 1) as usize;
            cells[planned.meal_type.row()][day].push(planned.clone());
        }
        Self {
            name: details.plan.name.clone(),
            created_by: details.plan.created_by.clone(),
            cells,
        }
    }

    /// `meal_day` is 1-based; out-of-range days are empty.
    pub fn cell(&self, meal_type: MealType, meal_day: i32) -> &[PlannedRecipe] {
        usize::try_from(meal_day - 1)
            .ok()
            .and_then(|d| self.cells[meal_type.row()].get(d))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Titles per day for one row, in column order.
    pub fn row_titles(&self, meal_type: MealType) -> Vec<Vec<&str>> {
        self.cells[meal_type.row()]
            .iter()
            .map(|cell| cell.iter().map(|p| p.recipe.title.as_str()).collect())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(Vec::is_empty)
    }

    /// Distinct recipe ids in first-seen order, for the recipe cards under the grid.
    pub fn recipe_ids(&self) -> Vec<i32> {
        let mut ids = Vec::new();
        for planned in self.cells.iter().flatten().flatten() {
            if !ids.contains(&planned.recipe_id) {
                ids.push(planned.recipe_id);
            }
        }
        ids
    }
}
