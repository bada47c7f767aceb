//! Weekly meal-plan builder: a meal-type x day grid that flattens into a
//! create request on submit.

use crate::mealplans::{
    dto::{CreateMealPlanRequest, SlotRequest},
    repo_types::{MealType, DAYS_PER_WEEK},
};

use super::session::Session;

const DAYS: usize = DAYS_PER_WEEK as usize;
const ROWS: usize = MealType::ALL.len();

/// The recipe picked for one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeChoice {
    pub id: i32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    #[error("day index {0} is outside the week")]
    DayOutOfRange(usize),
    #[error("{0} row is hidden")]
    RowHidden(MealType),
}

#[derive(Debug, Clone, Default)]
pub struct MealPlanBuilder {
    name: String,
    visible: [bool; ROWS],
    cells: [[Option<RecipeChoice>; DAYS]; ROWS],
}

impl MealPlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn show_row(&mut self, meal_type: MealType) {
        self.visible[meal_type.row()] = true;
    }

    /// Hides the row and forgets every recipe placed in it.
    pub fn hide_row(&mut self, meal_type: MealType) {
        let row = meal_type.row();
        self.visible[row] = false;
        self.cells[row] = Default::default();
    }

    pub fn is_visible(&self, meal_type: MealType) -> bool {
        self.visible[meal_type.row()]
    }

    pub fn visible_rows(&self) -> Vec<MealType> {
        MealType::ALL
            .into_iter()
            .filter(|t| self.is_visible(*t))
            .collect()
    }

    /// Places `recipe` in the cell, replacing whatever was there.
    /// `day_index` is 0-based (0 is the first day of the week).
    pub fn set_cell(
        &mut self,
        meal_type: MealType,
        day_index: usize,
        recipe: RecipeChoice,
    ) -> Result<Option<RecipeChoice>, BuilderError> {
        if day_index >= DAYS {
            return Err(BuilderError::DayOutOfRange(day_index));
        }
        if !self.is_visible(meal_type) {
            return Err(BuilderError::RowHidden(meal_type));
        }
        Ok(self.cells[meal_type.row()][day_index].replace(recipe))
    }

    pub fn clear_cell(&mut self, meal_type: MealType, day_index: usize) -> Option<RecipeChoice> {
        self.cells
            .get_mut(meal_type.row())
            .and_then(|row| row.get_mut(day_index))
            .and_then(Option::take)
    }

    pub fn cell(&self, meal_type: MealType, day_index: usize) -> Option<&RecipeChoice> {
        self.cells[meal_type.row()].get(day_index)?.as_ref()
    }

    pub fn filled_cells(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Hides every row and empties the grid. The name is kept.
    pub fn reset(&mut self) {
        self.visible = [false; ROWS];
        self.cells = Default::default();
    }

    /// Builds the create request, reporting every problem at once.
    ///
    /// `confirm_username` must match the signed-in user; it becomes `created_by`.
    pub fn submit(
        &self,
        session: &Session,
        confirm_username: &str,
    ) -> Result<CreateMealPlanRequest, Vec<String>> {
        let mut errors = Vec::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.push("Please enter a meal plan name.".to_string());
        }
        if confirm_username.trim() != session.username() {
            errors.push("Please enter correct username.".to_string());
        }
        if self.filled_cells() == 0 {
            errors.push("You must add at least one recipe to the meal plan.".to_string());
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let recipes = MealType::ALL
            .into_iter()
            .flat_map(|meal_type| {
                self.cells[meal_type.row()]
                    .iter()
                    .enumerate()
                    .filter_map(move |(day, cell)| {
                        cell.as_ref()
                            .map(|r| SlotRequest::new(r.id, meal_type, day as i32 + 1))
                    })
            })
            .collect();

        Ok(CreateMealPlanRequest {
            meal_plan_name: Some(name.to_string()),
            created_by: Some(session.username().to_string()),
            user_id: Some(session.user.id),
            recipes: Some(recipes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{dto::PublicUser, repo_types::Role};

    fn alice() -> Session {
        Session::new(
            "token",
            None,
            PublicUser {
                id: 3,
                username: "alice".into(),
                first_name: "Alice".into(),
                last_name: "Liddell".into(),
                email: "alice@example.com".into(),
                role: Role::Nutritionist,
                is_admin: false,
                is_nutritionist: true,
                is_client: false,
            },
        )
    }

    fn choice(id: i32) -> RecipeChoice {
        RecipeChoice {
            id,
            title: format!("Recipe {id}"),
        }
    }

    #[test]
    fn cells_hold_one_recipe() {
        let mut b = MealPlanBuilder::new();
        b.show_row(MealType::Lunch);
        assert_eq!(b.set_cell(MealType::Lunch, 2, choice(1)).unwrap(), None);
        assert_eq!(
            b.set_cell(MealType::Lunch, 2, choice(2)).unwrap(),
            Some(choice(1))
        );
        assert_eq!(b.cell(MealType::Lunch, 2), Some(&choice(2)));
        assert_eq!(b.filled_cells(), 1);
    }

    #[test]
    fn hidden_rows_reject_and_lose_cells() {
        let mut b = MealPlanBuilder::new();
        assert_eq!(
            b.set_cell(MealType::Snack, 0, choice(1)),
            Err(BuilderError::RowHidden(MealType::Snack))
        );
        b.show_row(MealType::Snack);
        b.set_cell(MealType::Snack, 0, choice(1)).unwrap();
        b.hide_row(MealType::Snack);
        b.show_row(MealType::Snack);
        assert_eq!(b.cell(MealType::Snack, 0), None);
        assert_eq!(
            b.set_cell(MealType::Snack, 7, choice(1)),
            Err(BuilderError::DayOutOfRange(7))
        );
    }

    #[test]
    fn reset_hides_everything() {
        let mut b = MealPlanBuilder::new();
        b.show_row(MealType::Breakfast);
        b.show_row(MealType::Dinner);
        b.set_cell(MealType::Dinner, 6, choice(9)).unwrap();
        b.reset();
        assert!(b.visible_rows().is_empty());
        assert_eq!(b.filled_cells(), 0);
    }

    #[test]
    fn submit_flattens_by_meal_type_then_day() {
        let mut b = MealPlanBuilder::new();
        b.set_name("Week1");
        b.show_row(MealType::Dinner);
        b.show_row(MealType::Breakfast);
        b.set_cell(MealType::Dinner, 0, choice(3)).unwrap();
        b.set_cell(MealType::Breakfast, 4, choice(2)).unwrap();
        b.set_cell(MealType::Breakfast, 1, choice(1)).unwrap();

        let req = b.submit(&alice(), "alice").unwrap();
        assert_eq!(req.meal_plan_name.as_deref(), Some("Week1"));
        assert_eq!(req.created_by.as_deref(), Some("alice"));
        assert_eq!(req.user_id, Some(3));
        assert_eq!(
            req.recipes.unwrap(),
            vec![
                SlotRequest::new(1, MealType::Breakfast, 2),
                SlotRequest::new(2, MealType::Breakfast, 5),
                SlotRequest::new(3, MealType::Dinner, 1),
            ]
        );
    }

    #[test]
    fn submit_reports_every_problem() {
        let b = MealPlanBuilder::new();
        let errors = b.submit(&alice(), "bob").unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&"Please enter correct username.".to_string()));
    }
}
