//! Typed client for the REST API plus the state the browser front end keeps:
//! the signed-in session, the meal-plan builder grid and favourite toggles.

pub mod api;
pub mod favorites;
pub mod grid;
pub mod planner;
pub mod session;

pub use api::{ClientError, ClientResult, RemplrClient};
pub use favorites::Favorite;
pub use grid::MealPlanGrid;
pub use planner::MealPlanBuilder;
pub use session::Session;

#[cfg(test)]
mod e2e;
