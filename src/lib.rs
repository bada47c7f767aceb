//! Meal-planning backend and its typed HTTP client.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod ingredients;
pub mod json;
pub mod mealplans;
pub mod recipes;
pub mod state;
pub mod store;
pub mod users;
pub mod validation;
