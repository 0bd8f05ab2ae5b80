pub mod app;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod extract;
pub mod foods;
pub mod health;
pub mod meal_plans;
pub mod meals;
pub mod nutrition;
pub mod state;
pub mod users;
pub mod validation;

#[cfg(test)]
mod tests;
