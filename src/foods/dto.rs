use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{Food, FoodFields};
use crate::{error::AppResult, validation};

fn default_category() -> String {
    "other".into()
}

/// Body for both create and full update.
#[derive(Debug, Clone, Deserialize)]
pub struct FoodRequest {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub fiber: Option<f64>,
    #[serde(default)]
    pub sugar: Option<f64>,
    pub serving_size: f64,
    #[serde(default)]
    pub category: Option<String>,
}

impl FoodRequest {
    pub fn validate(self) -> AppResult<FoodFields> {
        validation::not_blank("name", &self.name)?;
        let fiber = self.fiber.unwrap_or(0.0);
        let sugar = self.sugar.unwrap_or(0.0);
        for (field, value) in [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
            ("fiber", fiber),
            ("sugar", sugar),
            ("serving_size", self.serving_size),
        ] {
            validation::non_negative(field, value)?;
        }
        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(default_category);

        Ok(FoodFields {
            name: self.name.trim().to_string(),
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
            fiber,
            sugar,
            serving_size: self.serving_size,
            category,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct FoodQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FoodOut {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub serving_size: f64,
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Food> for FoodOut {
    fn from(f: Food) -> Self {
        Self {
            id: f.id,
            user_id: f.user_id,
            name: f.name,
            calories: f.calories,
            protein: f.protein,
            carbs: f.carbs,
            fat: f.fat,
            fiber: f.fiber,
            sugar: f.sugar,
            serving_size: f.serving_size,
            category: f.category,
            created_at: f.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oatmeal() -> FoodRequest {
        serde_json::from_value(serde_json::json!({
            "name": " Oatmeal ",
            "calories": 150.0,
            "protein": 5.0,
            "carbs": 27.0,
            "fat": 3.0,
            "serving_size": 1.0
        }))
        .unwrap()
    }

    #[test]
    fn optional_fields_get_defaults() {
        let fields = oatmeal().validate().unwrap();
        assert_eq!(fields.name, "Oatmeal");
        assert_eq!(fields.fiber, 0.0);
        assert_eq!(fields.sugar, 0.0);
        assert_eq!(fields.category, "other");
    }

    #[test]
    fn negative_nutrients_are_rejected() {
        let mut req = oatmeal();
        req.fat = -0.5;
        assert!(req.validate().is_err());

        let mut req = oatmeal();
        req.sugar = Some(-1.0);
        assert!(req.validate().is_err());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut req = oatmeal();
        req.name = "   ".into();
        assert!(req.validate().is_err());
    }
}
