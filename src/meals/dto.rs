use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    repo::{MealHeader, MealItemRow},
    services::{ItemInput, MealWithItems},
};
use crate::{
    error::{AppError, AppResult},
    validation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl FromStr for MealType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            _ => Err(AppError::validation(
                "meal_type must be one of breakfast, lunch, dinner, snack",
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MealItemRequest {
    pub food_id: Uuid,
    pub quantity: f64,
}

/// Body for both create and full replace.
#[derive(Debug, Clone, Deserialize)]
pub struct MealRequest {
    pub name: String,
    pub meal_type: String,
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub items: Vec<MealItemRequest>,
}

impl MealRequest {
    pub fn validate(self) -> AppResult<(MealHeader, Vec<ItemInput>)> {
        validation::not_blank("name", &self.name)?;
        let meal_type = MealType::from_str(&self.meal_type)?;
        validation::parse_date("date", &self.date)?;
        let time = match self.time.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(t) => {
                validation::parse_time("time", t)?;
                Some(t.to_string())
            }
        };
        let items = self
            .items
            .iter()
            .map(|i| {
                validation::non_negative("quantity", i.quantity)?;
                Ok(ItemInput {
                    food_id: i.food_id,
                    quantity: i.quantity,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let header = MealHeader {
            name: self.name.trim().to_string(),
            meal_type: meal_type.as_str().to_string(),
            date: self.date,
            time,
        };
        Ok((header, items))
    }
}

#[derive(Debug, Deserialize)]
pub struct MealQuery {
    pub date: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl MealQuery {
    pub fn page(&self) -> (i64, i64) {
        (self.limit.clamp(1, 200), self.offset.max(0))
    }
}

#[derive(Debug, Serialize)]
pub struct MealItemOut {
    pub id: Uuid,
    pub food_id: Uuid,
    pub food_name: String,
    pub quantity: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl From<MealItemRow> for MealItemOut {
    fn from(r: MealItemRow) -> Self {
        Self {
            id: r.id,
            food_id: r.food_id,
            food_name: r.food_name,
            quantity: r.quantity,
            calories: r.calories,
            protein: r.protein,
            carbs: r.carbs,
            fat: r.fat,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MealOut {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub meal_type: String,
    pub date: String,
    pub time: Option<String>,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
    pub items: Vec<MealItemOut>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<MealWithItems> for MealOut {
    fn from(MealWithItems { meal, items }: MealWithItems) -> Self {
        Self {
            id: meal.id,
            user_id: meal.user_id,
            name: meal.name,
            meal_type: meal.meal_type,
            date: meal.date,
            time: meal.time,
            total_calories: meal.total_calories,
            total_protein: meal.total_protein,
            total_carbs: meal.total_carbs,
            total_fat: meal.total_fat,
            items: items.into_iter().map(MealItemOut::from).collect(),
            created_at: meal.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(v: serde_json::Value) -> MealRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn valid_request_normalizes_header() {
        let food_id = Uuid::new_v4();
        let (header, items) = request(json!({
            "name": " Breakfast bowl ",
            "meal_type": "Breakfast",
            "date": "2024-05-01",
            "time": "07:45",
            "items": [{"food_id": food_id, "quantity": 2.0}]
        }))
        .validate()
        .unwrap();

        assert_eq!(header.name, "Breakfast bowl");
        assert_eq!(header.meal_type, "breakfast");
        assert_eq!(header.time.as_deref(), Some("07:45"));
        assert_eq!(items, vec![ItemInput { food_id, quantity: 2.0 }]);
    }

    #[test]
    fn items_and_time_are_optional() {
        let (header, items) = request(json!({
            "name": "Tea",
            "meal_type": "snack",
            "date": "2024-05-01",
            "time": ""
        }))
        .validate()
        .unwrap();
        assert!(items.is_empty());
        assert_eq!(header.time, None);
    }

    #[test]
    fn rejects_bad_fields() {
        let base = json!({"name": "x", "meal_type": "lunch", "date": "2024-05-01"});

        let mut v = base.clone();
        v["meal_type"] = json!("brunch");
        assert!(request(v).validate().is_err());

        let mut v = base.clone();
        v["date"] = json!("05/01/2024");
        assert!(request(v).validate().is_err());

        let mut v = base.clone();
        v["time"] = json!("25:00");
        assert!(request(v).validate().is_err());

        let mut v = base;
        v["items"] = json!([{"food_id": Uuid::new_v4(), "quantity": -1.0}]);
        assert!(request(v).validate().is_err());
    }

    #[test]
    fn page_is_clamped() {
        let q: MealQuery = serde_json::from_value(json!({"limit": 10_000, "offset": -4})).unwrap();
        assert_eq!(q.page(), (200, 0));
        let q: MealQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(q.page(), (50, 0));
    }
}
