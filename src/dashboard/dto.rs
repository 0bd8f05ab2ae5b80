use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{meals::repo::Meal, nutrition::Macros};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayStats {
    #[serde(flatten)]
    pub macros: Macros,
    pub meal_count: u32,
}

impl DayStats {
    pub fn add(&mut self, meal: &Meal) {
        self.macros += meal.totals();
        self.meal_count += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayProgress {
    pub date: String,
    #[serde(flatten)]
    pub stats: DayStats,
}

/// Stored meal totals, exactly as persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentMeal {
    pub id: Uuid,
    pub name: String,
    pub meal_type: String,
    pub date: String,
    pub time: Option<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Meal> for RecentMeal {
    fn from(m: Meal) -> Self {
        Self {
            id: m.id,
            name: m.name,
            meal_type: m.meal_type,
            date: m.date,
            time: m.time,
            calories: m.total_calories,
            protein: m.total_protein,
            carbs: m.total_carbs,
            fat: m.total_fat,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub today_stats: DayStats,
    pub weekly_progress: Vec<DayProgress>,
    pub recent_meals: Vec<RecentMeal>,
}
