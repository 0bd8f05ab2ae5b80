use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::MealPlan;
use crate::{error::AppResult, validation};

#[derive(Debug, Clone, Deserialize)]
pub struct MealPlanRequest {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
}

impl MealPlanRequest {
    pub fn validate(mut self) -> AppResult<Self> {
        validation::not_blank("name", &self.name)?;
        validation::date_range(&self.start_date, &self.end_date)?;
        self.name = self.name.trim().to_string();
        Ok(self)
    }
}

#[derive(Debug, Serialize)]
pub struct MealPlanOut {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<MealPlan> for MealPlanOut {
    fn from(p: MealPlan) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            name: p.name,
            start_date: p.start_date,
            end_date: p.end_date,
            created_at: p.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(start: &str, end: &str) -> MealPlanRequest {
        MealPlanRequest {
            name: " Cut week ".into(),
            start_date: start.into(),
            end_date: end.into(),
        }
    }

    #[test]
    fn accepts_ordered_range() {
        let p = plan("2024-06-01", "2024-06-07").validate().unwrap();
        assert_eq!(p.name, "Cut week");
        assert!(plan("2024-06-01", "2024-06-01").validate().is_ok());
    }

    #[test]
    fn rejects_reversed_or_malformed_range() {
        assert!(plan("2024-06-08", "2024-06-07").validate().is_err());
        assert!(plan("2024-6-1", "2024-06-07").validate().is_err());
    }
}
