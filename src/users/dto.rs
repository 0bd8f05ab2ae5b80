use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{decode_list, User};

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub activity_level: String,
    pub goal: String,
    pub dietary_preferences: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserOut {
    fn from(u: User) -> Self {
        let dietary_preferences = decode_list(u.dietary_preferences.as_deref());
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            gender: u.gender,
            age: u.age,
            weight: u.weight,
            height: u.height,
            activity_level: u.activity_level,
            goal: u.goal,
            dietary_preferences,
            created_at: u.created_at,
        }
    }
}

/// Profile update; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
    pub dietary_preferences: Option<Vec<String>>,
}
