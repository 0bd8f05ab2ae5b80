use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::validation::LIST_DELIMITER;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never exposed
    pub full_name: String,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub activity_level: String,
    pub goal: String,
    pub dietary_preferences: Option<String>, // comma-joined, see encode_list
    pub created_at: OffsetDateTime,
}

/// Profile columns written by an update; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
    pub dietary_preferences: Option<Vec<String>>,
}

const USER_COLUMNS: &str = "id, email, password_hash, full_name, gender, age, weight, height, \
     activity_level, goal, dietary_preferences, created_at";

pub fn encode_list(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(&LIST_DELIMITER.to_string()))
    }
}

pub fn decode_list(stored: Option<&str>) -> Vec<String> {
    stored
        .map(|s| {
            s.split(LIST_DELIMITER)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Insert a new user; a duplicate email surfaces as a unique violation.
    pub async fn create(
        db: &PgPool,
        email: &str,
        full_name: &str,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, full_name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(full_name)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        changes: ProfileChanges,
    ) -> sqlx::Result<Option<User>> {
        let preferences = changes.dietary_preferences.as_deref().map(encode_list);
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                full_name           = COALESCE($2, full_name),
                gender              = COALESCE($3, gender),
                age                 = COALESCE($4, age),
                weight              = COALESCE($5, weight),
                height              = COALESCE($6, height),
                activity_level      = COALESCE($7, activity_level),
                goal                = COALESCE($8, goal),
                dietary_preferences = CASE WHEN $9 THEN $10 ELSE dietary_preferences END
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.full_name)
        .bind(changes.gender)
        .bind(changes.age)
        .bind(changes.weight)
        .bind(changes.height)
        .bind(changes.activity_level)
        .bind(changes.goal)
        .bind(preferences.is_some())
        .bind(preferences.flatten())
        .fetch_optional(db)
        .await
    }
}
