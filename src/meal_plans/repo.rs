use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub created_at: OffsetDateTime,
}

const PLAN_COLUMNS: &str = "id, user_id, name, start_date, end_date, created_at";

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<MealPlan>> {
    sqlx::query_as::<_, MealPlan>(&format!(
        "SELECT {PLAN_COLUMNS} FROM meal_plans WHERE user_id = $1 ORDER BY start_date DESC, created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn get(db: &PgPool, user_id: Uuid, id: Uuid) -> sqlx::Result<Option<MealPlan>> {
    sqlx::query_as::<_, MealPlan>(&format!(
        "SELECT {PLAN_COLUMNS} FROM meal_plans WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    start_date: &str,
    end_date: &str,
) -> sqlx::Result<MealPlan> {
    sqlx::query_as::<_, MealPlan>(&format!(
        r#"
        INSERT INTO meal_plans (user_id, name, start_date, end_date)
        VALUES ($1, $2, $3, $4)
        RETURNING {PLAN_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(name)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(db)
    .await
}

pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    name: &str,
    start_date: &str,
    end_date: &str,
) -> sqlx::Result<Option<MealPlan>> {
    sqlx::query_as::<_, MealPlan>(&format!(
        r#"
        UPDATE meal_plans SET name = $3, start_date = $4, end_date = $5
        WHERE id = $1 AND user_id = $2
        RETURNING {PLAN_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(start_date)
    .bind(end_date)
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM meal_plans WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
