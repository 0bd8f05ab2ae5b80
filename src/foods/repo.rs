use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

/// Nutrients per serving, owned by the user who created it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Food {
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
    pub created_at: OffsetDateTime,
}

/// Column values for insert and full update.
#[derive(Debug, Clone)]
pub struct FoodFields {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub serving_size: f64,
    pub category: String,
}

const FOOD_COLUMNS: &str = "id, user_id, name, calories, protein, carbs, fat, fiber, sugar, \
     serving_size, category, created_at";

/// `ILIKE` pattern matching `search` anywhere in the name, with the
/// wildcards of the input taken literally.
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.trim().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    category: Option<&str>,
    search: Option<&str>,
) -> sqlx::Result<Vec<Food>> {
    let pattern = search.map(contains_pattern);
    sqlx::query_as::<_, Food>(&format!(
        r#"
        SELECT {FOOD_COLUMNS}
        FROM foods
        WHERE user_id = $1
          AND ($2::text IS NULL OR category = $2)
          AND ($3::text IS NULL OR name ILIKE $3 ESCAPE '\')
        ORDER BY name ASC
        "#
    ))
    .bind(user_id)
    .bind(category)
    .bind(pattern)
    .fetch_all(db)
    .await
}

pub async fn get(db: &PgPool, user_id: Uuid, id: Uuid) -> sqlx::Result<Option<Food>> {
    sqlx::query_as::<_, Food>(&format!(
        "SELECT {FOOD_COLUMNS} FROM foods WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Foods among `ids` owned by `user_id`, read inside the caller's transaction.
pub async fn get_many_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    ids: &[Uuid],
) -> sqlx::Result<Vec<Food>> {
    sqlx::query_as::<_, Food>(&format!(
        "SELECT {FOOD_COLUMNS} FROM foods WHERE user_id = $1 AND id = ANY($2)"
    ))
    .bind(user_id)
    .bind(ids)
    .fetch_all(&mut **tx)
    .await
}

pub async fn create(db: &PgPool, user_id: Uuid, f: &FoodFields) -> sqlx::Result<Food> {
    sqlx::query_as::<_, Food>(&format!(
        r#"
        INSERT INTO foods (user_id, name, calories, protein, carbs, fat, fiber, sugar,
                           serving_size, category)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {FOOD_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&f.name)
    .bind(f.calories)
    .bind(f.protein)
    .bind(f.carbs)
    .bind(f.fat)
    .bind(f.fiber)
    .bind(f.sugar)
    .bind(f.serving_size)
    .bind(&f.category)
    .fetch_one(db)
    .await
}

/// Existing meal items keep the macros they were created with.
pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    f: &FoodFields,
) -> sqlx::Result<Option<Food>> {
    sqlx::query_as::<_, Food>(&format!(
        r#"
        UPDATE foods SET
            name = $3, calories = $4, protein = $5, carbs = $6, fat = $7,
            fiber = $8, sugar = $9, serving_size = $10, category = $11
        WHERE id = $1 AND user_id = $2
        RETURNING {FOOD_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(&f.name)
    .bind(f.calories)
    .bind(f.protein)
    .bind(f.carbs)
    .bind(f.fat)
    .bind(f.fiber)
    .bind(f.sugar)
    .bind(f.serving_size)
    .bind(&f.category)
    .fetch_optional(db)
    .await
}

pub async fn is_referenced(db: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM meal_items WHERE food_id = $1)",
    )
    .bind(id)
    .fetch_one(db)
    .await
}

/// Returns whether a row was removed.
pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM foods WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
