use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgExecutor, FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::Macros;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
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
    pub created_at: OffsetDateTime,
}

impl Meal {
    pub fn totals(&self) -> Macros {
        Macros::new(
            self.total_calories,
            self.total_protein,
            self.total_carbs,
            self.total_fat,
        )
    }
}

/// Meal item joined with the name of its food.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealItemRow {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub food_id: Uuid,
    pub food_name: String,
    pub quantity: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Header columns of a meal; totals are owned by the aggregation service.
#[derive(Debug, Clone)]
pub struct MealHeader {
    pub name: String,
    pub meal_type: String,
    pub date: String,
    pub time: Option<String>,
}

/// One item ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMealItem {
    pub food_id: Uuid,
    pub quantity: f64,
    pub macros: Macros,
}

const MEAL_COLUMNS: &str = "id, user_id, name, meal_type, date, time, total_calories, \
     total_protein, total_carbs, total_fat, created_at";

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    date: Option<&str>,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<Meal>> {
    sqlx::query_as::<_, Meal>(&format!(
        r#"
        SELECT {MEAL_COLUMNS}
        FROM meals
        WHERE user_id = $1 AND ($2::text IS NULL OR date = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(user_id)
    .bind(date)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

/// Meals dated within `[from, to]`; `YYYY-MM-DD` strings compare like dates.
pub async fn list_in_range(
    db: &PgPool,
    user_id: Uuid,
    from: &str,
    to: &str,
) -> sqlx::Result<Vec<Meal>> {
    sqlx::query_as::<_, Meal>(&format!(
        r#"
        SELECT {MEAL_COLUMNS}
        FROM meals
        WHERE user_id = $1 AND date >= $2 AND date <= $3
        ORDER BY date ASC, created_at ASC
        "#
    ))
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(db)
    .await
}

pub async fn get<'e, E: PgExecutor<'e>>(
    ex: E,
    user_id: Uuid,
    id: Uuid,
) -> sqlx::Result<Option<Meal>> {
    sqlx::query_as::<_, Meal>(&format!(
        "SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(ex)
    .await
}

/// Row-locks the meal until the transaction ends; concurrent item replaces
/// on the same meal queue up here.
pub async fn lock_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    id: Uuid,
) -> sqlx::Result<Option<Meal>> {
    sqlx::query_as::<_, Meal>(&format!(
        "SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1 AND user_id = $2 FOR UPDATE"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn items_for_meals<'e, E: PgExecutor<'e>>(
    ex: E,
    meal_ids: &[Uuid],
) -> sqlx::Result<Vec<MealItemRow>> {
    sqlx::query_as::<_, MealItemRow>(
        r#"
        SELECT mi.id, mi.meal_id, mi.food_id, f.name AS food_name, mi.quantity,
               mi.calories, mi.protein, mi.carbs, mi.fat
        FROM meal_items mi
        JOIN foods f ON f.id = mi.food_id
        WHERE mi.meal_id = ANY($1)
        ORDER BY mi.meal_id, mi.position
        "#,
    )
    .bind(meal_ids)
    .fetch_all(ex)
    .await
}

pub async fn insert_header_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    h: &MealHeader,
) -> sqlx::Result<Uuid> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO meals (user_id, name, meal_type, date, time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(&h.name)
    .bind(&h.meal_type)
    .bind(&h.date)
    .bind(&h.time)
    .fetch_one(&mut **tx)
    .await
}

pub async fn update_header_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    h: &MealHeader,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE meals SET name = $2, meal_type = $3, date = $4, time = $5 WHERE id = $1")
        .bind(id)
        .bind(&h.name)
        .bind(&h.meal_type)
        .bind(&h.date)
        .bind(&h.time)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Drops the current items and association rows and writes the new set
/// together with the matching totals.
pub async fn replace_items_tx(
    tx: &mut Transaction<'_, Postgres>,
    meal_id: Uuid,
    items: &[NewMealItem],
    totals: Macros,
) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM meal_items WHERE meal_id = $1")
        .bind(meal_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM meal_foods WHERE meal_id = $1")
        .bind(meal_id)
        .execute(&mut **tx)
        .await?;

    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO meal_items (meal_id, food_id, position, quantity, calories, protein, carbs, fat)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(meal_id)
        .bind(item.food_id)
        .bind(position as i32)
        .bind(item.quantity)
        .bind(item.macros.calories)
        .bind(item.macros.protein)
        .bind(item.macros.carbs)
        .bind(item.macros.fat)
        .execute(&mut **tx)
        .await?;
    }

    for (food_id, quantity) in food_quantities(items) {
        sqlx::query("INSERT INTO meal_foods (meal_id, food_id, quantity) VALUES ($1, $2, $3)")
            .bind(meal_id)
            .bind(food_id)
            .bind(quantity)
            .execute(&mut **tx)
            .await?;
    }

    sqlx::query(
        r#"
        UPDATE meals SET total_calories = $2, total_protein = $3, total_carbs = $4, total_fat = $5
        WHERE id = $1
        "#,
    )
    .bind(meal_id)
    .bind(totals.calories)
    .bind(totals.protein)
    .bind(totals.carbs)
    .bind(totals.fat)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Per-food quantity inside a meal; repeated foods are summed.
pub fn food_quantities(items: &[NewMealItem]) -> BTreeMap<Uuid, f64> {
    let mut out = BTreeMap::new();
    for item in items {
        *out.entry(item.food_id).or_insert(0.0) += item.quantity;
    }
    out
}

/// Items and association rows go with the meal (ON DELETE CASCADE).
pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM meals WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
