use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::repo::{self, Meal, MealHeader, MealItemRow, NewMealItem};
use crate::{
    error::{AppError, AppResult},
    foods::repo::{self as foods_repo, Food},
    nutrition::Macros,
};

/// A requested `(food, serving multiplier)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemInput {
    pub food_id: Uuid,
    pub quantity: f64,
}

/// A meal as stored, with its items in insertion order.
#[derive(Debug, Clone)]
pub struct MealWithItems {
    pub meal: Meal,
    pub items: Vec<MealItemRow>,
}

/// Scales each food's per-serving macros by the requested quantity and sums
/// them. Fails if any referenced food is absent from `foods`.
pub fn compose_items(
    inputs: &[ItemInput],
    foods: &HashMap<Uuid, Food>,
) -> AppResult<(Vec<NewMealItem>, Macros)> {
    let items = inputs
        .iter()
        .map(|input| {
            let food = foods.get(&input.food_id).ok_or(AppError::NotFound("food"))?;
            let per_serving = Macros::new(food.calories, food.protein, food.carbs, food.fat);
            Ok(NewMealItem {
                food_id: input.food_id,
                quantity: input.quantity,
                macros: per_serving.scale(input.quantity),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let totals: Macros = items.iter().map(|i| i.macros).sum();
    Ok((items, totals))
}

/// Resolves the caller's foods for `inputs` and composes the items, all
/// inside the open transaction.
async fn resolve_and_replace(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    meal_id: Uuid,
    inputs: &[ItemInput],
) -> AppResult<Macros> {
    let ids: Vec<Uuid> = inputs
        .iter()
        .map(|i| i.food_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let foods: HashMap<Uuid, Food> = foods_repo::get_many_tx(tx, user_id, &ids)
        .await?
        .into_iter()
        .map(|f| (f.id, f))
        .collect();

    let (items, totals) = compose_items(inputs, &foods)?;
    repo::replace_items_tx(tx, meal_id, &items, totals).await?;
    debug!(%meal_id, items = items.len(), calories = totals.calories, "meal items replaced");
    Ok(totals)
}

async fn load_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    meal_id: Uuid,
) -> AppResult<MealWithItems> {
    let meal = repo::get(&mut **tx, user_id, meal_id)
        .await?
        .ok_or(AppError::NotFound("meal"))?;
    let items = repo::items_for_meals(&mut **tx, &[meal_id]).await?;
    Ok(MealWithItems { meal, items })
}

/// Creates the meal, its items and its totals in one transaction.
pub async fn create_meal(
    db: &PgPool,
    user_id: Uuid,
    header: MealHeader,
    inputs: &[ItemInput],
) -> AppResult<MealWithItems> {
    let mut tx = db.begin().await?;
    let meal_id = repo::insert_header_tx(&mut tx, user_id, &header).await?;
    resolve_and_replace(&mut tx, user_id, meal_id, inputs).await?;
    let out = load_tx(&mut tx, user_id, meal_id).await?;
    tx.commit().await?;

    info!(%user_id, %meal_id, "meal created");
    Ok(out)
}

/// Full replace of header and items. The meal row stays locked until commit,
/// so a concurrent replace waits and then overwrites.
pub async fn update_meal(
    db: &PgPool,
    user_id: Uuid,
    meal_id: Uuid,
    header: MealHeader,
    inputs: &[ItemInput],
) -> AppResult<MealWithItems> {
    let mut tx = db.begin().await?;
    if repo::lock_tx(&mut tx, user_id, meal_id).await?.is_none() {
        return Err(AppError::NotFound("meal"));
    }
    repo::update_header_tx(&mut tx, meal_id, &header).await?;
    resolve_and_replace(&mut tx, user_id, meal_id, inputs).await?;
    let out = load_tx(&mut tx, user_id, meal_id).await?;
    tx.commit().await?;

    info!(%user_id, %meal_id, "meal updated");
    Ok(out)
}

pub async fn get_meal(db: &PgPool, user_id: Uuid, meal_id: Uuid) -> AppResult<MealWithItems> {
    let meal = repo::get(db, user_id, meal_id)
        .await?
        .ok_or(AppError::NotFound("meal"))?;
    let items = repo::items_for_meals(db, &[meal_id]).await?;
    Ok(MealWithItems { meal, items })
}

pub async fn list_meals(
    db: &PgPool,
    user_id: Uuid,
    date: Option<&str>,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<MealWithItems>> {
    let meals = repo::list_by_user(db, user_id, date, limit, offset).await?;
    let ids: Vec<Uuid> = meals.iter().map(|m| m.id).collect();
    let items = repo::items_for_meals(db, &ids).await?;
    Ok(attach_items(meals, items))
}

/// Groups item rows under their meals, keeping meal order and item order.
pub fn attach_items(meals: Vec<Meal>, items: Vec<MealItemRow>) -> Vec<MealWithItems> {
    let mut by_meal: HashMap<Uuid, Vec<MealItemRow>> = HashMap::new();
    for item in items {
        by_meal.entry(item.meal_id).or_default().push(item);
    }
    meals
        .into_iter()
        .map(|meal| {
            let items = by_meal.remove(&meal.id).unwrap_or_default();
            MealWithItems { meal, items }
        })
        .collect()
}
