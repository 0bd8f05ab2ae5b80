use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{FoodOut, FoodQuery, FoodRequest},
    repo,
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods).post(create_food))
        .route(
            "/foods/:id",
            get(get_food).put(update_food).delete(delete_food),
        )
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(q): AppQuery<FoodQuery>,
) -> AppResult<Json<Vec<FoodOut>>> {
    let foods = repo::list_by_user(
        &state.db,
        user_id,
        q.category.as_deref(),
        q.search.as_deref(),
    )
    .await?;
    Ok(Json(foods.into_iter().map(FoodOut::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<FoodOut>> {
    let food = repo::get(&state.db, user_id, id)
        .await?
        .ok_or(AppError::NotFound("food"))?;
    Ok(Json(food.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<FoodRequest>,
) -> AppResult<(StatusCode, Json<FoodOut>)> {
    let fields = payload.validate()?;
    let food = repo::create(&state.db, user_id, &fields).await?;
    info!(%user_id, food_id = %food.id, "food created");
    Ok((StatusCode::CREATED, Json(food.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<FoodRequest>,
) -> AppResult<Json<FoodOut>> {
    let fields = payload.validate()?;
    let food = repo::update(&state.db, user_id, id, &fields)
        .await?
        .ok_or(AppError::NotFound("food"))?;
    info!(%user_id, food_id = %id, "food updated");
    Ok(Json(food.into()))
}

/// Foods used by any meal item cannot be deleted.
#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    if repo::get(&state.db, user_id, id).await?.is_none() {
        return Err(AppError::NotFound("food"));
    }
    if repo::is_referenced(&state.db, id).await? {
        warn!(%user_id, food_id = %id, "delete of referenced food refused");
        return Err(AppError::Conflict("Food is used by existing meals".into()));
    }
    // the foreign key still guards a meal created in between
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(AppError::NotFound("food"));
    }
    info!(%user_id, food_id = %id, "food deleted");
    Ok(StatusCode::NO_CONTENT)
}
