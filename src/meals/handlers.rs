use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{MealOut, MealQuery, MealRequest},
    repo, services,
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
    validation,
};

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).post(create_meal))
        .route(
            "/meals/:id",
            get(get_meal).put(update_meal).delete(delete_meal),
        )
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(q): AppQuery<MealQuery>,
) -> AppResult<Json<Vec<MealOut>>> {
    if let Some(date) = &q.date {
        validation::parse_date("date", date)?;
    }
    let (limit, offset) = q.page();
    let meals = services::list_meals(&state.db, user_id, q.date.as_deref(), limit, offset).await?;
    Ok(Json(meals.into_iter().map(MealOut::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<MealOut>> {
    let meal = services::get_meal(&state.db, user_id, id).await?;
    Ok(Json(meal.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<MealRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<MealOut>)> {
    let (meal_header, items) = payload.validate()?;
    let meal = services::create_meal(&state.db, user_id, meal_header, &items).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/meals/{}", meal.meal.id)) {
        headers.insert(header::LOCATION, location);
    }

    Ok((StatusCode::CREATED, headers, Json(meal.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<MealRequest>,
) -> AppResult<Json<MealOut>> {
    let (meal_header, items) = payload.validate()?;
    let meal = services::update_meal(&state.db, user_id, id, meal_header, &items).await?;
    Ok(Json(meal.into()))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(AppError::NotFound("meal"));
    }
    info!(%user_id, meal_id = %id, "meal deleted");
    Ok(StatusCode::NO_CONTENT)
}
