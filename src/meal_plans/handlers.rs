use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{MealPlanOut, MealPlanRequest},
    repo,
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult},
    extract::{AppJson, AppPath},
    state::AppState,
};

pub fn meal_plan_routes() -> Router<AppState> {
    Router::new()
        .route("/meal-plans", get(list_plans).post(create_plan))
        .route(
            "/meal-plans/:id",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
}

#[instrument(skip(state))]
pub async fn list_plans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<MealPlanOut>>> {
    let plans = repo::list_by_user(&state.db, user_id).await?;
    Ok(Json(plans.into_iter().map(MealPlanOut::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<MealPlanOut>> {
    let plan = repo::get(&state.db, user_id, id)
        .await?
        .ok_or(AppError::NotFound("meal plan"))?;
    Ok(Json(plan.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<MealPlanRequest>,
) -> AppResult<(StatusCode, Json<MealPlanOut>)> {
    let p = payload.validate()?;
    let plan = repo::create(&state.db, user_id, &p.name, &p.start_date, &p.end_date).await?;
    info!(%user_id, plan_id = %plan.id, "meal plan created");
    Ok((StatusCode::CREATED, Json(plan.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<MealPlanRequest>,
) -> AppResult<Json<MealPlanOut>> {
    let p = payload.validate()?;
    let plan = repo::update(&state.db, user_id, id, &p.name, &p.start_date, &p.end_date)
        .await?
        .ok_or(AppError::NotFound("meal plan"))?;
    Ok(Json(plan.into()))
}

#[instrument(skip(state))]
pub async fn delete_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(AppError::NotFound("meal plan"));
    }
    info!(%user_id, plan_id = %id, "meal plan deleted");
    Ok(StatusCode::NO_CONTENT)
}
