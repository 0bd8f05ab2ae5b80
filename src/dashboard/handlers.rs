use axum::{extract::State, Json};
use time::OffsetDateTime;
use tracing::instrument;

use super::{dto::Dashboard, services};
use crate::{auth::jwt::AuthUser, error::AppResult, state::AppState};

/// "Today" is the UTC calendar date.
#[instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Dashboard>> {
    let today = OffsetDateTime::now_utc().date();
    let dashboard = services::load_dashboard(&state.db, user_id, today).await?;
    Ok(Json(dashboard))
}
