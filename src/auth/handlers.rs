use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    error::{AppError, AppResult},
    extract::AppJson,
    state::AppState,
    users::repo::User,
    validation,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Maps a failed insert; a unique violation means the email is taken.
fn registration_error(err: sqlx::Error) -> AppError {
    match AppError::from(err) {
        AppError::Conflict(_) => AppError::Conflict("Email already registered".into()),
        other => other,
    }
}

fn issue_tokens(keys: &JwtKeys, user: User) -> AppResult<TokenResponse> {
    let access_token = keys.sign_access(user.id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        AppError::Internal(e)
    })?;
    let refresh_token = keys.sign_refresh(user.id).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        AppError::Internal(e)
    })?;
    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "bearer",
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    payload.email = payload.email.trim().to_string();

    validation::email(&payload.email).inspect_err(|_| {
        warn!(email = %payload.email, "invalid email");
    })?;
    validation::not_blank("full_name", &payload.full_name)?;
    validation::password(&payload.password).inspect_err(|_| warn!("password too short"))?;

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;

    // a concurrent registration can still win the race; the unique index decides
    let user = User::create(&state.db, &payload.email, payload.full_name.trim(), &hash)
        .await
        .map_err(registration_error)?;

    let keys = JwtKeys::from_ref(&state);
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(issue_tokens(&keys, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    payload.email = payload.email.trim().to_string();

    validation::email(&payload.email)?;

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::auth("Invalid credentials"));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::auth("Invalid credentials"));
    }

    let keys = JwtKeys::from_ref(&state);
    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::auth("Invalid refresh token")
    })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::auth("User not found"))?;

    Ok(Json(issue_tokens(&keys, user)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::jwt::TokenKind, error::testing::db_error};
    use sqlx::error::ErrorKind;
    use uuid::Uuid;

    #[tokio::test]
    async fn issued_pair_has_one_token_of_each_kind() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user = User {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            password_hash: String::new(),
            full_name: "Ana".into(),
            gender: None,
            age: None,
            weight: None,
            height: None,
            activity_level: "moderate".into(),
            goal: "maintain".into(),
            dietary_preferences: None,
            created_at: time::OffsetDateTime::now_utc(),
        };
        let id = user.id;

        let out = issue_tokens(&keys, user).unwrap();
        assert_eq!(out.token_type, "bearer");
        assert_eq!(out.user.id, id);
        assert_eq!(keys.verify(&out.access_token).unwrap().kind, TokenKind::Access);
        assert_eq!(keys.verify_refresh(&out.refresh_token).unwrap().sub, id);
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        let err = registration_error(db_error(ErrorKind::UniqueViolation));
        assert!(matches!(&err, AppError::Conflict(msg) if msg == "Email already registered"));
        assert_eq!(err.status(), StatusCode::CONFLICT);

        assert!(matches!(
            registration_error(sqlx::Error::PoolTimedOut),
            AppError::Connectivity(_)
        ));
    }
}
