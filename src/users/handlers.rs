use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{UpdateProfileRequest, UserOut},
    repo::{ProfileChanges, User},
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult},
    extract::{AppJson, AppPath},
    state::AppState,
    validation,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/users/:id", get(get_user).put(update_user))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<UserOut>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<UserOut>> {
    ensure_self(user_id, id)?;
    get_me(State(state), AuthUser(user_id)).await
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<UserOut>> {
    ensure_self(user_id, id)?;
    let changes = validate_profile(payload)?;

    let user = User::update_profile(&state.db, user_id, changes)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    info!(%user_id, "profile updated");
    Ok(Json(user.into()))
}

/// Profiles are private: another user's id looks exactly like a missing one.
fn ensure_self(caller: Uuid, requested: Uuid) -> AppResult<()> {
    if caller != requested {
        warn!(%caller, %requested, "profile access to foreign user");
        return Err(AppError::NotFound("user"));
    }
    Ok(())
}

fn validate_profile(p: UpdateProfileRequest) -> AppResult<ProfileChanges> {
    if let Some(name) = &p.full_name {
        validation::not_blank("full_name", name)?;
    }
    if let Some(age) = p.age {
        if age < 0 {
            return Err(AppError::validation("age must be a non-negative number"));
        }
    }
    if let Some(weight) = p.weight {
        validation::non_negative("weight", weight)?;
    }
    if let Some(height) = p.height {
        validation::non_negative("height", height)?;
    }
    let dietary_preferences = p
        .dietary_preferences
        .map(|prefs| validation::list_entries("dietary_preferences", prefs))
        .transpose()?;

    Ok(ProfileChanges {
        full_name: p.full_name.map(|s| s.trim().to_string()),
        gender: p.gender,
        age: p.age,
        weight: p.weight,
        height: p.height,
        activity_level: p.activity_level,
        goal: p.goal,
        dietary_preferences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_profile_is_not_found() {
        let me = Uuid::new_v4();
        assert!(ensure_self(me, me).is_ok());
        assert!(matches!(
            ensure_self(me, Uuid::new_v4()),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn profile_validation_normalizes_preferences() {
        let changes = validate_profile(UpdateProfileRequest {
            age: Some(31),
            weight: Some(70.5),
            dietary_preferences: Some(vec![" vegan".into(), "gluten free ".into()]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            changes.dietary_preferences,
            Some(vec!["vegan".to_string(), "gluten free".to_string()])
        );
        assert_eq!(changes.full_name, None);
    }

    #[test]
    fn profile_validation_rejects_bad_numbers() {
        let negative_weight = UpdateProfileRequest {
            weight: Some(-3.0),
            ..Default::default()
        };
        assert!(validate_profile(negative_weight).is_err());

        let negative_age = UpdateProfileRequest {
            age: Some(-1),
            ..Default::default()
        };
        assert!(validate_profile(negative_age).is_err());
    }

    #[test]
    fn user_out_exposes_preferences_as_list_and_hides_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            full_name: "Ana".into(),
            gender: None,
            age: None,
            weight: None,
            height: None,
            activity_level: "moderate".into(),
            goal: "maintain".into(),
            dietary_preferences: Some("vegan,halal".into()),
            created_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(UserOut::from(user)).unwrap();
        assert_eq!(json["dietary_preferences"], serde_json::json!(["vegan", "halal"]));
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }
}
