use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    error::{ApiError, ApiResult},
    profiles::{
        dto::{DeletedResponse, ProfileRequest},
        repo::{self, Profile},
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_profiles).post(create_profile))
        .route("/:id", put(update_profile).delete(delete_profile))
}

fn validated_name(payload: ProfileRequest) -> ApiResult<String> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }
    Ok(name)
}

#[instrument(skip(state))]
pub async fn list_profiles(State(state): State<AppState>) -> ApiResult<Json<Vec<Profile>>> {
    let profiles = repo::list_all(&state.db).await?;
    Ok(Json(profiles))
}

#[instrument(skip(state, payload))]
pub async fn create_profile(
    State(state): State<AppState>,
    Json(payload): Json<ProfileRequest>,
) -> ApiResult<(StatusCode, Json<Profile>)> {
    let name = validated_name(payload)?;
    let profile = repo::create(&state.db, &name).await?;
    info!(profile_id = profile.id, "profile created");
    Ok((StatusCode::CREATED, Json(profile)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProfileRequest>,
) -> ApiResult<Json<Profile>> {
    let name = validated_name(payload)?;
    let profile = repo::update_name(&state.db, id, &name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("ID {}: does not exist", id)))?;
    info!(profile_id = id, "profile updated");
    Ok(Json(profile))
}

#[instrument(skip(state))]
pub async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = repo::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("ID {}: does not exist", id)));
    }
    info!(profile_id = id, "profile deleted");
    Ok(Json(DeletedResponse {
        message: format!("profile {} deleted successfully", id),
    }))
}
