use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, PublicUser, RegisterRequest, TokenResponse},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::User,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/", post(register))
        .route("/auth/token", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e.as_database_error().map(|d| d.kind()),
        Some(sqlx::error::ErrorKind::UniqueViolation)
    )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    let username = payload.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::Validation("username must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::Validation("password must not be empty".into()));
    }

    let hash = hash_password(&payload.password)?;

    let user = match User::create(&state.db, &username, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(%username, "username already registered");
            return Err(ApiError::Conflict(format!(
                "username '{}' is already registered",
                username
            )));
        }
        Err(e) => return Err(ApiError::Database(e)),
    };

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(PublicUser {
            id: user.id,
            username: user.username,
        }),
    ))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<TokenResponse>> {
    // Unknown username and wrong password take the same exit so the
    // response cannot be used for enumeration.
    let user = match User::find_by_username(&state.db, &form.username).await? {
        Some(u) => u,
        None => {
            warn!(username = %form.username, "login with unknown username");
            return Err(ApiError::Unauthorized);
        }
    };

    if !verify_password(&form.password, &user.password_hash) {
        warn!(user_id = user.id, "login with invalid password");
        return Err(ApiError::Unauthorized);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id, &user.username)?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}

#[instrument(skip(state, claims))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(PublicUser {
        id: user.id,
        username: user.username,
    }))
}
