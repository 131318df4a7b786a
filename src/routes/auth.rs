//! Registration, login and the current-user lookup. Register and login answer
//! with a bearer token for the authenticated routes; `/me` needs one.
use super::bad_json;
use crate::app::AppState;
use crate::error::ApiError;
use crate::session::AuthUser;
use crate::users::UserProfile;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Public routes; [`me`] is mounted separately behind the session layer.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserProfile,
}

async fn register(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let Json(req) = body.map_err(bad_json)?;
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidInput(
            "email and password are required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(ApiError::InvalidInput("email is not valid".to_string()));
    }

    let cost = state.bcrypt_cost;
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
        .map_err(|e| ApiError::Internal(e.into()))?;

    let user = state.users.create_user(email, password_hash).await?;
    let token = state
        .sessions
        .issue(user.id, state.users.epoch())
        .map_err(|e| ApiError::Internal(e.into()))?;
    info!(user = user.id, "Registered user '{}'", user.email);
    Ok((StatusCode::CREATED, Json(SessionResponse { token, user })))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(req) = body.map_err(bad_json)?;
    let invalid = || ApiError::Unauthorized("Invalid credentials");

    let Some(creds) = state.users.credentials(req.email.trim()).await else {
        warn!("Login for unknown email '{}'", req.email);
        return Err(invalid());
    };

    let password = req.password;
    let hash = creds.password_hash;
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
        .unwrap_or(false);
    if !valid {
        warn!(user = creds.id, "Login with wrong password");
        return Err(invalid());
    }

    let user = state.users.profile(creds.id).await?;
    let token = state
        .sessions
        .issue(user.id, state.users.epoch())
        .map_err(|e| ApiError::Internal(e.into()))?;
    info!(user = user.id, "User logged in");
    Ok(Json(SessionResponse { token, user }))
}

/// `GET /auth/me`: the signed-in user's profile, lists and ratings.
pub async fn me(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.users.profile(user).await?))
}
