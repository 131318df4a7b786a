//! Authenticated list routes under `/users`. Every handler runs behind
//! [`require_session`](crate::session::require_session).
use super::{bad_json, bad_path};
use crate::app::AppState;
use crate::error::ApiError;
use crate::session::AuthUser;
use crate::tmdb::MovieId;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{delete, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", post(add_favorite))
        .route("/favorites/:movie_id", delete(remove_favorite))
        .route("/watchlist", post(add_watchlist))
        .route("/watchlist/:movie_id", delete(remove_watchlist))
        .route("/rate", post(rate))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRef {
    pub movie_id: MovieId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub movie_id: MovieId,
    pub rating: i64,
}


async fn add_favorite(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    body: Result<Json<MovieRef>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(MovieRef { movie_id }) = body.map_err(bad_json)?;
    let favorites = state.users.add_favorite(user, movie_id).await?;
    info!(user, movie_id, "Added favorite");
    Ok(Json(json!({
        "message": "Movie added to favorites",
        "favorites": favorites
    })))
}

async fn remove_favorite(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    movie_id: Result<Path<MovieId>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(movie_id) = movie_id.map_err(bad_path)?;
    let favorites = state.users.remove_favorite(user, movie_id).await?;
    info!(user, movie_id, "Removed favorite");
    Ok(Json(json!({
        "message": "Movie removed from favorites",
        "favorites": favorites
    })))
}

async fn add_watchlist(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    body: Result<Json<MovieRef>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(MovieRef { movie_id }) = body.map_err(bad_json)?;
    let watchlist = state.users.add_watchlist(user, movie_id).await?;
    info!(user, movie_id, "Added to watchlist");
    Ok(Json(json!({
        "message": "Movie added to watchlist",
        "watchlists": watchlist
    })))
}

async fn remove_watchlist(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    movie_id: Result<Path<MovieId>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(movie_id) = movie_id.map_err(bad_path)?;
    let watchlist = state.users.remove_watchlist(user, movie_id).await?;
    info!(user, movie_id, "Removed from watchlist");
    Ok(Json(json!({
        "message": "Movie removed from watchlist",
        "watchlists": watchlist
    })))
}

async fn rate(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    body: Result<Json<RateRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(RateRequest { movie_id, rating }) = body.map_err(bad_json)?;
    let ratings = state.users.rate(user, movie_id, rating).await?;
    info!(user, movie_id, rating, "Rated movie");
    Ok(Json(json!({
        "message": "Movie rated successfully",
        "ratings": ratings
    })))
}
