//! Provider pass-through routes under `/movies`.
use super::{bad_path, bad_query};
use crate::app::AppState;
use crate::details::{fetch_movie_details, MovieDetails};
use crate::error::ApiError;
use crate::tmdb::{MovieId, MoviePage};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search))
        .route("/popular", get(popular))
        .route("/trending/week", get(trending_week))
        .route("/:id", get(details))
        .route("/:id/recommendations", get(recommendations))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

fn page_number(page: Option<u32>) -> Result<u32, ApiError> {
    match page {
        None => Ok(1),
        Some(0) => Err(ApiError::InvalidInput("page must be at least 1".to_string())),
        Some(p) => Ok(p),
    }
}

async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<MoviePage>, ApiError> {
    let Query(params) = params.map_err(bad_query)?;
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("query is required".to_string()))?;
    let page = page_number(params.page)?;
    let results = state
        .tmdb
        .search(query, page)
        .await
        .map_err(ApiError::upstream("Error searching movies"))?;
    Ok(Json(results))
}

async fn popular(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<MoviePage>, ApiError> {
    let Query(params) = params.map_err(bad_query)?;
    let page = page_number(params.page)?;
    let results = state
        .tmdb
        .popular(page)
        .await
        .map_err(ApiError::upstream("Error fetching popular movies"))?;
    Ok(Json(results))
}

async fn trending_week(State(state): State<AppState>) -> Result<Json<MoviePage>, ApiError> {
    let results = state
        .tmdb
        .trending_week()
        .await
        .map_err(ApiError::upstream("Error fetching trending movies"))?;
    Ok(Json(results))
}

async fn details(
    State(state): State<AppState>,
    id: Result<Path<MovieId>, PathRejection>,
) -> Result<Json<MovieDetails>, ApiError> {
    let Path(id) = id.map_err(bad_path)?;
    let details = fetch_movie_details(state.tmdb.as_ref(), id)
        .await
        .map_err(ApiError::upstream("Error fetching movie details"))?;
    Ok(Json(details))
}

async fn recommendations(
    State(state): State<AppState>,
    id: Result<Path<MovieId>, PathRejection>,
) -> Result<Json<MoviePage>, ApiError> {
    let Path(id) = id.map_err(bad_path)?;
    let results = state
        .tmdb
        .recommendations(id)
        .await
        .map_err(ApiError::upstream("Error fetching recommendations"))?;
    Ok(Json(results))
}
