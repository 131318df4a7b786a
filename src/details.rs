//! Aggregated movie detail view: core detail, cast/crew and videos for one title.
use crate::tmdb::{Credits, MovieDetail, MovieId, TmdbApi, Videos};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Core detail fields at the top level with `credits` and `videos` embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub detail: MovieDetail,
    pub credits: Credits,
    pub videos: Videos,
}

/// Issues the three provider calls concurrently. The first failure cancels
/// the remaining calls and fails the whole aggregate.
pub async fn fetch_movie_details(tmdb: &dyn TmdbApi, id: MovieId) -> Result<MovieDetails> {
    let (detail, credits, videos) =
        tokio::try_join!(tmdb.movie(id), tmdb.credits(id), tmdb.videos(id))?;
    Ok(MovieDetails {
        detail,
        credits,
        videos,
    })
}
