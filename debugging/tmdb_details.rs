//! Fetch the aggregated detail view for a movie and print it.
//! Usage:
//!   cargo run --bin tmdb_details -- <tmdb_id>
//! Requires TMDB_API_KEY in the environment (.env supported). SESSION_SECRET
//! is not needed here.

use anyhow::{Context, Result};
use cinelist::config::{Config, DEFAULT_TMDB_BASE};
use cinelist::details::fetch_movie_details;
use cinelist::tmdb::TmdbClient;
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<()> {
    match dotenv() {
        Ok(path) => eprintln!("Loaded environment from {}", path.display()),
        Err(e) => eprintln!("No .env loaded ({}), using process environment", e),
    }
    let id: i32 = env::args()
        .nth(1)
        .context("usage: tmdb_details <tmdb_id>")?
        .parse()
        .context("tmdb_id must be a number")?;

    let config = Config {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        tmdb_api_key: env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?,
        tmdb_base_url: env::var("TMDB_BASE_URL").unwrap_or_else(|_| DEFAULT_TMDB_BASE.to_string()),
        tmdb_timeout: Some(std::time::Duration::from_secs(20)),
        session_secret: String::new(),
        session_ttl_hours: 1,
        bcrypt_cost: bcrypt::DEFAULT_COST,
    };
    let client = TmdbClient::new(&config)?;
    let details = fetch_movie_details(&client, id).await?;

    println!(
        "{} ({})",
        details.detail.title().unwrap_or("untitled"),
        details.detail.release_date().unwrap_or("?")
    );
    println!(
        "cast: {}, crew: {}, videos: {}",
        details.credits.cast.len(),
        details.credits.crew.len(),
        details.videos.results.len()
    );
    if let Some(trailer) = details.videos.trailer() {
        println!("trailer: https://www.youtube.com/watch?v={}", trailer.key);
    }
    println!("{}", serde_json::to_string_pretty(&details)?);
    Ok(())
}
