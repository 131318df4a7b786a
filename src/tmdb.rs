use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Provider-assigned title id.
pub type MovieId = i32;

/// Calls against the movie metadata provider. Every failure (transport,
/// non-success status, undecodable body) is a single opaque error.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn search(&self, query: &str, page: u32) -> Result<MoviePage>;
    async fn popular(&self, page: u32) -> Result<MoviePage>;
    async fn trending_week(&self) -> Result<MoviePage>;
    async fn movie(&self, id: MovieId) -> Result<MovieDetail>;
    async fn credits(&self, id: MovieId) -> Result<Credits>;
    async fn videos(&self, id: MovieId) -> Result<Videos>;
    async fn recommendations(&self, id: MovieId) -> Result<MoviePage>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.tmdb_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build().context("building HTTP client")?,
            api_key: config.tmdb_api_key.clone(),
            base_url: config.tmdb_base_url.clone(),
        })
    }

    /// `path` starts with `/` and may already carry query parameters. Errors
    /// name the path only, so the API key never reaches the logs.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let sep = if path.contains('?') { '&' } else { '?' };
        let url = format!("{}{path}{sep}api_key={}", self.base_url, self.api_key);
        debug!("TMDB GET {}", path);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("request to {} failed", path))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| e.without_url())
            .context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {}: {}", path, status, text));
        }
        let parsed: T = serde_json::from_str(&text)
            .with_context(|| format!("JSON parse failed for {}", path))?;
        Ok(parsed)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn search(&self, query: &str, page: u32) -> Result<MoviePage> {
        let path = format!(
            "/search/movie?query={}&page={page}",
            urlencoding::encode(query)
        );
        self.get_json(&path).await
    }

    async fn popular(&self, page: u32) -> Result<MoviePage> {
        self.get_json(&format!("/movie/popular?page={page}")).await
    }

    async fn trending_week(&self) -> Result<MoviePage> {
        self.get_json("/trending/movie/week").await
    }

    async fn movie(&self, id: MovieId) -> Result<MovieDetail> {
        self.get_json(&format!("/movie/{id}")).await
    }

    async fn credits(&self, id: MovieId) -> Result<Credits> {
        self.get_json(&format!("/movie/{id}/credits")).await
    }

    async fn videos(&self, id: MovieId) -> Result<Videos> {
        self.get_json(&format!("/movie/{id}/videos")).await
    }

    async fn recommendations(&self, id: MovieId) -> Result<MoviePage> {
        self.get_json(&format!("/movie/{id}/recommendations")).await
    }
}

// Provider payloads. Only the fields this server reads are named; every
// other field, including `null`s, rides along in `extra` untouched so
// responses pass through exactly as the provider sent them.

fn text<'a>(extra: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    extra.get(key).and_then(Value::as_str)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoviePage {
    pub results: Vec<MovieSummary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: MovieId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MovieSummary {
    pub fn title(&self) -> Option<&str> {
        text(&self.extra, "title")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: MovieId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MovieDetail {
    pub fn title(&self) -> Option<&str> {
        text(&self.extra, "title")
    }

    pub fn release_date(&self) -> Option<&str> {
        text(&self.extra, "release_date")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credits {
    pub cast: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastMember {
    pub id: i32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CastMember {
    pub fn name(&self) -> Option<&str> {
        text(&self.extra, "name")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: i32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CrewMember {
    pub fn job(&self) -> Option<&str> {
        text(&self.extra, "job")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Videos {
    pub results: Vec<Video>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Videos {
    /// First YouTube trailer, falling back to a teaser.
    pub fn trailer(&self) -> Option<&Video> {
        let youtube = |kind: &str| {
            self.results
                .iter()
                .find(|v| v.site.eq_ignore_ascii_case("YouTube") && v.video_type == kind)
        };
        youtube("Trailer").or_else(|| youtube("Teaser"))
    }
}
