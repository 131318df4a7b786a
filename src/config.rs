use anyhow::{Context, Result};
use std::{env, net::SocketAddr, time::Duration};

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_SESSION_TTL_HOURS: i64 = 168;
/// One year. Keeps `now + ttl` far inside the `i64` timestamp range.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Runtime settings, read once at startup from the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    /// `None` waits until the transport gives up.
    pub tmdb_timeout: Option<Duration>,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let tmdb_api_key = required("TMDB_API_KEY")?;
        let session_secret = required("SESSION_SECRET")?;

        let tmdb_base_url = optional("TMDB_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_TMDB_BASE.to_string());

        let bind_addr = optional("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:5000")?;

        let tmdb_timeout = optional("TMDB_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("TMDB_TIMEOUT_SECS must be a whole number of seconds")?
            .map(Duration::from_secs);

        let session_ttl_hours = session_ttl_hours(optional("SESSION_TTL_HOURS"))?;

        let bcrypt_cost = optional("BCRYPT_COST")
            .map(|v| v.parse::<u32>())
            .transpose()
            .context("BCRYPT_COST must be a number")?
            .unwrap_or(bcrypt::DEFAULT_COST);

        Ok(Self {
            bind_addr,
            tmdb_api_key,
            tmdb_base_url,
            tmdb_timeout,
            session_secret,
            session_ttl_hours,
            bcrypt_cost,
        })
    }
}

fn session_ttl_hours(raw: Option<String>) -> Result<i64> {
    let hours = raw
        .map(|v| v.trim().parse::<i64>())
        .transpose()
        .context("SESSION_TTL_HOURS must be a whole number of hours")?
        .unwrap_or(DEFAULT_SESSION_TTL_HOURS);
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        anyhow::bail!(
            "SESSION_TTL_HOURS must be between 1 and {}",
            MAX_SESSION_TTL_HOURS
        );
    }
    Ok(hours)
}

fn required(key: &str) -> Result<String> {
    optional(key).ok_or_else(|| anyhow::anyhow!("Missing required environment variable: {}", key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}
