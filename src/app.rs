use crate::config::Config;
use crate::routes;
use crate::session::{self, SessionKeys};
use crate::tmdb::{TmdbApi, TmdbClient};
use crate::users::{InMemoryUserStore, UserStore};
use anyhow::Result;
use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

const MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB safety cap

#[derive(Clone)]
pub struct AppState {
    pub tmdb: Arc<dyn TmdbApi>,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<SessionKeys>,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::new(config)?);
        match config.tmdb_timeout {
            Some(t) => info!("TMDB requests time out after {:?}", t),
            None => info!("TMDB requests have no client-side timeout"),
        }
        Ok(Self {
            tmdb,
            users: Arc::new(InMemoryUserStore::new()),
            sessions: Arc::new(SessionKeys::new(
                &config.session_secret,
                config.session_ttl_hours,
            )),
            bcrypt_cost: config.bcrypt_cost,
        })
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let require_session = middleware::from_fn_with_state(state.clone(), session::require_session);
    let auth = routes::auth::routes().route(
        "/me",
        get(routes::auth::me).route_layer(require_session.clone()),
    );
    let users = routes::users::routes().route_layer(require_session);

    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth)
        .nest("/movies", routes::movies::routes())
        .nest("/users", users)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
