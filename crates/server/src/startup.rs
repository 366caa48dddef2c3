use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, ServerConfig};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};
use service::auth::repo::seaorm::SeaOrmUserRepository;
use service::auth::{BcryptHasher, InMemoryUserRepository, TokenConfig, TokenService, UserRepository};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(server: &ServerConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Composition root: every shared component is built once here.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<ServerState> {
    let repo: Arc<dyn UserRepository> = if cfg.database.is_configured() {
        let db = models::db::connect_and_migrate(&cfg.database).await?;
        Arc::new(SeaOrmUserRepository::new(db))
    } else {
        warn!(event = "in_memory_store", "database.url is not set; users are kept in memory and lost on restart");
        Arc::new(InMemoryUserRepository::new())
    };

    let tokens = Arc::new(TokenService::new(&TokenConfig {
        secret: cfg.auth.secret().to_string(),
        access_ttl: cfg.auth.access_ttl()?,
        refresh_ttl: cfg.auth.refresh_ttl()?,
    }));
    let hasher = Arc::new(BcryptHasher::new(cfg.auth.bcrypt_cost));

    Ok(ServerState::new(repo, hasher, tokens, cfg.server.secure_cookies))
}

/// Build the app from validated configuration and serve until the listener fails.
pub async fn run(mut cfg: AppConfig) -> anyhow::Result<()> {
    cfg.normalize_and_validate()
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    if cfg.is_development() {
        warn!(event = "development_mode", "running with development defaults");
    }

    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg.server)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr: addr.to_string(), source })?;
    info!(%addr, environment = %cfg.environment, "starting server");
    axum::serve(listener, app).await?;
    Ok(())
}
