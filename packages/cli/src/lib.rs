// ABOUTME: Server bootstrap for the Bookshare binary
// ABOUTME: Logging setup, database startup, admin seeding and the HTTP listener

use std::net::SocketAddr;

use anyhow::Context;
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use bookshare_api::{create_router, DbState};
use bookshare_security::{SessionStorage, UserStorage};
use bookshare_storage::db::init_pool;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub mod config;

pub use config::{AdminSeed, Config, ConfigError};

const DEFAULT_LOG_FILTER: &str = "info,sqlx=warn";

/// Install the global subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();
}

/// Open the database and apply migrations
pub async fn open_database(config: &Config) -> anyhow::Result<SqlitePool> {
    init_pool(&config.db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))
}

/// Housekeeping before serving: seed the first admin and drop dead sessions
pub async fn prepare_database(pool: &SqlitePool, config: &Config) -> anyhow::Result<()> {
    let users = UserStorage::new(pool.clone());
    match &config.admin_seed {
        Some(seed) => {
            users
                .ensure_admin(&seed.student_id, &seed.name, &seed.password)
                .await
                .context("Failed to seed admin account")?;
        }
        None => {
            if users.count_admins().await? == 0 {
                warn!("No admin account exists; set BOOKSHARE_ADMIN_PASSWORD to create one");
            }
        }
    }

    let purged = SessionStorage::new(pool.clone(), config.session_ttl())
        .purge_expired()
        .await?;
    if purged > 0 {
        info!("Removed {} expired session(s)", purged);
    }

    Ok(())
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let pool = open_database(&config).await?;
    prepare_database(&pool, &config).await?;

    // Cookies need credentials, which rules out wildcard headers
    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", config.cors_origin))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true);

    let state = DbState::new(pool, config.session_ttl());
    let app = create_router(state).layer(cors);

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Bookshare listening on http://{}", addr);
    info!("Database: {}", config.db_path.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshare_storage::db::memory_pool;
    use std::path::PathBuf;

    fn config_with_seed(seed: Option<AdminSeed>) -> Config {
        Config {
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            cors_origin: "http://localhost:5173".to_string(),
            db_path: PathBuf::from(":memory:"),
            session_ttl_hours: 1,
            admin_seed: seed,
        }
    }

    #[tokio::test]
    async fn test_prepare_seeds_admin_once() {
        let pool = memory_pool().await.unwrap();
        let seed = AdminSeed {
            student_id: "root".to_string(),
            name: "Root".to_string(),
            password: "s3cret".to_string(),
        };
        let config = config_with_seed(Some(seed));

        prepare_database(&pool, &config).await.unwrap();
        prepare_database(&pool, &config).await.unwrap();

        let users = UserStorage::new(pool);
        assert_eq!(users.count_admins().await.unwrap(), 1);
        let admin = users.authenticate("root", "s3cret").await.unwrap();
        assert!(admin.is_admin);
    }

    #[tokio::test]
    async fn test_prepare_without_seed_creates_nothing() {
        let pool = memory_pool().await.unwrap();
        prepare_database(&pool, &config_with_seed(None)).await.unwrap();

        let users = UserStorage::new(pool);
        assert_eq!(users.count_admins().await.unwrap(), 0);
    }
}
