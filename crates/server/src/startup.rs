use std::{env, net::SocketAddr, path::Path, sync::Arc};

use axum::Router;
use common::admin_http::spawn_admin_server;
use common::metrics;
use configs::AppConfig;
use migration::MigratorTrait;
use service::mail;
use service::{MemoryStore, SeaOrmStore};
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

/// `config.toml` (or `CONFIG_PATH`) when present, otherwise environment variables only.
pub fn load_config() -> Result<AppConfig, StartupError> {
    let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let loaded = if Path::new(&path).exists() {
        AppConfig::load_and_validate()
    } else {
        AppConfig::from_env()
    };
    loaded.map_err(|e| StartupError::InvalidConfig(e.to_string()))
}

/// Router over the store selected by `database.url`: `memory://` keeps
/// everything in process, anything else is Postgres through SeaORM.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let mailer = mail::from_config(&cfg.mail).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    if cfg.database.is_memory() {
        warn!("database.url is memory://; data is lost on exit");
        let state = AppState::new(Arc::new(MemoryStore::new()), cfg.auth.clone(), mailer);
        return Ok(routes::build_router(state));
    }

    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    if cfg.database.run_migrations {
        migration::Migrator::up(&db, None)
            .await
            .map_err(|e| StartupError::Database(e.to_string()))?;
        info!("migrations applied");
    }
    let state = AppState::new(Arc::new(SeaOrmStore::new(db)), cfg.auth.clone(), mailer);
    Ok(routes::build_router(state))
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    if let Some(addr) = &cfg.server.admin_addr {
        spawn_admin_server(addr, metrics::render);
    }

    let app = build_app(&cfg).await?;

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting server crate");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
