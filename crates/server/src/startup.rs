use std::net::SocketAddr;

use axum::Router;
use configs::AppConfig;
use migration::{Migrator, MigratorTrait};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl_c");
    }
    info!("shutdown signal received");
}

/// Connect, migrate, and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    Migrator::up(&db, None).await?;
    info!("database migrations applied");

    let state = ServerState::new(db, &cfg);
    if state.payments.lemonsqueezy_webhook_secret.is_none() {
        info!("lemonsqueezy webhook disabled (no secret)");
    }
    if state.payments.fastspring_webhook_secret.is_none() {
        info!("fastspring webhook disabled (no secret)");
    }

    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting marketplace api");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}
