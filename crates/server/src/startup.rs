use std::net::SocketAddr;

use axum::Router;
use configs::{AppConfig, ServerConfig};
use tower_http::cors::CorsLayer;
use tracing::info;

use service::{Backends, Services};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(server: &ServerConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address {}:{}: {e}", server.host, server.port)))
}

/// Open the configured storage backend and wire the services on top of it.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let backends = Backends::from_config(cfg).await?;
    info!(backend = ?backends.kind, "storage backend ready");
    Ok(ServerState { services: Services::new(backends, cfg) })
}

/// Router with CORS and request tracing applied.
pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        return;
    }
    info!("shutdown signal received");
}

/// Public entry: build the app from a loaded configuration and serve it
/// until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app = build_app(state);

    // Bind and serve
    let addr = bind_addr(&cfg.server)?;
    info!(%addr, "starting umkm registry server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_rejects_bad_host() {
        let bad = ServerConfig { host: "not a host".into(), port: 8080, worker_threads: None };
        assert!(matches!(bind_addr(&bad), Err(StartupError::InvalidConfig(_))));
        let ok = ServerConfig::default();
        assert_eq!(bind_addr(&ok).map(|a| a.port()).ok(), Some(8080));
    }
}
