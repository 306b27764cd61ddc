//! Item Service Binary
//!
//! Starts the item and user HTTP service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin item-service
//! ```
//!
//! # Environment Variables
//!
//! - `PORT`: HTTP port (default: 3000)
//! - `BIND_ADDRESS`: Bind address (default: 0.0.0.0)
//! - `STORAGE_BACKEND`: memory | sqlite | document (default: memory)
//! - `SQLITE_PATH`: SQLite database file (default: ./data/items.db)
//! - `DOCUMENT_PATH`: Document store directory (default: ./data/documents)
//! - `METRICS_ENABLED`: Install the Prometheus recorder (default: true)
//! - `RUST_LOG`: Log filter (default: item_service=info)

use anyhow::Context;
use item_service::infrastructure::telemetry;
use item_service::{AppState, ServiceConfig, create_router, init_metrics, open_storage};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    telemetry::init();

    tracing::info!("Starting Item Service");

    let config = ServiceConfig::from_env()?;
    log_config(&config);

    if config.metrics_enabled
        && let Err(e) = init_metrics()
    {
        tracing::warn!(error = %e, "Prometheus recorder not installed");
    }

    let storage = open_storage(&config.storage).context("failed to open storage backend")?;
    let state = AppState::new(storage, env!("CARGO_PKG_VERSION"));
    let app = create_router(state);

    let addr = config.server.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(addr = %addr, "HTTP server listening");
    log_endpoints(&addr);

    let shutdown_token = CancellationToken::new();
    tokio::spawn(await_shutdown(shutdown_token.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_token.cancelled_owned())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Item Service stopped");
    Ok(())
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &ServiceConfig) {
    tracing::info!(
        bind_address = %config.server.bind_address,
        port = config.server.port,
        backend = config.storage.backend.as_str(),
        metrics_enabled = config.metrics_enabled,
        "Configuration loaded"
    );
    tracing::debug!(
        sqlite_path = %config.storage.sqlite_path.display(),
        document_path = %config.storage.document_path.display(),
        "Storage paths"
    );
}

fn log_endpoints(addr: &str) {
    tracing::info!("Endpoints:");
    tracing::info!("  GET    http://{addr}/");
    tracing::info!("  POST   http://{addr}/register");
    tracing::info!("  POST   http://{addr}/login");
    tracing::info!("  GET    http://{addr}/items");
    tracing::info!("  POST   http://{addr}/items");
    tracing::info!("  GET    http://{addr}/items/{{id}}");
    tracing::info!("  PUT    http://{addr}/items/{{id}}");
    tracing::info!("  DELETE http://{addr}/items/{{id}}");
    tracing::info!("  GET    http://{addr}/health");
    tracing::info!("  GET    http://{addr}/metrics");
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
