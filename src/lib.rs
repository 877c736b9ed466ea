pub mod api;
pub mod certificates;
pub mod config;
pub mod enrollment;
pub mod error;
pub mod ids;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod progress;
pub mod server;
pub mod state;
pub mod store;
pub mod validation;

pub use config::{CliArgs, ServerConfig};
pub use error::{CoreError, CoreResult, Resource, StoreError};
pub use logging::{LoggingConfig, init_logging};
pub use state::AppState;

use anyhow::Result;
use std::{future::IntoFuture, sync::Arc, time::Duration};
use tokio::net::TcpListener;

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let config = Arc::new(config);
    config.validate()?;

    let state = Arc::new(AppState::new(config.clone())?);

    tracing::info!(
        bind = %config.http_bind_address,
        certificate_base_url = %config.certificate_base_url,
        "starting lms server",
    );

    let router = server::router(state);
    let listener = TcpListener::bind(config.http_bind_address).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(bind = %actual_addr, "listening");

    let grace = Duration::from_secs(config.graceful_shutdown_timeout_secs);
    let server_future = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();
    tokio::pin!(server_future);

    tokio::select! {
        result = &mut server_future => {
            result?;
            tracing::info!("server stopped");
        }
        _ = drain_deadline(grace) => {
            tracing::warn!(grace_secs = grace.as_secs(), "graceful shutdown timed out, aborting");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("ctrl-c handler installed");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("sigterm handler installed")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining requests");
}

async fn drain_deadline(grace: Duration) {
    shutdown_signal().await;
    tokio::time::sleep(grace).await;
}
