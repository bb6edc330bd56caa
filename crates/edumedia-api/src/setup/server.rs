//! HTTP listener for the media API.

use anyhow::Result;
use axum::Router;
use edumedia_core::Config;

/// Bind the configured port and serve `app` until SIGINT or SIGTERM.
///
/// In-flight uploads are allowed to finish before the listener closes.
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server.server_port);
    tracing::info!(addr = %addr, "Binding media API listener");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        backend = %config.storage_backend,
        max_upload_mb = config.server.max_upload_size_bytes / 1024 / 1024,
        max_retries = config.upload.max_retries,
        retry_delay_secs = config.upload.retry_delay.as_secs(),
        "Media API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on the first of SIGINT or SIGTERM, then flushes logs.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    tracing::info!(signal, "Stopping media API, draining in-flight requests");
    edumedia_infra::shutdown_telemetry().await;
}
