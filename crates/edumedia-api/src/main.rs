use edumedia_core::validate_env;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = validate_env()?;

    edumedia_infra::init_telemetry(env!("CARGO_PKG_NAME"), &config.server.environment)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;
    tracing::info!(backend = %config.storage_backend, "Configuration loaded and validated");

    let (_state, router) = edumedia_api::setup::initialize_app(&config).await?;

    edumedia_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
