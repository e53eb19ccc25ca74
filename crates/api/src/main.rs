use anyhow::Context;

use franchiseops_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    franchiseops_observability::init_with(&config.log_filter, config.log_format);

    let app = franchiseops_api::app::build_app(&config)
        .await
        .context("failed to open record store")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        mode = ?config.invariant_mode,
        "listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}
