use anyhow::Context;

use viewgate_api::config::GateConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    viewgate_observability::init();

    let config = GateConfig::from_env().context("invalid configuration")?;
    let app = viewgate_api::app::build_app(&config).context("failed to build authority client")?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!(
        resource = %config.resource_id,
        sharing = %config.sharing,
        "listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}
