use anyhow::Context;
use retail_api::{app, AppState};
use retail_store::{app_config::Config, Repositories};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retail_api=debug,retail_order=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(
        "Starting retail API on port {} (cooldown {}s)",
        config.server.port,
        config.orders.cooldown_seconds
    );

    let repos = Repositories::connect(&config.database)
        .await
        .context("Failed to initialise storage")?;
    let app_state = AppState::new(repos, &config.orders);

    let app = app(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
