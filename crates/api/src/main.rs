//! hostconf API server

use anyhow::Context;
use hostconf_api::{routes::create_router, AppState, Config};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let state = AppState::new(config).context("Failed to build host resolver")?;

    tracing::info!(
        main_domain = %state.resolver.main_domain(),
        virtualhost_resolver = %state.config.virtualhost_resolver,
        force_vary_on_host = state.resolver.force_vary_on_host(),
        "hostconf-api starting"
    );

    let bind_address = state.config.bind_address.clone();
    let app = create_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    tracing::info!(address = %bind_address, "Listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
