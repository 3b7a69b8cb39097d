use anyhow::{Context, Result};
use clap::Parser;
use skycast_core::ProviderId;
use skycast_proxy::{AppState, Args, ProxyConfig, app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let args = Args::parse();
    let address = args.address;
    let config = ProxyConfig::from(args);

    for provider in ProviderId::all() {
        if config.api_key(*provider).is_err() {
            tracing::warn!(
                %provider,
                "{} is not set; its routes will answer 500",
                provider.env_var()
            );
        }
    }

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    tracing::info!("skycast proxy listening on http://{address}");

    axum::serve(listener, app(AppState::new(config)?))
        .await
        .context("Proxy server stopped unexpectedly")?;

    Ok(())
}
