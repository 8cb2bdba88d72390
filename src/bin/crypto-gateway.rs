use crypto_price_tracker::{
    config::GatewayConfig, constants::DEFAULT_BIND_ADDR, providers::CoinGeckoSource, server,
    FetchGateway,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind_address: SocketAddr = std::env::var("CRYPTO_TRACKER_BIND")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()?;

    let config = GatewayConfig::default();
    let source = CoinGeckoSource::with_base_url(config.upstream_url.as_str())?;
    let gateway = Arc::new(FetchGateway::with_config(Arc::new(source), config));

    server::serve(gateway, bind_address).await;
    Ok(())
}
