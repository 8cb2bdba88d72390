//! Local HTTP endpoint in front of the fetch gateway
//!
//! `GET /api/cryptos` answers 200 with an `AssetEnvelope`, including when
//! the upstream fetch failed. `GET /api/health` reports the gateway health.

use crate::gateway::FetchGateway;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::{Filter, Reply};

const APPLICATION_NAME: &str = "crypto_gateway";

pub fn routes(
    gateway: Arc<FetchGateway>,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let api = warp::path("api");

    let cryptos = api
        .and(warp::path("cryptos"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_gateway(gateway.clone()))
        .and_then(handlers::cryptos);

    let health = api
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_gateway(gateway))
        .and_then(handlers::health);

    cryptos.or(health)
}

fn with_gateway(
    gateway: Arc<FetchGateway>,
) -> impl Filter<Extract = (Arc<FetchGateway>,), Error = Infallible> + Clone {
    warp::any().map(move || gateway.clone())
}

/// Serves the gateway until the process is stopped
pub async fn serve(gateway: Arc<FetchGateway>, bind_address: SocketAddr) {
    let routes = routes(gateway).with(warp::log(APPLICATION_NAME));

    tracing::info!(%bind_address, "Serving crypto gateway");
    warp::serve(routes).run(bind_address).await;
}

mod handlers {
    use crate::gateway::FetchGateway;
    use std::convert::Infallible;
    use std::sync::Arc;

    pub async fn cryptos(gateway: Arc<FetchGateway>) -> Result<impl warp::Reply, Infallible> {
        let envelope = gateway.fetch_assets().await;
        Ok(warp::reply::json(&envelope))
    }

    pub async fn health(gateway: Arc<FetchGateway>) -> Result<impl warp::Reply, Infallible> {
        Ok(warp::reply::json(&gateway.health_check().await))
    }
}
