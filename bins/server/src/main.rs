//! Paysettle API Server
//!
//! Main entry point for the settlement backend service.

mod gateway;

use std::sync::Arc;

use paysettle_api::{AppState, create_router};
use paysettle_core::SettlementService;
use paysettle_core::gateway::GatewayRegistry;
use paysettle_db::{ExchangeRateRepository, connect};
use paysettle_shared::AppConfig;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::gateway::HttpGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "paysettle=debug,tower_http=debug".into());
    if config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    let mut gateways = GatewayRegistry::new();
    for (handler, gateway_config) in &config.gateways {
        let gateway = HttpGateway::new(gateway_config)?;
        info!(%handler, base_url = %gateway_config.base_url, "Gateway registered");
        gateways = gateways.with(handler.clone(), Arc::new(gateway));
    }

    let service = SettlementService::new(
        paysettle_db::stores(&db),
        gateways,
        Arc::new(ExchangeRateRepository::new(db.clone())),
        &config.rates,
        &config.refund,
    );

    let app = create_router(AppState::new(service, &config.api.internal_key));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
