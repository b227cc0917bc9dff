//! Factory Dashboard Service (DashSrv)

use anyhow::Result;
use dashsrv::{api, AppState, DashConfig};
use pulse_store::{db, BroadcastNotifier, ChangeNotifier, PulseStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Factory Dashboard Service...");

    let config = DashConfig::load()?;

    let pool = db::connect(&config.database.path).await?;
    db::apply_schema(&pool).await?;

    let notifier: Arc<dyn ChangeNotifier> = if config.redis.enabled {
        let notifier = pulse_store::RedisNotifier::connect(&config.redis.url).await?;
        info!("Connected to Redis change feed at {}", config.redis.url);
        Arc::new(notifier)
    } else {
        info!("Using in-process change feed");
        Arc::new(BroadcastNotifier::new())
    };

    let store = PulseStore::new(pool, notifier);
    let state = AppState::new(store).await;
    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.service.host, config.service.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Dashboard Service started on {}", addr);
    info!("API endpoints:");
    info!("  GET /health - Health check");
    info!("  GET /api/v1/dashboard - Fleet overview");
    info!("  GET /api/v1/machines - Machine list and detail");
    info!("  GET /api/v1/downtime - Downtime tracking");
    info!("  GET /api/v1/alerts - Alert management");
    info!("  GET /api/v1/reports - Production reports");
    info!("  GET /api/v1/settings - Reference data");

    axum::serve(listener, app).await?;
    Ok(())
}
