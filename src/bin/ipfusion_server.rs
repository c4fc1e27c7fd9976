//! IPFusion Server - IP intelligence aggregation endpoint
//!
//! Usage:
//!   cargo run --release --bin ipfusion_server
//!
//! Environment variables:
//!   IPFUSION_BIND_ADDR - Listen address (default: 0.0.0.0:8787)
//!   IPFUSION_FETCH_TIMEOUT_MS - Per-source deadline (default: 5000)
//!   IPFUSION_MAX_CONCURRENT - In-flight fetches per request (default: 3)
//!   IPFUSION_RATE_LIMIT / IPFUSION_RATE_WINDOW_MS - Admission policy (default: 20 per 60000ms)
//!   IPFUSION_CLIENT_IP_HEADER - Trusted client address header (default: CF-Connecting-IP)

use dotenv::dotenv;
use ipfusion::config::ServerConfig;
use ipfusion::fetcher::HttpFetcher;
use ipfusion::server::{router, AppState};
use ipfusion::sources::SourceId;
use log::{error, info};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    // NOTE: Workaround for rustls issue
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        error!("❌ A rustls crypto provider was already installed");
    }

    let config = ServerConfig::from_env()?;

    info!("🚀 IPFusion Server");
    info!("   ├─ Version: {}", env!("CARGO_PKG_VERSION"));
    info!("   ├─ Bind: {}", config.bind_addr);
    info!("   ├─ Sources: {}", SourceId::ALL.len());
    info!("   ├─ Fetch timeout: {}ms", config.fetch_timeout_ms);

    let fetcher = Arc::new(HttpFetcher::new()?);
    let state = AppState::new(&config, fetcher);

    info!("   ├─ Max concurrent: {}", state.aggregator.max_concurrent());
    info!(
        "   ├─ Rate limit: {} per {}ms",
        state.limiter.limit(),
        state.limiter.window().as_millis()
    );
    info!("   └─ Client header: {}", state.client_ip_header);

    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr.as_str()).await?;
    info!("✅ Listening on {}", listener.local_addr()?);
    info!("🔄 Press CTRL+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("✅ IPFusion server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("⚠️  Received CTRL+C, shutting down..."),
        Err(err) => error!("❌ Failed to listen for CTRL+C: {}", err),
    }
}
