//! paygate HTTP Server
//!
//! Axum-based server exposing the gateway's two entry points over
//! HTTP, wired to an in-memory commerce host. Real deployments
//! implement `CommerceHost` over the platform's own order storage and
//! embed the library directly.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use rust_decimal_macros::dec;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paygate::{
    CheckoutGateway, Credentials, GatewaySettings, MemoryCommerceHost, RemoteClient,
    TransactionService,
};

use crate::handlers::{create_checkout, gateway_callback, health_check, list_currencies};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let settings = GatewaySettings::from_env()?;
    tracing::info!("✓ Gateway credentials configured");
    tracing::info!("  Processor: {}", settings.base_url);
    tracing::info!("  Currencies: {}", settings.enabled_currencies.join(", "));

    let remote = RemoteClient::with_base_url(
        Credentials {
            integration_key: settings.integration_key.clone(),
            encryption_key: settings.encryption_key.clone(),
        },
        settings.base_url.clone(),
    )?;
    let service = TransactionService::new(remote);

    // In-memory host with a demo order to exercise the flow.
    let public_url =
        std::env::var("PUBLIC_URL").unwrap_or_else(|_| "http://localhost:3000".into());
    let host = Arc::new(MemoryCommerceHost::new(public_url));
    host.insert_order(42, dec!(10.00), "USD");

    let state = AppState {
        gateway: Arc::new(CheckoutGateway::new(service, host.clone(), settings)),
        host,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/currencies", get(list_currencies))
        .route("/api/checkout", post(create_checkout))
        .route("/callback", get(gateway_callback))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 paygate server running on http://{}", addr);
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health          - Health check");
    tracing::info!("  GET  /api/currencies  - Active processor currencies");
    tracing::info!("  POST /api/checkout    - Initiate a hosted transaction");
    tracing::info!("  GET  /callback        - Processor callback (redirects)");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
