mod config;
mod db;
mod dispatch;
mod errors;
mod handlers;
mod mapper;
mod models;
mod store;
mod sync;
mod webhook_handler;
mod webhook_models;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::dispatch::Dispatcher;
use crate::store::{PersonStore, PgPersonStore};
use crate::sync::SyncConnector;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - Database connection.
/// - The sync connector for the external user-profile API.
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_profile_sync=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connection pool
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Record store over the pool
    let store: Arc<dyn PersonStore> = Arc::new(PgPersonStore::new(db.pool.clone()));

    // Connector for the pull/push flows
    let connector = Arc::new(
        SyncConnector::new(
            config.profile_api_base_url.clone(),
            config.profile_api_token.clone(),
            store.clone(),
        )
        .map_err(|e| anyhow::anyhow!("Failed to initialize sync connector: {}", e))?,
    );
    tracing::info!(
        "Sync connector initialized: {}",
        config.profile_api_base_url
    );

    // Routing policy over mutation events
    let dispatcher = Dispatcher::new(connector.clone(), store.clone());

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        store,
        connector,
        dispatcher,
        config: config.clone(),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        // Record lookup
        .route("/api/v1/persons/:id", get(handlers::get_person))
        // Manual sync triggers (run the callout inline)
        .route("/api/v1/sync/pull/:external_id", post(handlers::trigger_pull))
        .route("/api/v1/sync/push/:id", post(handlers::trigger_push))
        // Record-mutation webhook endpoint
        .route(
            "/api/v1/webhooks/records",
            post(webhook_handler::record_mutation_webhook),
        )
        .layer(
            ServiceBuilder::new()
                // Request size limit: 5MB max payload (prevents memory exhaustion)
                .layer(RequestBodyLimitLayer::new(5 * 1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20 (prevents DDoS)
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
