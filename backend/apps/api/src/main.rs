//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; application-level errors go through
//! `gate::GateError` / `kernel::error::AppError`.

use axum::{
    Json, Router,
    http::{Method, header},
    routing::get,
};
use gate::{GateConfig, PgGateRepository, codes_router, tasks_router};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,gate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let store = PgGateRepository::new(pool.clone());

    // Startup cleanup: retire and purge expired gate data.
    // Errors here should not prevent server startup.
    match store.cleanup_expired().await {
        Ok((tasks_expired, tasks_purged, rate_windows_purged)) => {
            tracing::info!(
                tasks_expired = tasks_expired,
                tasks_purged = tasks_purged,
                rate_windows_purged = rate_windows_purged,
                "Startup expiry sweep completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Startup expiry sweep failed, continuing anyway"
            );
        }
    }

    // Periodic sweep for storage hygiene; reads filter on the TTL anyway,
    // so a missed tick only delays cleanup, never correctness
    let sweep_secs: u64 = env::var("GATE_SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(300);

    let sweep_store = store.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(sweep_secs));
        // First tick fires immediately; the startup sweep already ran
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = sweep_store.cleanup_expired().await {
                tracing::warn!(error = %e, "Expiry sweep failed");
            }
        }
    });

    // Gate configuration
    let gate_config = if cfg!(debug_assertions) {
        GateConfig::development()
    } else {
        // In production the bypass code only exists if explicitly configured
        GateConfig {
            bypass_code: env::var("GATE_BYPASS_CODE").ok(),
            ..GateConfig::default()
        }
    };

    // CORS: the widget is embedded on arbitrary destination sites
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE]));

    // Build router
    let app = Router::new()
        .nest(
            "/api/tasks",
            tasks_router(store.clone(), gate_config.clone()),
        )
        .nest("/api/codes", codes_router(store, gate_config))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// GET /api/health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
