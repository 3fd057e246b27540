use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio_cron_scheduler::JobScheduler;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roomgate::api::AppState;
use roomgate::clock::SystemClock;
use roomgate::config::Config;
use roomgate::db;
use roomgate::jobs::request_expirer;
use roomgate::services::AdmissionService;
use roomgate::store::{AdmissionStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting roomgate server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Wire the admission workflow
    let store: Arc<dyn AdmissionStore> = Arc::new(PgStore::new(pool.clone()));
    let admissions = Arc::new(AdmissionService::new(store, Arc::new(SystemClock)));

    // Schedule the expiry sweep
    let scheduler = JobScheduler::new().await?;
    request_expirer::schedule_sweep(
        &scheduler,
        admissions.clone(),
        &config.expiry_sweep_schedule,
        config.request_expiration_hours,
    )
    .await?;
    scheduler.start().await?;
    tracing::info!(
        schedule = %config.expiry_sweep_schedule,
        expiration_hours = config.request_expiration_hours,
        "Expiry sweep scheduled"
    );

    // Build router
    let state = AppState { admissions };
    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(roomgate::api::admissions::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, cleaning up...");
}
