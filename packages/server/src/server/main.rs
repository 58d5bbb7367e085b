// Main entry point for API server

use anyhow::{Context, Result};
use catalog::ScraperRegistry;
use server_core::kernel::{connect_store, register_builtin_scrapers, SchedulerSettings, ScraperScheduler};
use server_core::{server::build_app, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first: LOG_LEVEL feeds the default filter
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Model Pricing Catalog API");

    // Connect to database
    tracing::info!("Connecting to catalog store...");
    let store = connect_store(&config.database_url)
        .await
        .context("Failed to connect to catalog store")?;

    // Discover scrapers
    let mut registry = ScraperRegistry::new();
    register_builtin_scrapers(&mut registry, &config);
    let discovered = registry.discover();

    // Start scheduled scraping
    let mut scheduler =
        ScraperScheduler::new(store.clone(), discovered, SchedulerSettings::from(&config));
    scheduler
        .start()
        .await
        .context("Failed to start scraper scheduler")?;

    // Build application
    let app = build_app(store, &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    scheduler
        .shutdown()
        .await
        .context("Failed to stop scraper scheduler")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
