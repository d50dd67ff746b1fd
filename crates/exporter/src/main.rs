//! Container Exporter - Kubernetes and cAdvisor metrics for Prometheus
//!
//! Serves one scrape endpoint per collection kind. Each request names a
//! target id that is resolved through the target catalog.

use anyhow::{Context, Result};
use clap::Parser;
use exporter_lib::{
    health::{components, HealthRegistry},
    observability::{ExporterMetrics, StructuredLogger},
    CatalogResolver, ConfigResolver, HttpSources, MetricAssembler,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Kubernetes and cAdvisor metrics exporter
#[derive(Parser, Debug)]
#[command(name = "container-exporter")]
#[command(version, about = "Prometheus exporter for Kubernetes and cAdvisor metrics", long_about = None)]
struct Cli {
    /// Address to listen on for scrape requests
    #[arg(long = "web.listen-address", env = "EXPORTER_LISTEN_ADDRESS", default_value = ":9109")]
    listen_address: String,
}

async fn shutdown_signal(logger: StructuredLogger) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    logger.log_shutdown("SIGINT received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = config::ExporterConfig::load()?;
    let listen_address = config::listen_address(&cli.listen_address);
    info!(
        catalog = %config.catalog_path.display(),
        listen_address = %listen_address,
        "Exporter configured"
    );

    let resolver = CatalogResolver::new(&config.catalog_path);
    resolver.check().await.with_context(|| {
        format!(
            "Target catalog {} is not usable",
            config.catalog_path.display()
        )
    })?;

    let sources = HttpSources::new(&config.http_settings())
        .context("Failed to create HTTP client")?;

    let health_registry = HealthRegistry::new();
    health_registry.register(components::RESOLVER).await;
    health_registry.register(components::SCRAPER).await;

    let logger = StructuredLogger::new(&listen_address);
    let app_state = Arc::new(api::AppState::new(
        MetricAssembler::new(Arc::new(resolver), Arc::new(sources)),
        health_registry.clone(),
        ExporterMetrics::new(),
        logger.clone(),
    ));

    let listener = TcpListener::bind(&listen_address)
        .await
        .with_context(|| format!("Failed to bind {listen_address}"))?;

    logger.log_startup(EXPORTER_VERSION, &config.catalog_path.display().to_string());
    health_registry.set_ready(true).await;

    api::serve(listener, app_state, shutdown_signal(logger)).await
}
