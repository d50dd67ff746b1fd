//! HTTP surface: scrape endpoints, cluster inventory, health and self metrics

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use exporter_lib::{
    health::{ComponentStatus, HealthRegistry},
    inventory::cluster_inventory,
    observability::{ExporterMetrics, StructuredLogger},
    sink::render,
    CollectionKind, Endpoint, MetricAssembler,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[cfg(test)]
mod tests;

/// Shared application state
pub struct AppState {
    pub assembler: MetricAssembler,
    pub health_registry: HealthRegistry,
    pub metrics: ExporterMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        assembler: MetricAssembler,
        health_registry: HealthRegistry,
        metrics: ExporterMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            assembler,
            health_registry,
            metrics,
            logger,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScrapeParams {
    target: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceParams {
    master_ip: Option<String>,
    api_port: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn text_exposition(body: Vec<u8>) -> Response {
    let encoder = TextEncoder::new();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        body,
    )
        .into_response()
}

async fn scrape(
    kind: CollectionKind,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScrapeParams>,
) -> Response {
    let Some(target) = non_empty(params.target) else {
        return (
            StatusCode::BAD_REQUEST,
            "'target' parameter must be specified",
        )
            .into_response();
    };

    let started = Instant::now();
    let scrape = state.assembler.collect(kind, &target).await;
    let elapsed = started.elapsed().as_secs_f64();

    state.metrics.observe_scrape(&scrape, elapsed);
    state.logger.log_scrape(&scrape, elapsed);
    state.health_registry.record_scrape(&scrape).await;

    match render(&scrape.tuples) {
        Ok(body) => text_exposition(body),
        Err(e) => {
            error!(kind = %kind, target = %target, error = %e, "Failed to render scrape");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to render metrics: {e}"),
            )
                .into_response()
        }
    }
}

async fn resources(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResourceParams>,
) -> Response {
    let (Some(master_ip), Some(api_port)) =
        (non_empty(params.master_ip), non_empty(params.api_port))
    else {
        state
            .metrics
            .inc_inventory_requests(StatusCode::BAD_REQUEST.as_u16());
        return (
            StatusCode::BAD_REQUEST,
            "'master_ip' and 'api_port' parameters must be specified",
        )
            .into_response();
    };

    let endpoint = Endpoint::new(master_ip, api_port);
    match cluster_inventory(state.assembler.sources().as_ref(), &endpoint).await {
        Ok(inventory) => {
            state.metrics.inc_inventory_requests(StatusCode::OK.as_u16());
            (StatusCode::OK, Json(inventory)).into_response()
        }
        Err(e) => {
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            warn!(endpoint = %endpoint, error = %e, "Inventory request failed");
            state.metrics.inc_inventory_requests(status.as_u16());
            (status, e.to_string()).into_response()
        }
    }
}

/// Liveness: 200 while operational, 503 once a component is unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// The exporter's own metrics from the default registry
async fn metrics() -> Response {
    let mut buffer = Vec::new();
    match TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
        Ok(()) => text_exposition(buffer),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to encode metrics: {e}"),
        )
            .into_response(),
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found")
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new();
    for kind in CollectionKind::ALL {
        router = router.route(
            kind.path(),
            get(move |state: State<Arc<AppState>>, params: Query<ScrapeParams>| {
                scrape(kind, state, params)
            }),
        );
    }

    router
        .route("/api/v1/resources", get(resources))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %listener.local_addr()?, "Starting exporter HTTP server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
