// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! VM zone API server
//!
//! A lightweight HTTP server that keeps a DNS zone file for virtual machines:
//! - Maintains `db.<domain>` in the zone directory
//! - Accepts interface updates and removals from the VM watcher
//! - Continues the SOA serial of an existing zone file across restarts
//!
//! This server runs alongside the DNS server, sharing the zone file volume.

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Import from the library
use vmzone::{
    metrics, middleware,
    storage::FileZoneStorage,
    types::{AppState, ErrorResponse},
    zones, ZoneManager, ZoneSettings,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        zones::update_vmi_interfaces,
        zones::delete_vmi,
        zones::get_zone,
        zones::get_zone_content,
        zones::flush_zone,
    ),
    components(
        schemas(
            zones::UpdateInterfacesRequest,
            zones::ZoneUpdateResponse,
            zones::ZoneInfo,
            vmzone::VmiInterface,
        )
    ),
    tags(
        (name = "zone", description = "VM zone endpoints")
    ),
    info(
        title = "vmzone API",
        version = "0.1.0",
        description = "HTTP API for maintaining the VM DNS zone file",
        license(name = "MIT")
    )
)]
struct ApiDoc;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Readiness check response
#[derive(Serialize)]
struct ReadyResponse {
    ready: bool,
    checks: Vec<String>,
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Metrics endpoint for Prometheus scraping
async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(metrics_text) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4")],
            metrics_text,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to gather metrics: {}", e),
                details: None,
            }),
        )
            .into_response(),
    }
}

/// Readiness check endpoint
async fn ready_check(State(state): State<AppState>) -> Json<ReadyResponse> {
    let mut checks = Vec::new();
    let mut ready = true;

    match tokio::fs::metadata(&state.zone_dir).await {
        Ok(metadata) if metadata.is_dir() => {
            checks.push(format!("zone_dir_accessible: {}", state.zone_dir.display()));
        }
        Ok(_) => {
            ready = false;
            checks.push(format!("zone_dir_not_directory: {}", state.zone_dir.display()));
        }
        Err(e) => {
            ready = false;
            checks.push(format!("zone_dir_error: {}", e));
        }
    }

    match state.lock_manager() {
        Ok(manager) => checks.push(format!("zone_serial: {}", manager.serial())),
        Err(e) => {
            ready = false;
            checks.push(format!("zone_manager_error: {}", e));
        }
    }

    Json(ReadyResponse { ready, checks })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("starting vm zone api server v{}", env!("CARGO_PKG_VERSION"));

    // initialize metrics
    metrics::init_metrics();

    // get configuration from environment
    let settings = ZoneSettings::from_env();

    info!("zone directory: {}", settings.zone_dir.display());
    info!("api port: {}", settings.api_port);
    if settings.domain.is_empty() {
        info!("no domain suffix configured, serving the default zone");
    } else {
        info!("domain suffix: {}", settings.domain);
    }
    if settings.name_server_ip.is_empty() {
        info!("no name server ip configured, NS records are omitted");
    }

    // verify zone directory exists
    let zone_dir_metadata = tokio::fs::metadata(&settings.zone_dir)
        .await
        .with_context(|| format!("zone directory {} is not accessible", settings.zone_dir.display()))?;
    if !zone_dir_metadata.is_dir() {
        error!("zone directory is not a directory: {}", settings.zone_dir.display());
        return Err(anyhow::anyhow!("zone directory not found"));
    }

    // create zone manager, recovering the serial of any existing zone file
    let zone_manager = ZoneManager::new(&settings, Arc::new(FileZoneStorage::new()));
    info!(
        "zone {} ready at serial {}",
        zone_manager.domain(),
        zone_manager.serial()
    );

    // create application state
    let state = AppState::new(zone_manager, settings.zone_dir.clone());

    // build api routes
    let api_routes = Router::new()
        .route(
            "/vmis/{namespace}/{name}",
            put(zones::update_vmi_interfaces).delete(zones::delete_vmi),
        )
        .route("/zone", get(zones::get_zone))
        .route("/zone/content", get(zones::get_zone_content))
        .route("/zone/flush", post(zones::flush_zone))
        .with_state(state.clone());

    // build main router
    let app = Router::new()
        .merge(SwaggerUi::new("/api/v1/docs").url("/api/v1/openapi.json", ApiDoc::openapi()))
        .route("/api/v1/health", get(health_check))
        .route("/api/v1/ready", get(ready_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api/v1", api_routes)
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::track_metrics))
        .layer(TraceLayer::new_for_http());

    // start server
    let addr = format!("0.0.0.0:{}", settings.api_port);

    info!("vm zone api server listening on {}", addr);
    info!("swagger ui available at http://{}/api/v1/docs", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;

    Ok(())
}
