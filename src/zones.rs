// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone API handlers
//!
//! This module implements the HTTP handlers used by the VM watcher:
//! - Replacing a VM's interface set
//! - Removing a VM from the zone
//! - Inspecting the zone and its current content

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::{
    manager::ZoneManager,
    types::{lock_zone_manager, ApiError, AppState},
    zone_cache::{InterfaceUpdate, VmiInterface, VmiKey},
};

/// Request to replace the interfaces of a VM
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInterfacesRequest {
    /// Complete current interface set of the VM
    #[serde(default)]
    pub interfaces: Vec<VmiInterface>,
}

/// Response from zone updates
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ZoneUpdateResponse {
    /// Whether the zone file content changed
    pub changed: bool,
    /// SOA serial after the update
    pub serial: u64,
    pub message: String,
}

/// Zone information
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneInfo {
    pub domain: String,
    pub file_path: String,
    pub serial: u64,
    /// VMs with at least one record
    pub vmis: usize,
    pub records: usize,
    /// RFC 3339 time of the last zone file write by this process
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_written: Option<String>,
}

/// Run a zone manager call on the blocking thread pool
///
/// Zone file writes go through synchronous storage, so the manager is locked
/// and used off the async worker threads.
async fn with_manager_blocking<T, F>(
    zone_manager: &Arc<Mutex<ZoneManager>>,
    f: F,
) -> Result<T, ApiError>
where
    F: FnOnce(&mut ZoneManager) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let zone_manager = Arc::clone(zone_manager);

    tokio::task::spawn_blocking(move || {
        let mut manager = lock_zone_manager(&zone_manager)?;
        f(&mut *manager)
    })
    .await
    .map_err(|e| {
        error!("Zone manager task failed: {}", e);
        ApiError::InternalError(format!("Zone manager task failed: {}", e))
    })?
}

async fn apply_update(
    state: &AppState,
    key: VmiKey,
    update: InterfaceUpdate,
) -> Result<Json<ZoneUpdateResponse>, ApiError> {
    let task_key = key.clone();
    let (changed, serial) = with_manager_blocking(&state.zone_manager, move |manager| {
        let changed = manager.update_zone(&task_key, &update).map_err(|e| {
            error!("Zone update for {} failed: {}", task_key, e);
            ApiError::from(e)
        })?;
        Ok((changed, manager.serial()))
    })
    .await?;

    let message = if changed {
        format!("Zone updated for {}", key)
    } else {
        format!("Zone unchanged for {}", key)
    };

    Ok(Json(ZoneUpdateResponse {
        changed,
        serial,
        message,
    }))
}

/// Replace the interfaces of a VM
///
/// Only the first IPv4 address of each named interface is published.
/// Submitting the same set again, in any order, leaves the zone unchanged.
#[utoipa::path(
    put,
    path = "/api/v1/vmis/{namespace}/{name}",
    params(
        ("namespace" = String, Path, description = "VM namespace"),
        ("name" = String, Path, description = "VM name")
    ),
    request_body = UpdateInterfacesRequest,
    responses(
        (status = 200, description = "Interfaces applied", body = ZoneUpdateResponse),
        (status = 400, description = "Invalid VM identity"),
        (status = 500, description = "Zone file could not be written")
    ),
    tag = "zone"
)]
pub async fn update_vmi_interfaces(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    Json(request): Json<UpdateInterfacesRequest>,
) -> Result<Json<ZoneUpdateResponse>, ApiError> {
    info!(
        "Updating interfaces of {}/{}: {} interfaces",
        namespace,
        name,
        request.interfaces.len()
    );

    apply_update(
        &state,
        VmiKey::new(name, namespace),
        InterfaceUpdate::Interfaces(request.interfaces),
    )
    .await
}

/// Remove a VM from the zone
#[utoipa::path(
    delete,
    path = "/api/v1/vmis/{namespace}/{name}",
    params(
        ("namespace" = String, Path, description = "VM namespace"),
        ("name" = String, Path, description = "VM name")
    ),
    responses(
        (status = 200, description = "VM removed", body = ZoneUpdateResponse),
        (status = 400, description = "Invalid VM identity"),
        (status = 500, description = "Zone file could not be written")
    ),
    tag = "zone"
)]
pub async fn delete_vmi(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<Json<ZoneUpdateResponse>, ApiError> {
    info!("Removing {}/{} from zone", namespace, name);

    apply_update(&state, VmiKey::new(name, namespace), InterfaceUpdate::Removed).await
}

/// Get zone information
#[utoipa::path(
    get,
    path = "/api/v1/zone",
    responses(
        (status = 200, description = "Zone information", body = ZoneInfo)
    ),
    tag = "zone"
)]
pub async fn get_zone(State(state): State<AppState>) -> Result<Json<ZoneInfo>, ApiError> {
    let manager = state.lock_manager()?;

    Ok(Json(ZoneInfo {
        domain: manager.domain().to_string(),
        file_path: manager.zone_file_path().display().to_string(),
        serial: manager.serial(),
        vmis: manager.vmi_count(),
        records: manager.record_count(),
        last_written: manager.last_written().map(|t| t.to_rfc3339()),
    }))
}

/// Get the current zone file content
#[utoipa::path(
    get,
    path = "/api/v1/zone/content",
    responses(
        (status = 200, description = "Zone file content", content_type = "text/plain", body = String)
    ),
    tag = "zone"
)]
pub async fn get_zone_content(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let content = state.lock_manager()?.content().to_string();

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        content,
    ))
}

/// Rewrite the zone file with the current content
///
/// Used to resynchronize the file after a failed write.
#[utoipa::path(
    post,
    path = "/api/v1/zone/flush",
    responses(
        (status = 200, description = "Zone file written", body = ZoneUpdateResponse),
        (status = 500, description = "Zone file could not be written")
    ),
    tag = "zone"
)]
pub async fn flush_zone(State(state): State<AppState>) -> Result<Json<ZoneUpdateResponse>, ApiError> {
    info!("Flushing zone file");

    let response = with_manager_blocking(&state.zone_manager, |manager| {
        manager.flush().map_err(|e| {
            error!("Zone flush failed: {}", e);
            ApiError::from(e)
        })?;

        Ok(ZoneUpdateResponse {
            changed: false,
            serial: manager.serial(),
            message: format!("Zone file {} written", manager.zone_file_path().display()),
        })
    })
    .await?;

    Ok(Json(response))
}
