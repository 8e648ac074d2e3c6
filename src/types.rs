// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common types and errors used throughout the vmzone library

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::manager::{ZoneError, ZoneManager};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Zone manager; the mutex keeps one update in flight at a time.
    /// Calls that write the zone file run on the blocking thread pool.
    pub zone_manager: Arc<Mutex<ZoneManager>>,
    /// Zone file directory
    pub zone_dir: PathBuf,
}

impl AppState {
    pub fn new(zone_manager: ZoneManager, zone_dir: PathBuf) -> Self {
        Self {
            zone_manager: Arc::new(Mutex::new(zone_manager)),
            zone_dir,
        }
    }

    /// Lock the zone manager
    pub fn lock_manager(&self) -> Result<MutexGuard<'_, ZoneManager>, ApiError> {
        lock_zone_manager(&self.zone_manager)
    }
}

/// Lock a shared zone manager, reporting a poisoned lock as an internal error
pub fn lock_zone_manager(
    zone_manager: &Mutex<ZoneManager>,
) -> Result<MutexGuard<'_, ZoneManager>, ApiError> {
    zone_manager
        .lock()
        .map_err(|e| ApiError::InternalError(format!("Zone manager lock poisoned: {}", e)))
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Zone file error: {0}")]
    ZoneFileError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<ZoneError> for ApiError {
    fn from(err: ZoneError) -> Self {
        match err {
            ZoneError::Validation(msg) => ApiError::InvalidRequest(msg),
            e @ ZoneError::Storage { .. } => ApiError::ZoneFileError(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::ZoneFileError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            details: None,
        });

        (status, body).into_response()
    }
}
