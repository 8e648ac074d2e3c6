// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Middleware for metrics collection

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics;

/// Route label for requests that matched no route
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Middleware to track HTTP request metrics
///
/// Requests are labelled with the route template (e.g.
/// `/api/v1/vmis/{namespace}/{name}`) so per-VM paths do not each
/// create a new time series.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    metrics::record_http_request(&method, &route, response.status().as_u16(), duration);

    response
}
