// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for zones module

use super::zones::*;
use crate::config::ZoneSettings;
use crate::manager::ZoneManager;
use crate::test_support::MemoryZoneStorage;
use crate::types::AppState;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    routing::{get, post, put},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

fn settings() -> ZoneSettings {
    ZoneSettings {
        domain: "domain.com".to_string(),
        name_server_ip: "185.251.75.10".to_string(),
        ..ZoneSettings::default()
    }
}

fn zone_path() -> PathBuf {
    PathBuf::from("/zones/db.vm.domain.com")
}

fn app(storage: Arc<MemoryZoneStorage>) -> Router {
    let settings = settings();
    let manager = ZoneManager::new(&settings, storage);
    let state = AppState::new(manager, settings.zone_dir);

    Router::new()
        .route(
            "/api/v1/vmis/{namespace}/{name}",
            put(update_vmi_interfaces).delete(delete_vmi),
        )
        .route("/api/v1/zone", get(get_zone))
        .route("/api/v1/zone/content", get(get_zone_content))
        .route("/api/v1/zone/flush", post(flush_zone))
        .with_state(state)
}

fn put_interfaces(namespace: &str, name: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/v1/vmis/{}/{}", namespace, name))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(namespace: &str, name: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/v1/vmis/{}/{}", namespace, name))
        .body(Body::empty())
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn update_response(app: &Router, request: Request<Body>) -> (StatusCode, ZoneUpdateResponse) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

const NIC1_BODY: &str = r#"{"interfaces": [{"name": "nic1", "ips": ["1.2.3.4"]}]}"#;

#[test]
fn test_update_interfaces_request_deserialization() {
    let json = r#"{
        "interfaces": [
            {"name": "nic1", "ips": ["fe80::1", "1.2.3.4"]},
            {"ips": ["5.6.7.8"]}
        ]
    }"#;

    let request: UpdateInterfacesRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.interfaces.len(), 2);
    assert_eq!(request.interfaces[0].name, "nic1");
    assert_eq!(request.interfaces[0].ips, vec!["fe80::1", "1.2.3.4"]);
    assert!(request.interfaces[1].name.is_empty());
}

#[test]
fn test_update_interfaces_request_without_interfaces() {
    let request: UpdateInterfacesRequest = serde_json::from_str("{}").unwrap();
    assert!(request.interfaces.is_empty());
}

#[test]
fn test_zone_info_serialization() {
    let info = ZoneInfo {
        domain: "vm".to_string(),
        file_path: "/zones/db.vm".to_string(),
        serial: 3,
        vmis: 1,
        records: 2,
        last_written: None,
    };

    let json = serde_json::to_string(&info).unwrap();
    assert!(json.contains("\"filePath\":\"/zones/db.vm\""));
    assert!(!json.contains("lastWritten"));
}

#[tokio::test]
async fn test_put_interfaces_changes_zone() {
    let storage = Arc::new(MemoryZoneStorage::new());
    let app = app(storage.clone());

    let (status, body) = update_response(&app, put_interfaces("ns1", "vmi1", NIC1_BODY)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.changed);
    assert_eq!(body.serial, 1);

    let written = storage.content(&zone_path()).unwrap();
    assert!(written.contains("nic1.vmi1.ns1 IN A 1.2.3.4\n"));
}

#[tokio::test]
async fn test_put_same_interfaces_is_unchanged() {
    let storage = Arc::new(MemoryZoneStorage::new());
    let app = app(storage.clone());

    update_response(&app, put_interfaces("ns1", "vmi1", NIC1_BODY)).await;
    let (status, body) = update_response(&app, put_interfaces("ns1", "vmi1", NIC1_BODY)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.changed);
    assert_eq!(body.serial, 1);
    assert_eq!(storage.write_count(), 1);
}

#[tokio::test]
async fn test_put_reordered_interfaces_is_unchanged() {
    let storage = Arc::new(MemoryZoneStorage::new());
    let app = app(storage);

    let forward = r#"{"interfaces": [{"name": "nic1", "ips": ["1.2.3.4"]}, {"name": "nic2", "ips": ["5.6.7.8"]}]}"#;
    let backward = r#"{"interfaces": [{"name": "nic2", "ips": ["5.6.7.8"]}, {"name": "nic1", "ips": ["1.2.3.4"]}]}"#;

    let (_, first) = update_response(&app, put_interfaces("ns1", "vmi1", forward)).await;
    let (_, second) = update_response(&app, put_interfaces("ns1", "vmi1", backward)).await;

    assert!(first.changed);
    assert!(!second.changed);
    assert_eq!(second.serial, 1);
}

#[tokio::test]
async fn test_delete_vmi() {
    let storage = Arc::new(MemoryZoneStorage::new());
    let app = app(storage.clone());

    let (_, body) = update_response(&app, delete("ns1", "vmi1")).await;
    assert!(!body.changed);
    assert_eq!(body.serial, 0);

    update_response(&app, put_interfaces("ns1", "vmi1", NIC1_BODY)).await;
    let (status, body) = update_response(&app, delete("ns1", "vmi1")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.changed);
    assert_eq!(body.serial, 2);
    assert!(!storage.content(&zone_path()).unwrap().contains("vmi1"));
}

#[tokio::test]
async fn test_write_failure_returns_server_error() {
    let storage = Arc::new(MemoryZoneStorage::new());
    let app = app(storage.clone());
    storage.set_fail_writes(true);

    let response = app
        .clone()
        .oneshot(put_interfaces("ns1", "vmi1", NIC1_BODY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    storage.set_fail_writes(false);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/zone/flush")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(storage
        .content(&zone_path())
        .unwrap()
        .contains("nic1.vmi1.ns1 IN A 1.2.3.4\n"));
}

#[tokio::test]
async fn test_get_zone_info() {
    let storage = Arc::new(MemoryZoneStorage::new());
    let app = app(storage);

    update_response(&app, put_interfaces("ns1", "vmi1", NIC1_BODY)).await;

    let response = app.clone().oneshot(get_request("/api/v1/zone")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let info: ZoneInfo = serde_json::from_slice(&body).unwrap();
    assert_eq!(info.domain, "vm.domain.com");
    assert_eq!(info.file_path, "/zones/db.vm.domain.com");
    assert_eq!(info.serial, 1);
    assert_eq!(info.vmis, 1);
    assert_eq!(info.records, 1);
    assert!(info.last_written.is_some());
}

#[tokio::test]
async fn test_get_zone_content() {
    let storage = Arc::new(MemoryZoneStorage::new());
    let app = app(storage);

    update_response(&app, put_interfaces("ns1", "vmi1", NIC1_BODY)).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/zone/content"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let content = String::from_utf8(body.to_vec()).unwrap();
    assert!(content.starts_with("$ORIGIN vm.domain.com. \n"));
    assert!(content.ends_with("nic1.vmi1.ns1 IN A 1.2.3.4\n"));
}

#[tokio::test]
async fn test_zone_writes_run_off_the_runtime_thread() {
    let storage = Arc::new(MemoryZoneStorage::new());
    let app = app(storage.clone());
    let runtime_thread = std::thread::current().id();

    let (status, body) = update_response(&app, put_interfaces("ns1", "vmi1", NIC1_BODY)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.changed);

    let (status, _) = update_response(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/zone/flush")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let threads = storage.write_threads();
    assert_eq!(threads.len(), 2);
    assert!(threads.iter().all(|id| *id != runtime_thread));
}
