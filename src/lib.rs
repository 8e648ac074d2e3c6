// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! vmzone - DNS zone file maintenance for virtual machines
//!
//! Keeps the authoritative text of a zone file listing one A record per
//! named VM interface, and rewrites the file whenever that text changes.
//!
//! # Features
//!
//! - Deterministic zone file content, independent of interface ordering
//! - SOA serial advanced exactly once per effective change
//! - SOA serial recovered from a previously written file on restart
//! - HTTP API for the VM watcher, with Prometheus metrics
//!
//! # Usage
//!
//! ## As a Library
//!
//! ```rust
//! use vmzone::{InterfaceUpdate, VmiInterface, VmiKey, ZoneFileCache};
//!
//! let mut cache = ZoneFileCache::new("185.251.75.10", "domain.com");
//! assert_eq!(cache.domain(), "vm.domain.com");
//!
//! let changed = cache.update_vmi_records(
//!     &VmiKey::new("vmi1", "ns1"),
//!     &InterfaceUpdate::Interfaces(vec![VmiInterface::new("nic1", &["1.2.3.4"])]),
//! );
//! assert!(changed);
//! assert_eq!(cache.soa_serial(), 1);
//! assert!(cache.content().contains("nic1.vmi1.ns1 IN A 1.2.3.4\n"));
//! ```
//!
//! ## As a Binary
//!
//! ```bash
//! DOMAIN=domain.com NAME_SERVER_IP=185.251.75.10 ZONE_DIR=/zones vmzone
//! ```

// Re-export public modules
pub mod config;
pub mod manager;
pub mod metrics;
pub mod middleware;
pub mod serial_parser;
pub mod storage;
pub mod types;
pub mod zone_cache;
pub mod zones;

// Re-export commonly used types

// Configuration
pub use config::ZoneSettings;

// Zone content and its manager
pub use manager::{ZoneError, ZoneManager};
pub use zone_cache::{InterfaceUpdate, VmiInterface, VmiKey, ZoneFileCache};

// Persistence
pub use storage::{FileZoneStorage, ZoneStorage};

// Error types
pub use types::{ApiError, AppState, ErrorResponse};

// Request/Response types for API operations
pub use zones::{UpdateInterfacesRequest, ZoneInfo, ZoneUpdateResponse};

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod zones_test;
