// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone manager
//!
//! Ties the in-memory [`ZoneFileCache`] to the zone file on disk:
//! 1. On startup, reads any existing zone file and continues its SOA serial
//! 2. On each VM interface change, updates the cache
//! 3. Rewrites the zone file only when the cache reports a change
//!
//! The manager performs no locking. Callers that share it between tasks must
//! serialize access (the HTTP server wraps it in a mutex).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vmzone::{FileZoneStorage, InterfaceUpdate, VmiInterface, VmiKey, ZoneManager, ZoneSettings};
//!
//! let settings = ZoneSettings::from_env();
//! let mut manager = ZoneManager::new(&settings, Arc::new(FileZoneStorage::new()));
//!
//! let changed = manager.update_zone(
//!     &VmiKey::new("vmi1", "ns1"),
//!     &InterfaceUpdate::Interfaces(vec![VmiInterface::new("nic1", &["1.2.3.4"])]),
//! )?;
//! assert!(changed);
//! # Ok::<(), vmzone::ZoneError>(())
//! ```

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    config::ZoneSettings,
    metrics,
    storage::ZoneStorage,
    zone_cache::{InterfaceUpdate, VmiKey, ZoneFileCache},
};

/// Zone manager errors
#[derive(Debug, Error)]
pub enum ZoneError {
    /// Caller supplied an unusable VM identity; nothing was changed
    #[error("Invalid VM identity: {0}")]
    Validation(String),

    /// The cache was updated but the zone file could not be written
    #[error("Failed to write zone file {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Owns the zone cache and its backing file
pub struct ZoneManager {
    cache: ZoneFileCache,
    storage: Arc<dyn ZoneStorage>,
    zone_file_path: PathBuf,
    last_written: Option<DateTime<Utc>>,
}

impl ZoneManager {
    /// Create a zone manager, recovering the serial of an existing zone file
    ///
    /// A missing, empty or unreadable zone file is not an error; numbering
    /// then starts from zero.
    pub fn new(settings: &ZoneSettings, storage: Arc<dyn ZoneStorage>) -> Self {
        let mut cache = ZoneFileCache::new(&settings.name_server_ip, &settings.domain);
        let zone_file_path = settings.zone_file_path(cache.domain());

        info!(
            "Managing zone {} in {}",
            cache.domain(),
            zone_file_path.display()
        );

        match storage.read(&zone_file_path) {
            Ok(Some(content)) if !content.is_empty() => {
                if let Some(serial) = cache.seed_from_existing(&content) {
                    info!("Continuing SOA serial at {}", serial);
                } else {
                    warn!(
                        "Could not recover SOA serial from {}, starting at {}",
                        zone_file_path.display(),
                        cache.soa_serial()
                    );
                }
            }
            Ok(_) => debug!("No existing zone content at {}", zone_file_path.display()),
            Err(e) => warn!(
                "Failed to read existing zone file {}: {}",
                zone_file_path.display(),
                e
            ),
        }

        metrics::update_zone_state(cache.soa_serial(), cache.record_count());

        Self {
            cache,
            storage,
            zone_file_path,
            last_written: None,
        }
    }

    /// Apply new interface state for one VM
    ///
    /// Returns whether the zone changed. The zone file is written only on
    /// change; if that write fails the cache stays ahead of the file until a
    /// later successful write (see [`ZoneManager::flush`]).
    pub fn update_zone(&mut self, key: &VmiKey, update: &InterfaceUpdate) -> Result<bool, ZoneError> {
        let operation = match update {
            InterfaceUpdate::Interfaces(_) => "update",
            InterfaceUpdate::Removed => "delete",
        };

        if key.name.is_empty() {
            metrics::record_zone_update(operation, "error");
            return Err(ZoneError::Validation("VM name is empty".to_string()));
        }
        if key.namespace.is_empty() {
            metrics::record_zone_update(operation, "error");
            return Err(ZoneError::Validation("VM namespace is empty".to_string()));
        }

        if !self.cache.update_vmi_records(key, update) {
            debug!("Zone unchanged after {} of {}", operation, key);
            metrics::record_zone_update(operation, "unchanged");
            return Ok(false);
        }

        info!(
            "Zone changed after {} of {}, serial {}",
            operation,
            key,
            self.cache.soa_serial()
        );
        metrics::update_zone_state(self.cache.soa_serial(), self.cache.record_count());

        match self.write_content() {
            Ok(()) => {
                metrics::record_zone_update(operation, "changed");
                Ok(true)
            }
            Err(e) => {
                metrics::record_zone_update(operation, "error");
                Err(e)
            }
        }
    }

    /// Write the current zone content regardless of whether it changed
    pub fn flush(&mut self) -> Result<(), ZoneError> {
        self.write_content()
    }

    fn write_content(&mut self) -> Result<(), ZoneError> {
        let result = self
            .storage
            .write(&self.zone_file_path, self.cache.content().as_bytes());

        match result {
            Ok(()) => {
                metrics::record_zone_write(true);
                self.last_written = Some(Utc::now());
                info!(
                    "Wrote zone file {} (serial {}, {} records)",
                    self.zone_file_path.display(),
                    self.cache.soa_serial(),
                    self.cache.record_count()
                );
                Ok(())
            }
            Err(source) => {
                metrics::record_zone_write(false);
                error!(
                    "Failed to write zone file {}: {}",
                    self.zone_file_path.display(),
                    source
                );
                Err(ZoneError::Storage {
                    path: self.zone_file_path.clone(),
                    source,
                })
            }
        }
    }

    pub fn domain(&self) -> &str {
        self.cache.domain()
    }

    pub fn zone_file_path(&self) -> &Path {
        &self.zone_file_path
    }

    pub fn serial(&self) -> u64 {
        self.cache.soa_serial()
    }

    /// Current zone file body
    pub fn content(&self) -> &str {
        self.cache.content()
    }

    pub fn vmi_count(&self) -> usize {
        self.cache.vmi_count()
    }

    pub fn record_count(&self) -> usize {
        self.cache.record_count()
    }

    /// Time of the last successful zone file write by this process
    pub fn last_written(&self) -> Option<DateTime<Utc>> {
        self.last_written
    }

    pub fn cache(&self) -> &ZoneFileCache {
        &self.cache
    }
}
