// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Runtime configuration
//!
//! Environment variables:
//! - `DOMAIN`: parent domain of the VM zone (default: empty, zone is `vm`)
//! - `NAME_SERVER_IP`: address advertised for the zone's name server (default: empty)
//! - `ZONE_DIR`: directory holding the zone file (default: `/zones`)
//! - `API_PORT`: HTTP API port (default: 8080)

use std::path::PathBuf;

pub const ENV_DOMAIN: &str = "DOMAIN";
pub const ENV_NAME_SERVER_IP: &str = "NAME_SERVER_IP";
pub const ENV_ZONE_DIR: &str = "ZONE_DIR";
pub const ENV_API_PORT: &str = "API_PORT";

pub const DEFAULT_ZONE_DIR: &str = "/zones";
pub const DEFAULT_API_PORT: u16 = 8080;

/// Zone file name prefix; the resolved domain is appended
pub const ZONE_FILE_PREFIX: &str = "db.";

/// Zone manager settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSettings {
    /// Parent domain suffix, may be empty
    pub domain: String,
    /// Name server address, may be empty
    pub name_server_ip: String,
    /// Directory the zone file is written to
    pub zone_dir: PathBuf,
    /// HTTP API port
    pub api_port: u16,
}

impl Default for ZoneSettings {
    fn default() -> Self {
        Self {
            domain: String::new(),
            name_server_ip: String::new(),
            zone_dir: PathBuf::from(DEFAULT_ZONE_DIR),
            api_port: DEFAULT_API_PORT,
        }
    }
}

impl ZoneSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let domain = lookup(ENV_DOMAIN).unwrap_or_default();
        let name_server_ip = lookup(ENV_NAME_SERVER_IP).unwrap_or_default();

        let zone_dir = lookup(ENV_ZONE_DIR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ZONE_DIR));

        let api_port = lookup(ENV_API_PORT)
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_API_PORT);

        Self {
            domain,
            name_server_ip,
            zone_dir,
            api_port,
        }
    }

    /// Full path of the zone file for a resolved zone domain
    pub fn zone_file_path(&self, zone_domain: &str) -> PathBuf {
        self.zone_dir
            .join(format!("{}{}", ZONE_FILE_PREFIX, zone_domain))
    }
}
