// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory zone file content
//!
//! [`ZoneFileCache`] owns the authoritative text of the VM zone file:
//! - a fixed SOA/NS header derived once from the configured domain
//! - one sorted list of A records per virtual machine
//! - the SOA serial, bumped exactly once per effective change
//!
//! The full file body is rebuilt only when the record set changes, so
//! reading [`ZoneFileCache::content`] is always cheap and never stale.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::serial_parser::parse_soa_serial;

/// SOA timing values in seconds
pub const REFRESH: u32 = 3600;
pub const RETRY: u32 = 3600;
pub const EXPIRE: u32 = 1_209_600;
pub const TTL: u32 = 3600;

/// Default label prefixes
pub const DOMAIN_DEFAULT: &str = "vm";
pub const NAME_SERVER_DEFAULT: &str = "ns";
pub const ADMIN_EMAIL_DEFAULT: &str = "email";

/// Identity of a virtual machine instance
///
/// Ordering is by name, then namespace. Zone content lists each VM's records
/// in this order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VmiKey {
    pub name: String,
    pub namespace: String,
}

impl VmiKey {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl std::fmt::Display for VmiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A single network interface reported for a VM
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VmiInterface {
    /// Interface name (e.g., "nic1"); unnamed interfaces get no record
    #[serde(default)]
    pub name: String,

    /// Addresses in the order reported; the first IPv4 literal is used
    #[serde(default)]
    pub ips: Vec<String>,
}

impl VmiInterface {
    pub fn new(name: impl Into<String>, ips: &[&str]) -> Self {
        Self {
            name: name.into(),
            ips: ips.iter().map(|ip| ip.to_string()).collect(),
        }
    }
}

/// New interface state for a VM
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceUpdate {
    /// The complete current set of interfaces
    Interfaces(Vec<VmiInterface>),
    /// The VM is gone; drop all of its records
    Removed,
}

/// Cached zone file content for all known VMs
#[derive(Debug, Clone)]
pub struct ZoneFileCache {
    soa_serial: u64,
    admin_email: String,
    name_server_name: String,
    name_server_ip: String,
    domain: String,

    header_prefix: String,
    header_suffix: String,

    content: String,

    vmi_records: BTreeMap<VmiKey, Vec<String>>,
}

impl ZoneFileCache {
    /// Create an empty cache
    ///
    /// # Arguments
    /// * `name_server_ip` - Address advertised for the zone's name server; when
    ///   empty, no NS/A lines are emitted for it
    /// * `domain_suffix` - Parent domain; the zone is `vm.<suffix>`, or plain
    ///   `vm` when empty
    pub fn new(name_server_ip: &str, domain_suffix: &str) -> Self {
        let domain = if domain_suffix.is_empty() {
            DOMAIN_DEFAULT.to_string()
        } else {
            format!("{}.{}", DOMAIN_DEFAULT, domain_suffix)
        };
        let name_server_name = format!("{}.{}", NAME_SERVER_DEFAULT, domain);
        let admin_email = format!("{}.{}", ADMIN_EMAIL_DEFAULT, domain);

        let header_prefix = format!(
            "$ORIGIN {}. \n$TTL {} \n@ IN SOA {}. {}. (",
            domain, TTL, name_server_name, admin_email
        );

        let mut header_suffix = format!(" {} {} {} {})\n", REFRESH, RETRY, EXPIRE, TTL);
        if !name_server_ip.is_empty() {
            header_suffix.push_str(&format!("IN NS {}.\n", name_server_name));
            header_suffix.push_str(&format!("IN A {}\n", name_server_ip));
        }

        let mut cache = Self {
            soa_serial: 0,
            admin_email,
            name_server_name,
            name_server_ip: name_server_ip.to_string(),
            domain,
            header_prefix,
            header_suffix,
            content: String::new(),
            vmi_records: BTreeMap::new(),
        };
        cache.rebuild_content();
        cache
    }

    /// Continue numbering from a previously written zone file
    ///
    /// Reads the SOA serial out of `content` and, when it is a positive
    /// number `N`, sets the serial to `N + 1` so the next published file
    /// never reuses a serial. Unparseable content leaves the serial alone.
    /// Returns the serial now in effect when it was changed.
    pub fn seed_from_existing(&mut self, content: &[u8]) -> Option<u64> {
        let text = String::from_utf8_lossy(content);
        let previous = match parse_soa_serial(&text) {
            Some(serial) if serial > 0 => serial,
            _ => {
                debug!("No usable SOA serial in existing zone content");
                return None;
            }
        };

        let Some(next) = previous.checked_add(1) else {
            warn!("Existing SOA serial {} cannot be advanced", previous);
            return None;
        };

        self.soa_serial = next;
        self.rebuild_content();
        debug!("Recovered SOA serial {}, continuing at {}", previous, next);
        Some(next)
    }

    /// Replace the records of one VM
    ///
    /// Returns `true` when the zone content changed, in which case the
    /// serial has been advanced by one and the content rebuilt. Once the
    /// serial has reached `u64::MAX` no further change is accepted.
    pub fn update_vmi_records(&mut self, key: &VmiKey, update: &InterfaceUpdate) -> bool {
        let Some(next_serial) = self.soa_serial.checked_add(1) else {
            warn!("SOA serial exhausted, ignoring update of {}", key);
            return false;
        };

        let updated = match update {
            InterfaceUpdate::Removed => self.vmi_records.remove(key).is_some(),
            InterfaceUpdate::Interfaces(interfaces) => {
                let records = build_a_records(&key.name, &key.namespace, interfaces);
                let current = self.vmi_records.get(key).map(Vec::as_slice).unwrap_or(&[]);

                if records.as_slice() == current {
                    false
                } else if records.is_empty() {
                    self.vmi_records.remove(key);
                    true
                } else {
                    self.vmi_records.insert(key.clone(), records);
                    true
                }
            }
        };

        if updated {
            self.soa_serial = next_serial;
            self.rebuild_content();
        }
        updated
    }

    /// Zone header carrying the current serial
    pub fn header(&self) -> String {
        format!(
            "{}{}{}",
            self.header_prefix, self.soa_serial, self.header_suffix
        )
    }

    /// All A records, in content order
    pub fn a_records(&self) -> String {
        self.vmi_records.values().flatten().map(String::as_str).collect()
    }

    /// Full zone file body
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn soa_serial(&self) -> u64 {
        self.soa_serial
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn name_server_name(&self) -> &str {
        &self.name_server_name
    }

    pub fn name_server_ip(&self) -> &str {
        &self.name_server_ip
    }

    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    /// Number of VMs that currently have at least one record
    pub fn vmi_count(&self) -> usize {
        self.vmi_records.len()
    }

    /// Number of A records across all VMs
    pub fn record_count(&self) -> usize {
        self.vmi_records.values().map(Vec::len).sum()
    }

    fn rebuild_content(&mut self) {
        let mut content = self.header();
        for record in self.vmi_records.values().flatten() {
            content.push_str(record);
        }
        self.content = content;
    }
}

/// Build the sorted A records for one VM
///
/// Each named interface contributes at most one record, for its first
/// IPv4 address. Other address families and unnamed interfaces are skipped.
pub fn build_a_records(name: &str, namespace: &str, interfaces: &[VmiInterface]) -> Vec<String> {
    let mut records: Vec<String> = interfaces
        .iter()
        .filter(|iface| !iface.name.is_empty())
        .filter_map(|iface| {
            iface
                .ips
                .iter()
                .find(|ip| is_ipv4(ip))
                .map(|ip| generate_a_record(name, namespace, &iface.name, ip))
        })
        .collect();
    records.sort();
    records
}

/// Format a single A record line
pub fn generate_a_record(name: &str, namespace: &str, iface_name: &str, iface_ip: &str) -> String {
    format!("{}.{}.{} IN A {}\n", iface_name, name, namespace, iface_ip)
}

fn is_ipv4(ip: &str) -> bool {
    ip.parse::<Ipv4Addr>().is_ok()
}
