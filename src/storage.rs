// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone file persistence
//!
//! The zone manager only ever reads the whole file once at startup and
//! rewrites the whole file on change. [`ZoneStorage`] captures exactly that.

use std::io;
use std::path::Path;
use tracing::debug;

/// Whole-file storage for zone content
pub trait ZoneStorage: Send + Sync {
    /// Read the full content at `path`; a missing file is `Ok(None)`
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>>;

    /// Replace the content at `path`
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;
}

/// Local filesystem storage
#[derive(Debug, Clone, Default)]
pub struct FileZoneStorage;

impl FileZoneStorage {
    pub fn new() -> Self {
        Self
    }
}

impl ZoneStorage for FileZoneStorage {
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(content) => {
                debug!("Read {} bytes from {}", content.len(), path.display());
                Ok(Some(content))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Zone file {} does not exist yet", path.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        std::fs::write(path, content)?;
        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }
}
