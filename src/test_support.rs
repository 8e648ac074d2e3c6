// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared helpers for unit tests

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::ThreadId;

use crate::storage::ZoneStorage;

/// In-memory zone storage with switchable write failures
#[derive(Default)]
pub struct MemoryZoneStorage {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    writes: AtomicUsize,
    write_threads: Mutex<Vec<ThreadId>>,
}

impl MemoryZoneStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(path: impl Into<PathBuf>, content: &str) -> Self {
        let storage = Self::new();
        storage
            .files
            .lock()
            .unwrap()
            .insert(path.into(), content.as_bytes().to_vec());
        storage
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Threads that performed successful writes, in order
    pub fn write_threads(&self) -> Vec<ThreadId> {
        self.write_threads.lock().unwrap().clone()
    }

    pub fn content(&self, path: &Path) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|c| String::from_utf8_lossy(c).into_owned())
    }
}

impl ZoneStorage for MemoryZoneStorage {
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read denied"));
        }
        Ok(self.files.lock().unwrap().get(path).cloned())
    }

    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.write_threads
            .lock()
            .unwrap()
            .push(std::thread::current().id());
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }
}
