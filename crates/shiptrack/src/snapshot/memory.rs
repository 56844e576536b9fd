// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory snapshot store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::traits::*;

/// Snapshot store backed by a map of object keys to bytes.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemorySnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tracked-list resource with a header and one MMSI per row.
    pub fn with_tracked_list(self, key: &str, mmsi_list: &[&str]) -> Self {
        let mut body = String::from("mmsi\n");
        for mmsi in mmsi_list {
            body.push_str(mmsi);
            body.push('\n');
        }
        self.with_object(key, body.into_bytes())
    }

    /// Seed an arbitrary object.
    pub fn with_object(self, key: &str, body: Vec<u8>) -> Self {
        lock(&self.objects).insert(key.to_string(), body);
        self
    }

    /// Make every read fail with `Unavailable`.
    pub fn failing_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    /// Make every write fail with `WriteFailed`.
    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    /// Toggle write failures at runtime.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current content of an object.
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.objects).get(key).cloned()
    }

    /// Current content of an object as text.
    pub fn object_text(&self, key: &str) -> Option<String> {
        self.object(key)
            .map(|body| String::from_utf8_lossy(&body).into_owned())
    }

    /// Number of get attempts.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of put attempts.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SnapshotError::Unavailable(format!("{}: read disabled", key)));
        }
        lock(&self.objects)
            .get(key)
            .cloned()
            .ok_or_else(|| SnapshotError::Unavailable(format!("{}: no such object", key)))
    }

    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SnapshotError::WriteFailed(format!("{}: write disabled", key)));
        }
        lock(&self.objects).insert(key.to_string(), body);
        Ok(())
    }
}
