// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory vessel store for testing.
//!
//! Mirrors the Postgres semantics: one record per MMSI, append-only readings,
//! and the upsert plus append applied together or not at all.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::traits::*;
use crate::model::{MAX_READINGS_PER_VESSEL, ReadingRow, VesselReport};

#[derive(Debug, Clone)]
struct StoredReading {
    seq: u64,
    vessel_id: i64,
    report: VesselReport,
}

#[derive(Debug, Default)]
struct MemoryState {
    vessels: Vec<VesselRecord>,
    readings: Vec<StoredReading>,
    next_seq: u64,
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    failing_writes: Mutex<HashSet<String>>,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes for one vessel fail with `WriteFailed`.
    pub fn with_write_failure(self, mmsi: &str) -> Self {
        lock(&self.failing_writes).insert(mmsi.to_string());
        self
    }

    /// Make every query fail with `Unavailable`.
    pub fn failing_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    /// Number of vessel records.
    pub fn vessel_count(&self) -> usize {
        lock(&self.state).vessels.len()
    }

    /// Number of readings stored for one vessel.
    pub fn reading_count(&self, mmsi: &str) -> usize {
        let state = lock(&self.state);
        let Some(vessel) = state.vessels.iter().find(|v| v.mmsi == mmsi) else {
            return 0;
        };
        state
            .readings
            .iter()
            .filter(|r| r.vessel_id == vessel.id)
            .count()
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn to_row(vessel: &VesselRecord, reading: &StoredReading) -> ReadingRow {
    ReadingRow::from_report(&reading.report, &vessel.name)
}

#[async_trait]
impl VesselStore for MemoryStore {
    async fn record_report(&self, report: &VesselReport) -> Result<i64> {
        if lock(&self.failing_writes).contains(&report.mmsi) {
            return Err(StoreError::WriteFailed(format!(
                "write disabled for {}",
                report.mmsi
            )));
        }

        // Single lock scope keeps the upsert and the append atomic
        let mut state = lock(&self.state);

        let vessel_id = match state.vessels.iter_mut().find(|v| v.mmsi == report.mmsi) {
            Some(vessel) => {
                if report.timestamp >= vessel.last_updated {
                    vessel.name = report.name.clone();
                    vessel.last_updated = report.timestamp;
                }
                vessel.id
            }
            None => {
                let id = state.vessels.len() as i64 + 1;
                state.vessels.push(VesselRecord {
                    id,
                    mmsi: report.mmsi.clone(),
                    name: report.name.clone(),
                    last_updated: report.timestamp,
                });
                id
            }
        };

        let seq = state.next_seq;
        state.next_seq += 1;
        state.readings.push(StoredReading {
            seq,
            vessel_id,
            report: report.clone(),
        });

        Ok(vessel_id)
    }

    async fn get_vessel(&self, mmsi: &str) -> Result<Option<VesselRecord>> {
        self.check_reads()?;
        Ok(lock(&self.state)
            .vessels
            .iter()
            .find(|v| v.mmsi == mmsi)
            .cloned())
    }

    async fn get_readings(&self, mmsi: &str) -> Result<Vec<ReadingRow>> {
        self.check_reads()?;
        let state = lock(&self.state);
        let Some(vessel) = state.vessels.iter().find(|v| v.mmsi == mmsi) else {
            return Ok(Vec::new());
        };

        let mut readings: Vec<&StoredReading> = state
            .readings
            .iter()
            .filter(|r| r.vessel_id == vessel.id)
            .collect();
        readings.sort_by(|a, b| {
            b.report
                .timestamp
                .cmp(&a.report.timestamp)
                .then(b.seq.cmp(&a.seq))
        });

        Ok(readings
            .into_iter()
            .take(MAX_READINGS_PER_VESSEL as usize)
            .map(|r| to_row(vessel, r))
            .collect())
    }

    async fn get_latest_per_vessel(&self) -> Result<Vec<ReadingRow>> {
        self.check_reads()?;
        let state = lock(&self.state);

        let mut rows = Vec::new();
        for vessel in &state.vessels {
            let latest = state
                .readings
                .iter()
                .filter(|r| r.vessel_id == vessel.id)
                .max_by(|a, b| {
                    a.report
                        .timestamp
                        .cmp(&b.report.timestamp)
                        .then(a.seq.cmp(&b.seq))
                });
            if let Some(reading) = latest {
                rows.push(to_row(vessel, reading));
            }
        }
        rows.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        self.check_reads()
    }
}
