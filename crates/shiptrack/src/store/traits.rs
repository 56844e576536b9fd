// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Store trait definitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{ReadingRow, VesselReport};

/// Errors from durable store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// The database could not be reached (pool exhausted or closed, I/O, TLS).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A write was rejected or could not be committed.
    #[error("Storage write failed: {0}")]
    WriteFailed(String),

    /// A query failed.
    #[error("Storage read failed: {0}")]
    ReadFailed(String),
}

impl StoreError {
    /// Classify a sqlx error as either connectivity or operation failure.
    pub fn from_sqlx(e: sqlx::Error, write: bool) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::Unavailable(e.to_string()),
            _ if write => Self::WriteFailed(e.to_string()),
            _ => Self::ReadFailed(e.to_string()),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// The persisted descriptive state of one vessel.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct VesselRecord {
    /// Internal storage key.
    pub id: i64,
    /// Vessel identifier; unique and never changed after creation.
    pub mmsi: String,
    /// Display name from the most recent report.
    pub name: String,
    /// Observation time of the most recent report.
    pub last_updated: DateTime<Utc>,
}

/// Durable store for vessels and their readings.
#[async_trait]
pub trait VesselStore: Send + Sync {
    /// Upsert the vessel and append one reading, as a single atomic unit.
    ///
    /// Returns the vessel's internal storage key.
    async fn record_report(&self, report: &VesselReport) -> Result<i64>;

    /// Look up a vessel record.
    async fn get_vessel(&self, mmsi: &str) -> Result<Option<VesselRecord>>;

    /// Readings for one vessel, most recent first, at most
    /// [`MAX_READINGS_PER_VESSEL`](crate::model::MAX_READINGS_PER_VESSEL).
    ///
    /// Unknown vessels yield an empty list.
    async fn get_readings(&self, mmsi: &str) -> Result<Vec<ReadingRow>>;

    /// The most recent reading of every known vessel.
    async fn get_latest_per_vessel(&self) -> Result<Vec<ReadingRow>>;

    /// Connectivity check.
    async fn ping(&self) -> Result<()>;
}
