// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Snapshot store trait definitions.

use async_trait::async_trait;
use thiserror::Error;

use super::codec;
use crate::model::VesselReport;

/// Errors from snapshot store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    /// The resource could not be read.
    #[error("Snapshot resource unavailable: {0}")]
    Unavailable(String),

    /// The resource could not be written.
    #[error("Snapshot write failed: {0}")]
    WriteFailed(String),

    /// The resource was read but is not valid CSV.
    #[error("Malformed snapshot resource: {0}")]
    Malformed(String),
}

/// Result type for snapshot store operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Flat-file object storage holding the tracked list and the snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Short name used in logs.
    fn backend_type(&self) -> &'static str;

    /// Read a whole object. Missing objects are `Unavailable`.
    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;

    /// Write a whole object, replacing any previous content.
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()>;

    /// Verify the backend is reachable. Called once at startup.
    async fn check(&self) -> Result<()> {
        Ok(())
    }

    /// Read the tracked vessel list: first column of every row after the header.
    ///
    /// A header-only resource yields an empty list.
    async fn read_tracked_list(&self, key: &str) -> Result<Vec<String>> {
        let body = self.get_object(key).await?;
        codec::parse_tracked_list(&body)
    }

    /// Replace the snapshot resource with the given reports.
    async fn write_snapshot(&self, key: &str, rows: &[VesselReport]) -> Result<()> {
        let body = codec::encode_snapshot(rows)?;
        self.put_object(key, body).await
    }
}
