// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! CSV encoding for the tracked list and the snapshot.

use chrono::SecondsFormat;

use super::traits::{Result, SnapshotError};
use crate::model::VesselReport;

/// Fixed header row of the snapshot resource.
pub const SNAPSHOT_HEADER: [&str; 7] = [
    "identifier",
    "name",
    "latitude",
    "longitude",
    "speed",
    "heading",
    "timestamp",
];

/// Parse a tracked-list resource.
///
/// The first row is a header and is skipped. Every following row contributes
/// its first column, whitespace-trimmed. Rows may have any number of columns.
pub fn parse_tracked_list(data: &[u8]) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut mmsi_list = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SnapshotError::Malformed(e.to_string()))?;
        if let Some(first) = record.get(0) {
            mmsi_list.push(first.trim().to_string());
        }
    }

    Ok(mmsi_list)
}

/// Encode reports as a snapshot: header first, then one row per report.
///
/// An empty slice still produces the header row.
pub fn encode_snapshot(rows: &[VesselReport]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    writer
        .write_record(SNAPSHOT_HEADER)
        .map_err(|e| SnapshotError::WriteFailed(e.to_string()))?;

    for row in rows {
        writer
            .write_record([
                row.mmsi.clone(),
                row.name.clone(),
                row.latitude.to_string(),
                row.longitude.to_string(),
                row.speed.to_string(),
                row.heading.to_string(),
                row.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ])
            .map_err(|e| SnapshotError::WriteFailed(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| SnapshotError::WriteFailed(e.to_string()))
}
