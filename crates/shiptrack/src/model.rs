// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Vessel data types shared by the provider, the stores and the read API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation of a vessel as returned by the telemetry provider.
///
/// Reports are produced once per vessel per cycle and never mutated; a report
/// whose persistence fails is simply dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselReport {
    /// Maritime Mobile Service Identity, the stable vessel key.
    pub mmsi: String,
    /// Display name.
    pub name: String,
    /// Latitude in signed degrees.
    pub latitude: f64,
    /// Longitude in signed degrees.
    pub longitude: f64,
    /// Speed over ground.
    pub speed: f64,
    /// Heading in degrees.
    pub heading: f64,
    /// When the position was observed.
    pub timestamp: DateTime<Utc>,
}

/// A persisted reading joined with its vessel, as served by the read API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReadingRow {
    /// Vessel identifier (MMSI).
    pub identifier: String,
    /// Vessel display name at the time of the last upsert.
    pub name: String,
    /// Latitude in signed degrees.
    pub latitude: f64,
    /// Longitude in signed degrees.
    pub longitude: f64,
    /// Speed over ground.
    pub speed: f64,
    /// Heading in degrees.
    pub heading: f64,
    /// Observation time of this reading.
    pub timestamp: DateTime<Utc>,
}

impl ReadingRow {
    /// Build a row from a report (used by in-memory stores).
    pub fn from_report(report: &VesselReport, name: &str) -> Self {
        Self {
            identifier: report.mmsi.clone(),
            name: name.to_string(),
            latitude: report.latitude,
            longitude: report.longitude,
            speed: report.speed,
            heading: report.heading,
            timestamp: report.timestamp,
        }
    }
}

/// Maximum readings returned for a single vessel.
pub const MAX_READINGS_PER_VESSEL: i64 = 100;
