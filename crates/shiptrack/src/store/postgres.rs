// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgreSQL-backed vessel store.
//!
//! Schema lives in `migrations/`. Each vessel has one row in `vessels`
//! (unique on `mmsi`) and any number of append-only rows in `vessel_readings`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::traits::*;
use crate::model::{MAX_READINGS_PER_VESSEL, ReadingRow, VesselReport};

/// PostgreSQL-backed store implementation.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new Postgres-backed store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Write Operations
// ============================================================================

/// Create the vessel if absent, otherwise update its name and timestamp.
///
/// `last_updated` never moves backwards: a report older than the stored one
/// leaves the name and timestamp untouched. Returns the vessel's internal id
/// for linking readings.
pub async fn upsert_vessel(
    conn: &mut PgConnection,
    mmsi: &str,
    name: &str,
    last_updated: DateTime<Utc>,
) -> std::result::Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO vessels (mmsi, name, last_updated)
        VALUES ($1, $2, $3)
        ON CONFLICT (mmsi) DO UPDATE
        SET name = CASE
                WHEN EXCLUDED.last_updated >= vessels.last_updated THEN EXCLUDED.name
                ELSE vessels.name
            END,
            last_updated = GREATEST(vessels.last_updated, EXCLUDED.last_updated)
        RETURNING id
        "#,
    )
    .bind(mmsi)
    .bind(name)
    .bind(last_updated)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

/// Insert one immutable reading linked to a vessel.
pub async fn append_reading(
    conn: &mut PgConnection,
    vessel_id: i64,
    report: &VesselReport,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO vessel_readings (vessel_id, latitude, longitude, speed, heading, observed_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(vessel_id)
    .bind(report.latitude)
    .bind(report.longitude)
    .bind(report.speed)
    .bind(report.heading)
    .bind(report.timestamp)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Upsert the vessel and append its reading in one transaction.
pub async fn record_report(pool: &PgPool, report: &VesselReport) -> Result<i64> {
    let write_err = |e: sqlx::Error| StoreError::from_sqlx(e, true);

    let mut tx = pool.begin().await.map_err(write_err)?;

    let vessel_id = upsert_vessel(&mut *tx, &report.mmsi, &report.name, report.timestamp)
        .await
        .map_err(write_err)?;
    append_reading(&mut *tx, vessel_id, report)
        .await
        .map_err(write_err)?;

    // Dropping an uncommitted transaction rolls it back
    tx.commit().await.map_err(write_err)?;

    Ok(vessel_id)
}

// ============================================================================
// Read Operations
// ============================================================================

/// Get a vessel record by MMSI.
pub async fn get_vessel(pool: &PgPool, mmsi: &str) -> Result<Option<VesselRecord>> {
    sqlx::query_as::<_, VesselRecord>(
        r#"
        SELECT id, mmsi, name, last_updated
        FROM vessels
        WHERE mmsi = $1
        "#,
    )
    .bind(mmsi)
    .fetch_optional(pool)
    .await
    .map_err(|e| StoreError::from_sqlx(e, false))
}

/// Readings for one vessel, most recent first.
pub async fn get_readings(pool: &PgPool, mmsi: &str) -> Result<Vec<ReadingRow>> {
    sqlx::query_as::<_, ReadingRow>(
        r#"
        SELECT v.mmsi AS identifier, v.name, r.latitude, r.longitude, r.speed, r.heading,
               r.observed_at AS timestamp
        FROM vessels v
        JOIN vessel_readings r ON r.vessel_id = v.id
        WHERE v.mmsi = $1
        ORDER BY r.observed_at DESC, r.id DESC
        LIMIT $2
        "#,
    )
    .bind(mmsi)
    .bind(MAX_READINGS_PER_VESSEL)
    .fetch_all(pool)
    .await
    .map_err(|e| StoreError::from_sqlx(e, false))
}

/// Latest reading for every vessel that has at least one.
pub async fn get_latest_per_vessel(pool: &PgPool) -> Result<Vec<ReadingRow>> {
    sqlx::query_as::<_, ReadingRow>(
        r#"
        SELECT DISTINCT ON (v.mmsi)
               v.mmsi AS identifier, v.name, r.latitude, r.longitude, r.speed, r.heading,
               r.observed_at AS timestamp
        FROM vessels v
        JOIN vessel_readings r ON r.vessel_id = v.id
        ORDER BY v.mmsi, r.observed_at DESC, r.id DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| StoreError::from_sqlx(e, false))
}

#[async_trait]
impl VesselStore for PostgresStore {
    async fn record_report(&self, report: &VesselReport) -> Result<i64> {
        record_report(&self.pool, report).await
    }

    async fn get_vessel(&self, mmsi: &str) -> Result<Option<VesselRecord>> {
        get_vessel(&self.pool, mmsi).await
    }

    async fn get_readings(&self, mmsi: &str) -> Result<Vec<ReadingRow>> {
        get_readings(&self.pool, mmsi).await
    }

    async fn get_latest_per_vessel(&self) -> Result<Vec<ReadingRow>> {
        get_latest_per_vessel(&self.pool).await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx(e, false))?;
        Ok(())
    }
}
