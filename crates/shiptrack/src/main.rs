// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shiptrack - Vessel Position Poller
//!
//! Runs the ingestion poller and the read API:
//! - Polls the telemetry provider for every tracked vessel
//! - Stores vessels and readings in PostgreSQL
//! - Mirrors the latest positions as CSV to S3 (or a local directory)
//! - Serves stored readings over HTTP

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use shiptrack::config::{Config, SnapshotBackend};
use shiptrack::provider::{OrbcommClient, TelemetryProvider};
use shiptrack::runtime::ShiptrackRuntime;
use shiptrack::snapshot::{LocalSnapshotStore, S3SnapshotStore, SnapshotStore};
use shiptrack::store::PostgresStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shiptrack=info,tower_http=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    let config = Config::from_env()?;

    info!(
        http_addr = %config.http_addr,
        provider_base_url = %config.provider_base_url,
        poll_interval_secs = config.poll_interval.as_secs(),
        fetch_concurrency = config.fetch_concurrency,
        "Starting Shiptrack"
    );

    let pool = connect_database(&config).await?;

    let snapshots = open_snapshot_store(&config.snapshot_backend).await?;
    info!(
        backend = snapshots.backend_type(),
        "Snapshot store reachable"
    );

    let provider = build_provider(&config)?;
    info!(provider = provider.provider_type(), "Provider client initialized");

    let runtime = ShiptrackRuntime::builder()
        .store(Arc::new(PostgresStore::new(pool.clone())))
        .provider(provider)
        .snapshots(snapshots)
        .poller_config(config.poller_config())
        .bind_addr(config.http_addr)
        .build()?
        .start()
        .await?;

    info!(addr = %runtime.local_addr(), "Shiptrack ready");

    wait_for_shutdown().await?;

    runtime.shutdown().await?;
    pool.close().await;

    info!("Shiptrack shut down");

    Ok(())
}

/// Connect the shared pool and apply pending migrations.
async fn connect_database(config: &Config) -> shiptrack::Result<PgPool> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;

    info!("Connected to database");

    shiptrack::migrations::run(&pool).await?;

    info!("Database schema verified");

    Ok(pool)
}

/// Open the configured snapshot backend and verify it is reachable.
async fn open_snapshot_store(
    backend: &SnapshotBackend,
) -> shiptrack::Result<Arc<dyn SnapshotStore>> {
    let store: Arc<dyn SnapshotStore> = match backend {
        SnapshotBackend::S3 { bucket } => Arc::new(S3SnapshotStore::from_env(bucket.clone()).await),
        SnapshotBackend::Local { dir } => Arc::new(LocalSnapshotStore::new(dir)),
    };

    store.check().await?;

    Ok(store)
}

/// Create the telemetry provider client.
fn build_provider(config: &Config) -> shiptrack::Result<Arc<dyn TelemetryProvider>> {
    let client = OrbcommClient::with_timeout(
        &config.provider_base_url,
        config.provider_api_key.clone(),
        config.fetch_timeout,
    )?;
    Ok(Arc::new(client))
}

/// Wait for Ctrl-C.
async fn wait_for_shutdown() -> shiptrack::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    Ok(())
}
