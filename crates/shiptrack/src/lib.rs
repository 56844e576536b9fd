// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shiptrack - Vessel Position Poller
//!
//! Periodically fetches vessel position reports from a telemetry provider,
//! persists them in PostgreSQL, and mirrors a CSV snapshot of the latest
//! positions to object storage. A small HTTP API serves the stored readings.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!                 │   Snapshot Store (S3 / dir)  │
//!                 │  ship_list.csv               │
//!                 │  latest_ship_data.csv        │
//!                 └──────┬──────────────▲────────┘
//!           tracked list │              │ snapshot
//!                        ▼              │
//! ┌──────────────┐   ┌──────────────────┴───┐   ┌──────────────┐
//! │  Telemetry   │◄──│    Ingestion Cycle   │──►│  PostgreSQL  │
//! │  Provider    │──►│    (poller, 5 min)   │   │  vessels     │
//! └──────────────┘   └──────────────────────┘   │  readings    │
//!   sync list /                                 └──────▲───────┘
//!   fetch reports                                      │
//!                                            ┌─────────┴──────┐
//!                                            │    Read API    │
//!                                            │   Port 8080    │
//!                                            └────────────────┘
//! ```
//!
//! # Ingestion Cycle
//!
//! Every interval the poller reloads the tracked list, replaces the provider's
//! tracked list with it, fetches each vessel's report, upserts the vessel and
//! appends the reading in one transaction, then rewrites the snapshot with the
//! reports that were stored. See [`poller`] for failure handling.
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `SHIPTRACK_DATABASE_URL` | Yes* | - | PostgreSQL connection string |
//! | `DATABASE_URL` | Yes* | - | Fallback if above not set |
//! | `SHIPTRACK_S3_BUCKET` / `S3_BUCKET` | Yes** | - | Snapshot bucket |
//! | `SHIPTRACK_SNAPSHOT_DIR` | No | - | Local directory used instead of S3 |
//! | `ORBCOMM_BASE_URL` | Yes | - | Provider base URL |
//! | `ORBCOMM_API_KEY` | Yes | - | Provider API key |
//! | `SHIPTRACK_POLL_INTERVAL_SECS` | No | `300` | Time between cycles |
//! | `SHIPTRACK_FETCH_TIMEOUT_SECS` | No | `30` | Provider request timeout |
//! | `SHIPTRACK_FETCH_CONCURRENCY` | No | `4` | Vessels fetched in parallel |
//! | `SHIPTRACK_TRACKED_LIST_KEY` | No | `ship_list.csv` | Tracked list resource |
//! | `SHIPTRACK_SNAPSHOT_KEY` | No | `latest_ship_data.csv` | Snapshot resource |
//! | `SHIPTRACK_HTTP_PORT` | No | `8080` | Read API port |
//! | `SHIPTRACK_DB_MAX_CONNECTIONS` | No | `10` | Pool size |
//!
//! \*One of the two database URLs is required.
//! \*\*Not required when `SHIPTRACK_SNAPSHOT_DIR` is set.
//!
//! # Modules
//!
//! - [`config`]: Configuration from environment variables
//! - [`provider`]: Telemetry provider client
//! - [`snapshot`]: Tracked list and snapshot storage
//! - [`store`]: Durable vessel storage
//! - [`poller`]: Ingestion cycle and its timer
//! - [`api`]: Read API
//! - [`runtime`]: Embeddable runtime wiring the poller and the API

#![deny(missing_docs)]

/// Database migrations for shiptrack.
pub mod migrations;

/// Configuration loaded from environment variables.
pub mod config;

/// Error types.
pub mod error;

/// Vessel data types.
pub mod model;

/// Telemetry provider clients.
pub mod provider;

/// Snapshot store backends.
pub mod snapshot;

/// Durable vessel storage.
pub mod store;

/// Ingestion cycle and poller worker.
pub mod poller;

/// Read-only HTTP API.
pub mod api;

/// Embeddable runtime.
pub mod runtime;

pub use config::Config;
pub use error::{Error, Result};
