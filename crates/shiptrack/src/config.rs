// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for shiptrack.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::poller::PollerConfig;

/// Default tracked-list resource name.
pub const DEFAULT_TRACKED_LIST_KEY: &str = "ship_list.csv";

/// Default snapshot resource name.
pub const DEFAULT_SNAPSHOT_KEY: &str = "latest_ship_data.csv";

/// Where the tracked list is read from and the snapshot is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotBackend {
    /// An S3 bucket (credentials and region come from the AWS default chain).
    S3 {
        /// Bucket name.
        bucket: String,
    },
    /// A local directory, mostly for development.
    Local {
        /// Directory holding the resources.
        dir: PathBuf,
    },
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string
    pub database_url: String,
    /// Maximum connections in the shared pool
    pub db_max_connections: u32,
    /// Snapshot store backend
    pub snapshot_backend: SnapshotBackend,
    /// Resource holding the tracked vessel list
    pub tracked_list_key: String,
    /// Resource receiving the latest snapshot
    pub snapshot_key: String,
    /// Telemetry provider base URL
    pub provider_base_url: String,
    /// Telemetry provider API key
    pub provider_api_key: String,
    /// Time between ingestion cycles
    pub poll_interval: Duration,
    /// Timeout for a single provider request
    pub fetch_timeout: Duration,
    /// Maximum vessels fetched in parallel within a cycle
    pub fetch_concurrency: usize,
    /// Read API listen address
    pub http_addr: SocketAddr,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("SHIPTRACK_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .ok_or(ConfigError::MissingEnvVar(
                "SHIPTRACK_DATABASE_URL or DATABASE_URL",
            ))?;

        // A local directory wins over S3 so development setups need no AWS credentials
        let snapshot_backend = match lookup("SHIPTRACK_SNAPSHOT_DIR") {
            Some(dir) => SnapshotBackend::Local {
                dir: PathBuf::from(dir),
            },
            None => {
                let bucket = lookup("SHIPTRACK_S3_BUCKET")
                    .or_else(|| lookup("S3_BUCKET"))
                    .ok_or(ConfigError::MissingEnvVar(
                        "SHIPTRACK_S3_BUCKET, S3_BUCKET or SHIPTRACK_SNAPSHOT_DIR",
                    ))?;
                SnapshotBackend::S3 { bucket }
            }
        };

        let provider_base_url = lookup("ORBCOMM_BASE_URL")
            .ok_or(ConfigError::MissingEnvVar("ORBCOMM_BASE_URL"))?
            .trim_end_matches('/')
            .to_string();

        let provider_api_key =
            lookup("ORBCOMM_API_KEY").ok_or(ConfigError::MissingEnvVar("ORBCOMM_API_KEY"))?;

        let poll_interval_secs: u64 =
            parse_or("SHIPTRACK_POLL_INTERVAL_SECS", lookup("SHIPTRACK_POLL_INTERVAL_SECS"), 300)?;
        if poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SHIPTRACK_POLL_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let fetch_timeout_secs: u64 =
            parse_or("SHIPTRACK_FETCH_TIMEOUT_SECS", lookup("SHIPTRACK_FETCH_TIMEOUT_SECS"), 30)?;
        if fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SHIPTRACK_FETCH_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        let fetch_concurrency: usize =
            parse_or("SHIPTRACK_FETCH_CONCURRENCY", lookup("SHIPTRACK_FETCH_CONCURRENCY"), 4)?;
        if fetch_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SHIPTRACK_FETCH_CONCURRENCY",
                value: "0".to_string(),
            });
        }

        let db_max_connections: u32 = parse_or(
            "SHIPTRACK_DB_MAX_CONNECTIONS",
            lookup("SHIPTRACK_DB_MAX_CONNECTIONS"),
            10,
        )?;

        let port: u16 = lookup("SHIPTRACK_HTTP_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let tracked_list_key = lookup("SHIPTRACK_TRACKED_LIST_KEY")
            .unwrap_or_else(|| DEFAULT_TRACKED_LIST_KEY.to_string());
        let snapshot_key =
            lookup("SHIPTRACK_SNAPSHOT_KEY").unwrap_or_else(|| DEFAULT_SNAPSHOT_KEY.to_string());

        Ok(Self {
            database_url,
            db_max_connections,
            snapshot_backend,
            tracked_list_key,
            snapshot_key,
            provider_base_url,
            provider_api_key,
            poll_interval: Duration::from_secs(poll_interval_secs),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            fetch_concurrency,
            http_addr: SocketAddr::from(([0, 0, 0, 0], port)),
        })
    }

    /// Poller settings derived from this configuration.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            poll_interval: self.poll_interval,
            fetch_concurrency: self.fetch_concurrency,
            tracked_list_key: self.tracked_list_key.clone(),
            snapshot_key: self.snapshot_key.clone(),
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    /// The port number is invalid.
    #[error("Invalid port number")]
    InvalidPort,
    /// A numeric setting could not be parsed or is out of range.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
    },
}
