// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Embeddable runtime for shiptrack.
//!
//! [`ShiptrackRuntime`] runs the vessel poller and the read API side by side
//! inside an existing tokio application.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shiptrack::runtime::ShiptrackRuntime;
//! use shiptrack::provider::OrbcommClient;
//! use shiptrack::snapshot::S3SnapshotStore;
//! use shiptrack::store::PostgresStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = sqlx::PgPool::connect("postgres://...").await?;
//!
//!     let runtime = ShiptrackRuntime::builder()
//!         .store(Arc::new(PostgresStore::new(pool)))
//!         .provider(Arc::new(OrbcommClient::new("https://api.example.com", "key")?))
//!         .snapshots(Arc::new(S3SnapshotStore::from_env("my-bucket").await))
//!         .bind_addr("0.0.0.0:8080".parse()?)
//!         .build()?
//!         .start()
//!         .await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     runtime.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::api;
use crate::poller::{IngestionCycle, Poller, PollerConfig};
use crate::provider::TelemetryProvider;
use crate::snapshot::SnapshotStore;
use crate::store::VesselStore;

/// Builder for creating a [`ShiptrackRuntime`].
pub struct ShiptrackRuntimeBuilder {
    store: Option<Arc<dyn VesselStore>>,
    provider: Option<Arc<dyn TelemetryProvider>>,
    snapshots: Option<Arc<dyn SnapshotStore>>,
    poller_config: PollerConfig,
    bind_addr: SocketAddr,
}

impl Default for ShiptrackRuntimeBuilder {
    fn default() -> Self {
        Self {
            store: None,
            provider: None,
            snapshots: None,
            poller_config: PollerConfig::default(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl ShiptrackRuntimeBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the durable store (required). Shared by the poller and the read API.
    pub fn store(mut self, store: Arc<dyn VesselStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the telemetry provider (required).
    pub fn provider(mut self, provider: Arc<dyn TelemetryProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the snapshot store (required).
    pub fn snapshots(mut self, snapshots: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    /// Set the poller configuration.
    ///
    /// Default: [`PollerConfig::default()`]
    pub fn poller_config(mut self, config: PollerConfig) -> Self {
        self.poller_config = config;
        self
    }

    /// Set the bind address for the read API.
    ///
    /// Default: `0.0.0.0:8080`
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Build the runtime configuration.
    ///
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<ShiptrackRuntimeConfig> {
        let store = self
            .store
            .ok_or_else(|| anyhow::anyhow!("store is required"))?;
        let provider = self
            .provider
            .ok_or_else(|| anyhow::anyhow!("provider is required"))?;
        let snapshots = self
            .snapshots
            .ok_or_else(|| anyhow::anyhow!("snapshots is required"))?;

        Ok(ShiptrackRuntimeConfig {
            store,
            provider,
            snapshots,
            poller_config: self.poller_config,
            bind_addr: self.bind_addr,
        })
    }
}

/// Configuration for a [`ShiptrackRuntime`].
pub struct ShiptrackRuntimeConfig {
    store: Arc<dyn VesselStore>,
    provider: Arc<dyn TelemetryProvider>,
    snapshots: Arc<dyn SnapshotStore>,
    poller_config: PollerConfig,
    bind_addr: SocketAddr,
}

impl ShiptrackRuntimeConfig {
    /// Bind the read API and spawn the poller and server tasks.
    pub async fn start(self) -> Result<ShiptrackRuntime> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        let local_addr = listener.local_addr()?;

        let cycle = IngestionCycle::new(
            self.provider.clone(),
            self.store.clone(),
            self.snapshots.clone(),
            self.poller_config.clone(),
        );
        let poller = Poller::new(cycle);
        let poller_shutdown = poller.shutdown_handle();

        let poller_handle = tokio::spawn(async move {
            poller.run().await;
        });

        let (server_shutdown_tx, server_shutdown_rx) = watch::channel(false);
        let app = api::router(self.store.clone());

        let server_handle = tokio::spawn(run_http_server_with_shutdown(
            listener,
            app,
            server_shutdown_rx,
        ));

        info!(
            bind_addr = %local_addr,
            provider = self.provider.provider_type(),
            snapshot_backend = self.snapshots.backend_type(),
            poll_interval_secs = self.poller_config.poll_interval.as_secs(),
            "ShiptrackRuntime started"
        );

        Ok(ShiptrackRuntime {
            server_handle,
            poller_handle,
            server_shutdown_tx,
            poller_shutdown,
            local_addr,
        })
    }
}

/// A running poller plus read API.
///
/// Call [`shutdown`](Self::shutdown) for graceful termination.
pub struct ShiptrackRuntime {
    server_handle: JoinHandle<Result<()>>,
    poller_handle: JoinHandle<()>,
    server_shutdown_tx: watch::Sender<bool>,
    poller_shutdown: Arc<Notify>,
    local_addr: SocketAddr,
}

impl ShiptrackRuntime {
    /// Create a new builder for configuring the runtime.
    pub fn builder() -> ShiptrackRuntimeBuilder {
        ShiptrackRuntimeBuilder::new()
    }

    /// Address the read API is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Gracefully shut down the runtime.
    ///
    /// The poller finishes any cycle in flight; the HTTP server stops accepting
    /// connections and drains the open ones.
    pub async fn shutdown(self) -> Result<()> {
        info!("ShiptrackRuntime shutting down...");

        let _ = self.server_shutdown_tx.send(true);
        self.poller_shutdown.notify_one();

        if let Err(e) = self.poller_handle.await {
            error!("Poller task panicked: {}", e);
        }

        match self.server_handle.await {
            Ok(Ok(())) => {
                info!("ShiptrackRuntime shutdown complete");
                Ok(())
            }
            Ok(Err(e)) => {
                error!("Read API server error during shutdown: {}", e);
                Err(e)
            }
            Err(e) => {
                error!("Read API server task panicked: {}", e);
                Err(anyhow::anyhow!("server task panicked: {}", e))
            }
        }
    }

    /// Check if the runtime is still running.
    pub fn is_running(&self) -> bool {
        !self.server_handle.is_finished() && !self.poller_handle.is_finished()
    }
}

/// Serve the read API until the shutdown flag flips.
async fn run_http_server_with_shutdown(
    listener: TcpListener,
    app: Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            // A dropped sender also counts as shutdown
            while !*shutdown_rx.borrow() {
                if shutdown_rx.changed().await.is_err() {
                    break;
                }
            }
            info!("Read API shutting down");
        })
        .await?;
    Ok(())
}
