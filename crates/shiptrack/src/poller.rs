// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Vessel ingestion cycle and the timer that drives it.
//!
//! Each tick starts one cycle, which walks these stages in order and then
//! waits for the next tick:
//!
//! ```text
//! ListLoading → ListSyncing → Fetching/Persisting → SnapshotPublishing
//! ```
//!
//! - A failure to load or sync the tracked list aborts the cycle before any
//!   vessel is fetched and before the snapshot is touched.
//! - Fetch and store failures are isolated to the vessel concerned; the rest of
//!   the fleet is still processed.
//! - A snapshot write failure is logged and does not undo committed readings.
//!
//! Nothing is carried between cycles: the tracked list is re-read every time
//! and failed vessels are simply picked up again on the next tick.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::{DEFAULT_SNAPSHOT_KEY, DEFAULT_TRACKED_LIST_KEY};
use crate::model::VesselReport;
use crate::provider::{ProviderError, TelemetryProvider};
use crate::snapshot::SnapshotStore;
use crate::store::{StoreError, VesselStore};

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between cycles
    pub poll_interval: Duration,
    /// Maximum vessels fetched and stored concurrently
    pub fetch_concurrency: usize,
    /// Snapshot store resource holding the tracked list
    pub tracked_list_key: String,
    /// Snapshot store resource receiving the snapshot
    pub snapshot_key: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(300),
            fetch_concurrency: 4,
            tracked_list_key: DEFAULT_TRACKED_LIST_KEY.to_string(),
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
        }
    }
}

/// Stage of an ingestion cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    /// Reading the tracked list from the snapshot store.
    ListLoading,
    /// Submitting the tracked list to the provider.
    ListSyncing,
    /// Fetching vessel reports.
    Fetching,
    /// Writing fetched reports to the durable store.
    Persisting,
    /// Writing the snapshot.
    SnapshotPublishing,
}

impl CycleStage {
    /// Stage name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListLoading => "list_loading",
            Self::ListSyncing => "list_syncing",
            Self::Fetching => "fetching",
            Self::Persisting => "persisting",
            Self::SnapshotPublishing => "snapshot_publishing",
        }
    }
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one vessel during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum VesselOutcome {
    /// Fetched and committed; the report goes into the snapshot.
    Persisted(VesselReport),
    /// The provider call failed; nothing was written.
    FetchFailed {
        /// Vessel identifier.
        mmsi: String,
        /// Provider failure.
        error: ProviderError,
    },
    /// The report was fetched but could not be committed; it is discarded.
    StoreFailed {
        /// Vessel identifier.
        mmsi: String,
        /// Store failure.
        error: StoreError,
    },
}

/// Result of one ingestion cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    /// Every vessel was attempted.
    Completed {
        /// Vessels in the tracked list.
        tracked: usize,
        /// Vessels fetched and committed.
        persisted: usize,
        /// Vessels whose fetch failed.
        fetch_failures: usize,
        /// Vessels whose commit failed.
        store_failures: usize,
        /// Whether the snapshot write succeeded.
        snapshot_published: bool,
    },
    /// The cycle stopped before fetching anything.
    Aborted {
        /// Stage that failed.
        stage: CycleStage,
        /// Failure description.
        reason: String,
    },
}

/// Trim, drop blanks and de-duplicate, keeping first occurrences in order.
pub fn normalize_tracked_list(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|mmsi| mmsi.trim().to_string())
        .filter(|mmsi| !mmsi.is_empty())
        .filter(|mmsi| seen.insert(mmsi.clone()))
        .collect()
}

/// One pass of the ingestion pipeline over injected collaborators.
pub struct IngestionCycle {
    provider: Arc<dyn TelemetryProvider>,
    store: Arc<dyn VesselStore>,
    snapshots: Arc<dyn SnapshotStore>,
    config: PollerConfig,
}

impl IngestionCycle {
    /// Create a cycle runner.
    pub fn new(
        provider: Arc<dyn TelemetryProvider>,
        store: Arc<dyn VesselStore>,
        snapshots: Arc<dyn SnapshotStore>,
        config: PollerConfig,
    ) -> Self {
        Self {
            provider,
            store,
            snapshots,
            config,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Run one full cycle. Never panics and never returns an error: failures
    /// are logged and summarised in the returned report.
    pub async fn run_once(&self) -> CycleReport {
        let started = Instant::now();
        info!(provider = self.provider.provider_type(), "Ingestion cycle started");

        let mmsi_list = match self
            .snapshots
            .read_tracked_list(&self.config.tracked_list_key)
            .await
        {
            Ok(raw) => normalize_tracked_list(raw),
            Err(e) => return self.abort(CycleStage::ListLoading, e.to_string()),
        };

        debug!(count = mmsi_list.len(), "Loaded tracked vessel list");

        if let Err(e) = self.provider.replace_tracked_list(&mmsi_list).await {
            return self.abort(CycleStage::ListSyncing, e.to_string());
        }

        let outcomes = self.process_vessels(&mmsi_list).await;

        let mut persisted = Vec::with_capacity(outcomes.len());
        let mut fetch_failures = 0;
        let mut store_failures = 0;
        for outcome in outcomes {
            match outcome {
                VesselOutcome::Persisted(report) => persisted.push(report),
                VesselOutcome::FetchFailed { .. } => fetch_failures += 1,
                VesselOutcome::StoreFailed { .. } => store_failures += 1,
            }
        }

        let snapshot_published = match self
            .snapshots
            .write_snapshot(&self.config.snapshot_key, &persisted)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!(
                    stage = %CycleStage::SnapshotPublishing,
                    key = %self.config.snapshot_key,
                    error = %e,
                    "Failed to publish snapshot"
                );
                false
            }
        };

        let report = CycleReport::Completed {
            tracked: mmsi_list.len(),
            persisted: persisted.len(),
            fetch_failures,
            store_failures,
            snapshot_published,
        };

        info!(
            tracked = mmsi_list.len(),
            persisted = persisted.len(),
            fetch_failures = fetch_failures,
            store_failures = store_failures,
            snapshot_published = snapshot_published,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ingestion cycle finished"
        );

        report
    }

    fn abort(&self, stage: CycleStage, reason: String) -> CycleReport {
        error!(stage = %stage, error = %reason, "Ingestion cycle aborted");
        CycleReport::Aborted { stage, reason }
    }

    /// Fetch and store every vessel, bounded by `fetch_concurrency`.
    ///
    /// Outcomes come back in tracked-list order.
    async fn process_vessels(&self, mmsi_list: &[String]) -> Vec<VesselOutcome> {
        // Owned identifiers keep the spawned poller future `Send`
        futures::stream::iter(mmsi_list.iter().cloned())
            .map(|mmsi| async move { self.process_vessel(&mmsi).await })
            .buffered(self.config.fetch_concurrency.max(1))
            .collect()
            .await
    }

    async fn process_vessel(&self, mmsi: &str) -> VesselOutcome {
        let report = match self.provider.fetch_report(mmsi).await {
            Ok(report) => report,
            Err(error) => {
                warn!(
                    stage = %CycleStage::Fetching,
                    mmsi = %mmsi,
                    error = %error,
                    "Failed to fetch vessel report"
                );
                return VesselOutcome::FetchFailed {
                    mmsi: mmsi.to_string(),
                    error,
                };
            }
        };

        match self.store.record_report(&report).await {
            Ok(vessel_id) => {
                debug!(mmsi = %mmsi, vessel_id = vessel_id, "Stored vessel reading");
                VesselOutcome::Persisted(report)
            }
            Err(error) => {
                warn!(
                    stage = %CycleStage::Persisting,
                    mmsi = %mmsi,
                    error = %error,
                    "Failed to store vessel reading"
                );
                VesselOutcome::StoreFailed {
                    mmsi: mmsi.to_string(),
                    error,
                }
            }
        }
    }
}

/// Background worker that runs an [`IngestionCycle`] on a fixed interval.
///
/// Cycles never overlap: a cycle runs to completion inside the loop, and ticks
/// missed while it runs are skipped rather than queued.
pub struct Poller {
    cycle: IngestionCycle,
    shutdown: Arc<Notify>,
}

impl Poller {
    /// Create a poller for the given cycle.
    pub fn new(cycle: IngestionCycle) -> Self {
        Self {
            cycle,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a handle to signal shutdown.
    ///
    /// A cycle already in flight is allowed to finish.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Run the poller loop until shutdown is signalled.
    ///
    /// The first cycle starts one interval after the loop begins.
    pub async fn run(self) {
        let poll_interval = self.cycle.config().poll_interval;
        info!(
            poll_interval_secs = poll_interval.as_secs(),
            fetch_concurrency = self.cycle.config().fetch_concurrency,
            "Vessel poller started"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    info!("Vessel poller received shutdown signal");
                    break;
                }

                _ = ticker.tick() => {
                    self.cycle.run_once().await;
                }
            }
        }

        info!("Vessel poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use crate::snapshot::MemorySnapshotStore;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    const LIST_KEY: &str = "ship_list.csv";
    const SNAPSHOT_KEY: &str = "latest_ship_data.csv";

    fn report(mmsi: &str) -> VesselReport {
        VesselReport {
            mmsi: mmsi.to_string(),
            name: format!("Vessel {}", mmsi),
            latitude: 51.5,
            longitude: -0.12,
            speed: 8.0,
            heading: 270.0,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    struct Harness {
        provider: Arc<MockProvider>,
        store: Arc<MemoryStore>,
        snapshots: Arc<MemorySnapshotStore>,
        cycle: IngestionCycle,
    }

    fn harness(
        provider: MockProvider,
        store: MemoryStore,
        snapshots: MemorySnapshotStore,
    ) -> Harness {
        let provider = Arc::new(provider);
        let store = Arc::new(store);
        let snapshots = Arc::new(snapshots);
        let cycle = IngestionCycle::new(
            provider.clone(),
            store.clone(),
            snapshots.clone(),
            PollerConfig {
                poll_interval: Duration::from_secs(5),
                fetch_concurrency: 4,
                tracked_list_key: LIST_KEY.to_string(),
                snapshot_key: SNAPSHOT_KEY.to_string(),
            },
        );
        Harness {
            provider,
            store,
            snapshots,
            cycle,
        }
    }

    fn snapshot_rows(snapshots: &MemorySnapshotStore) -> Vec<String> {
        snapshots
            .object_text(SNAPSHOT_KEY)
            .unwrap_or_default()
            .lines()
            .skip(1)
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_partial_fetch_failure_end_to_end() {
        let h = harness(
            MockProvider::new()
                .with_report(report("111"))
                .with_failure("222", ProviderError::Rejected { status: 500 }),
            MemoryStore::new(),
            MemorySnapshotStore::new().with_tracked_list(LIST_KEY, &["111", "222"]),
        );

        let result = h.cycle.run_once().await;

        assert_eq!(
            result,
            CycleReport::Completed {
                tracked: 2,
                persisted: 1,
                fetch_failures: 1,
                store_failures: 0,
                snapshot_published: true,
            }
        );
        assert_eq!(h.store.vessel_count(), 1);
        assert_eq!(h.store.reading_count("111"), 1);
        assert!(h.store.get_vessel("222").await.unwrap().is_none());

        let rows = snapshot_rows(&h.snapshots);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("111,Vessel 111,"));
    }

    #[tokio::test]
    async fn test_list_load_failure_aborts_everything() {
        let h = harness(
            MockProvider::new().with_report(report("111")),
            MemoryStore::new(),
            MemorySnapshotStore::new().failing_reads(),
        );

        let result = h.cycle.run_once().await;

        assert!(matches!(
            result,
            CycleReport::Aborted {
                stage: CycleStage::ListLoading,
                ..
            }
        ));
        assert!(h.provider.synced_lists().is_empty());
        assert!(h.provider.fetched().is_empty());
        assert_eq!(h.store.vessel_count(), 0);
        assert_eq!(h.snapshots.reads(), 1);
        assert_eq!(h.snapshots.writes(), 0);
    }

    #[tokio::test]
    async fn test_missing_list_resource_aborts() {
        let h = harness(
            MockProvider::new(),
            MemoryStore::new(),
            MemorySnapshotStore::new(),
        );

        let result = h.cycle.run_once().await;
        assert!(matches!(
            result,
            CycleReport::Aborted {
                stage: CycleStage::ListLoading,
                ..
            }
        ));
        assert_eq!(h.snapshots.writes(), 0);
    }

    #[tokio::test]
    async fn test_list_sync_failure_aborts_before_fetch() {
        let h = harness(
            MockProvider::new()
                .with_report(report("111"))
                .with_sync_failure(ProviderError::Unavailable("connection reset".into())),
            MemoryStore::new(),
            MemorySnapshotStore::new().with_tracked_list(LIST_KEY, &["111"]),
        );

        let result = h.cycle.run_once().await;

        assert!(matches!(
            result,
            CycleReport::Aborted {
                stage: CycleStage::ListSyncing,
                ..
            }
        ));
        assert_eq!(h.provider.synced_lists(), vec![vec!["111".to_string()]]);
        assert!(h.provider.fetched().is_empty());
        assert_eq!(h.store.vessel_count(), 0);
        assert_eq!(h.snapshots.writes(), 0);
    }

    #[tokio::test]
    async fn test_mid_list_fetch_failure_does_not_stop_the_rest() {
        let h = harness(
            MockProvider::new()
                .with_report(report("111"))
                .with_failure("222", ProviderError::Unavailable("timeout".into()))
                .with_report(report("333")),
            MemoryStore::new(),
            MemorySnapshotStore::new().with_tracked_list(LIST_KEY, &["111", "222", "333"]),
        );

        h.cycle.run_once().await;

        assert_eq!(h.provider.fetched().len(), 3);
        assert_eq!(h.store.reading_count("111"), 1);
        assert_eq!(h.store.reading_count("333"), 1);
        assert_eq!(h.store.reading_count("222"), 0);

        let rows = snapshot_rows(&h.snapshots);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("111,"));
        assert!(rows[1].starts_with("333,"));
    }

    #[tokio::test]
    async fn test_store_failure_excludes_vessel_from_snapshot() {
        let h = harness(
            MockProvider::new()
                .with_report(report("111"))
                .with_report(report("222")),
            MemoryStore::new().with_write_failure("111"),
            MemorySnapshotStore::new().with_tracked_list(LIST_KEY, &["111", "222"]),
        );

        let result = h.cycle.run_once().await;

        assert_eq!(
            result,
            CycleReport::Completed {
                tracked: 2,
                persisted: 1,
                fetch_failures: 0,
                store_failures: 1,
                snapshot_published: true,
            }
        );
        let rows = snapshot_rows(&h.snapshots);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("222,"));
    }

    #[tokio::test]
    async fn test_snapshot_failure_keeps_durable_writes() {
        let h = harness(
            MockProvider::new().with_report(report("111")),
            MemoryStore::new(),
            MemorySnapshotStore::new()
                .with_tracked_list(LIST_KEY, &["111"])
                .failing_writes(),
        );

        let result = h.cycle.run_once().await;

        assert!(matches!(
            result,
            CycleReport::Completed {
                persisted: 1,
                snapshot_published: false,
                ..
            }
        ));
        assert_eq!(h.store.reading_count("111"), 1);
        assert!(h.snapshots.object(SNAPSHOT_KEY).is_none());
    }

    #[tokio::test]
    async fn test_empty_list_is_a_valid_cycle() {
        let h = harness(
            MockProvider::new(),
            MemoryStore::new(),
            MemorySnapshotStore::new().with_tracked_list(LIST_KEY, &[]),
        );

        let result = h.cycle.run_once().await;

        assert_eq!(
            result,
            CycleReport::Completed {
                tracked: 0,
                persisted: 0,
                fetch_failures: 0,
                store_failures: 0,
                snapshot_published: true,
            }
        );
        assert_eq!(h.provider.synced_lists(), vec![Vec::<String>::new()]);
        assert_eq!(
            h.snapshots.object_text(SNAPSHOT_KEY).unwrap(),
            "identifier,name,latitude,longitude,speed,heading,timestamp\n"
        );
    }

    #[tokio::test]
    async fn test_list_is_reloaded_every_cycle() {
        let h = harness(
            MockProvider::new()
                .with_report(report("111"))
                .with_report(report("222")),
            MemoryStore::new(),
            MemorySnapshotStore::new().with_tracked_list(LIST_KEY, &["111", "222"]),
        );

        h.cycle.run_once().await;
        assert_eq!(snapshot_rows(&h.snapshots).len(), 2);

        h.snapshots
            .put_object(LIST_KEY, b"mmsi\n".to_vec())
            .await
            .unwrap();
        h.cycle.run_once().await;

        assert_eq!(h.provider.synced_lists().len(), 2);
        assert!(h.provider.synced_lists()[1].is_empty());
        assert!(snapshot_rows(&h.snapshots).is_empty());
        assert_eq!(h.store.reading_count("111"), 1);
    }

    #[tokio::test]
    async fn test_repeated_cycles_append_readings() {
        let h = harness(
            MockProvider::new().with_report(report("111")),
            MemoryStore::new(),
            MemorySnapshotStore::new().with_tracked_list(LIST_KEY, &["111"]),
        );

        h.cycle.run_once().await;
        let mut later = report("111");
        later.name = "Renamed".to_string();
        later.timestamp = later.timestamp + chrono::Duration::minutes(5);
        h.provider.set_report(later);
        h.cycle.run_once().await;

        assert_eq!(h.store.vessel_count(), 1);
        assert_eq!(h.store.reading_count("111"), 2);
        let vessel = h.store.get_vessel("111").await.unwrap().unwrap();
        assert_eq!(vessel.name, "Renamed");
    }

    #[tokio::test]
    async fn test_stale_report_keeps_vessel_last_updated() {
        let h = harness(
            MockProvider::new(),
            MemoryStore::new(),
            MemorySnapshotStore::new().with_tracked_list(LIST_KEY, &["111"]),
        );
        let fresh_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 5, 0).unwrap();

        let mut fresh = report("111");
        fresh.name = "Fresh".to_string();
        fresh.timestamp = fresh_at;
        h.provider.set_report(fresh);
        h.cycle.run_once().await;

        let mut stale = report("111");
        stale.name = "Stale".to_string();
        stale.timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        h.provider.set_report(stale);
        h.cycle.run_once().await;

        let vessel = h.store.get_vessel("111").await.unwrap().unwrap();
        assert_eq!(vessel.last_updated, fresh_at);
        assert_eq!(vessel.name, "Fresh");
        assert_eq!(h.store.reading_count("111"), 2);
    }

    #[tokio::test]
    async fn test_tracked_list_is_normalized_before_sync() {
        let h = harness(
            MockProvider::new()
                .with_report(report("111"))
                .with_report(report("222")),
            MemoryStore::new(),
            MemorySnapshotStore::new().with_object(
                LIST_KEY,
                b"mmsi\n111\n \n111\n222\n".to_vec(),
            ),
        );

        h.cycle.run_once().await;

        assert_eq!(
            h.provider.synced_lists(),
            vec![vec!["111".to_string(), "222".to_string()]]
        );
        let mut fetched = h.provider.fetched();
        fetched.sort();
        assert_eq!(fetched, vec!["111", "222"]);
    }

    #[tokio::test]
    async fn test_snapshot_follows_tracked_list_order() {
        let mmsi_list = ["500", "100", "400", "200", "300", "600"];
        let mut provider = MockProvider::new();
        for mmsi in mmsi_list {
            provider = provider.with_report(report(mmsi));
        }
        let h = harness(
            provider,
            MemoryStore::new(),
            MemorySnapshotStore::new().with_tracked_list(LIST_KEY, &mmsi_list),
        );

        h.cycle.run_once().await;

        let order: Vec<String> = snapshot_rows(&h.snapshots)
            .iter()
            .map(|row| row.split(',').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(order, mmsi_list);
    }

    #[test]
    fn test_normalize_tracked_list() {
        let raw = vec![
            " 111 ".to_string(),
            "".to_string(),
            "222".to_string(),
            "111".to_string(),
        ];
        assert_eq!(normalize_tracked_list(raw), vec!["111", "222"]);
    }

    #[test]
    fn test_config_default() {
        let config = PollerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(300));
        assert_eq!(config.fetch_concurrency, 4);
        assert_eq!(config.tracked_list_key, "ship_list.csv");
        assert_eq!(config.snapshot_key, "latest_ship_data.csv");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_ticks_until_shutdown() {
        let h = harness(
            MockProvider::new().with_report(report("111")),
            MemoryStore::new(),
            MemorySnapshotStore::new().with_tracked_list(LIST_KEY, &["111"]),
        );
        let provider = h.provider.clone();
        let store = h.store.clone();

        let poller = Poller::new(h.cycle);
        let shutdown = poller.shutdown_handle();
        let handle = tokio::spawn(poller.run());

        // Nothing happens before the first interval elapses
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(provider.synced_lists().is_empty());

        tokio::time::sleep(Duration::from_secs(7)).await;
        assert_eq!(provider.synced_lists().len(), 2);
        assert_eq!(store.reading_count("111"), 2);

        shutdown.notify_one();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cycle_skips_ticks_instead_of_overlapping() {
        // Each cycle takes 12s against a 5s interval
        let h = harness(
            MockProvider::new()
                .with_report(report("111"))
                .with_fetch_delay(Duration::from_secs(12)),
            MemoryStore::new(),
            MemorySnapshotStore::new().with_tracked_list(LIST_KEY, &["111"]),
        );
        let provider = h.provider.clone();
        let store = h.store.clone();

        let poller = Poller::new(h.cycle);
        let shutdown = poller.shutdown_handle();
        let handle = tokio::spawn(poller.run());

        // t=16: the first cycle started at t=5 is still fetching; ticks at 10 and 15 passed
        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(provider.synced_lists().len(), 1);
        assert_eq!(provider.in_flight(), 1);
        assert_eq!(store.reading_count("111"), 0);

        // t=18: first cycle done
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.reading_count("111"), 1);

        tokio::time::sleep(Duration::from_secs(22)).await;
        let cycles = provider.synced_lists().len();
        assert!(cycles <= 3, "ran {} cycles in 40s", cycles);
        assert_eq!(provider.max_in_flight(), 1);

        // The cycle in flight finishes before the poller stops
        shutdown.notify_one();
        handle.await.unwrap();
        assert_eq!(store.reading_count("111"), cycles);
        assert_eq!(provider.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_concurrency_is_bounded() {
        let mmsi_list = ["1", "2", "3", "4", "5", "6", "7", "8", "9"];
        let mut provider = MockProvider::new().with_fetch_delay(Duration::from_secs(1));
        for mmsi in mmsi_list {
            provider = provider.with_report(report(mmsi));
        }
        let h = harness(
            provider,
            MemoryStore::new(),
            MemorySnapshotStore::new().with_tracked_list(LIST_KEY, &mmsi_list),
        );

        let result = h.cycle.run_once().await;

        assert!(matches!(
            result,
            CycleReport::Completed { persisted: 9, .. }
        ));
        assert_eq!(h.provider.max_in_flight(), 4);
    }
}
