// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock provider for testing.
//!
//! Serves scripted reports and failures without any network access, and
//! records every call so tests can assert on what the cycle did.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::traits::*;
use crate::model::VesselReport;

/// Mock telemetry provider.
///
/// Vessels without a scripted response are answered with `Rejected { status: 404 }`.
#[derive(Debug, Default)]
pub struct MockProvider {
    responses: Mutex<HashMap<String, Result<VesselReport>>>,
    sync_failure: Mutex<Option<ProviderError>>,
    fetched: Mutex<Vec<String>>,
    synced: Mutex<Vec<Vec<String>>>,
    fetch_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockProvider {
    /// Create a mock provider with no scripted vessels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful report, keyed by the report's MMSI.
    pub fn with_report(self, report: VesselReport) -> Self {
        self.set_report(report);
        self
    }

    /// Script a failure for one vessel.
    pub fn with_failure(self, mmsi: &str, error: ProviderError) -> Self {
        lock(&self.responses).insert(mmsi.to_string(), Err(error));
        self
    }

    /// Make every tracked-list replacement fail.
    pub fn with_sync_failure(self, error: ProviderError) -> Self {
        *lock(&self.sync_failure) = Some(error);
        self
    }

    /// Delay every fetch by `delay` (tokio time, so paused clocks apply).
    pub fn with_fetch_delay(self, delay: Duration) -> Self {
        *lock(&self.fetch_delay) = Some(delay);
        self
    }

    /// Replace the scripted report for a vessel.
    pub fn set_report(&self, report: VesselReport) {
        lock(&self.responses).insert(report.mmsi.clone(), Ok(report));
    }

    /// MMSIs fetched so far, in call order.
    pub fn fetched(&self) -> Vec<String> {
        lock(&self.fetched).clone()
    }

    /// Tracked lists submitted so far, in call order.
    pub fn synced_lists(&self) -> Vec<Vec<String>> {
        lock(&self.synced).clone()
    }

    /// Fetches currently awaiting a response.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of fetches ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl TelemetryProvider for MockProvider {
    fn provider_type(&self) -> &'static str {
        "mock"
    }

    async fn fetch_report(&self, mmsi: &str) -> Result<VesselReport> {
        lock(&self.fetched).push(mmsi.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *lock(&self.fetch_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        lock(&self.responses)
            .get(mmsi)
            .cloned()
            .unwrap_or(Err(ProviderError::Rejected { status: 404 }))
    }

    async fn replace_tracked_list(&self, mmsi_list: &[String]) -> Result<()> {
        lock(&self.synced).push(mmsi_list.to_vec());
        match lock(&self.sync_failure).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
