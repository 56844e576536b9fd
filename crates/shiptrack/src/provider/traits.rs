// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Provider trait definitions.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::VesselReport;

/// Errors from provider operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProviderError {
    /// Network or transport failure (connect, timeout, reset).
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with a non-success status.
    #[error("Provider rejected request with status {status}")]
    Rejected {
        /// HTTP status code returned.
        status: u16,
    },

    /// The response body did not match the expected shape.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// A source of vessel telemetry.
///
/// Each call performs exactly one outbound request and keeps no state between
/// calls. There are no retries at this layer.
#[async_trait]
pub trait TelemetryProvider: Send + Sync {
    /// Short name used in logs.
    fn provider_type(&self) -> &'static str;

    /// Fetch the current report for one vessel.
    async fn fetch_report(&self, mmsi: &str) -> Result<VesselReport>;

    /// Replace the provider's tracked vessel list wholesale.
    ///
    /// The provider does not merge: callers always submit the complete list.
    async fn replace_tracked_list(&self, mmsi_list: &[String]) -> Result<()>;
}
