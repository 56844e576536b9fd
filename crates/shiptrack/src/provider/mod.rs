// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Telemetry provider clients.
//!
//! The ingestion cycle only depends on the [`TelemetryProvider`] trait:
//! fetch one vessel's current report, and replace the provider-side tracked list.

pub mod mock;
pub mod orbcomm;
mod traits;

pub use mock::MockProvider;
pub use orbcomm::OrbcommClient;
pub use traits::*;
