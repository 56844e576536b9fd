// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Durable vessel storage.
//!
//! The ingestion cycle writes through [`VesselStore::record_report`]; the read
//! API only uses the query methods.

pub mod memory;
pub mod postgres;
mod traits;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use traits::*;
