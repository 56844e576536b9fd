// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Snapshot store adapters.
//!
//! The snapshot store holds two CSV resources: the tracked vessel list (input,
//! maintained by operators) and the latest-position snapshot (output, replaced
//! in full at the end of every cycle).
//!
//! Backends only implement raw object get/put; CSV handling lives in [`codec`]
//! and is shared through the [`SnapshotStore`] default methods.

pub mod codec;
pub mod local;
pub mod memory;
pub mod s3;
mod traits;

pub use local::LocalSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use s3::S3SnapshotStore;
pub use traits::*;
