// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Directory-backed snapshot store.
//!
//! Objects are plain files below a root directory. Writes go to a temporary
//! sibling and are renamed into place, so readers never observe a partially
//! written snapshot.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::traits::*;

/// Snapshot store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalSnapshotStore {
    root: PathBuf,
}

impl LocalSnapshotStore {
    /// Create a store rooted at `root`. The directory must already exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl SnapshotStore for LocalSnapshotStore {
    fn backend_type(&self) -> &'static str {
        "local"
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(key);
        tokio::fs::read(&path)
            .await
            .map_err(|e| SnapshotError::Unavailable(format!("{}: {}", path.display(), e)))
    }

    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()> {
        let path = self.object_path(key);
        let write_failed =
            |e: std::io::Error| SnapshotError::WriteFailed(format!("{}: {}", path.display(), e));

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        tokio::fs::write(&tmp_path, &body)
            .await
            .map_err(write_failed)?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(write_failed)?;

        debug!(path = %path.display(), bytes = body.len(), "Wrote snapshot object");
        Ok(())
    }

    async fn check(&self) -> Result<()> {
        let metadata = tokio::fs::metadata(&self.root).await.map_err(|e| {
            SnapshotError::Unavailable(format!("{}: {}", self.root.display(), e))
        })?;
        if !metadata.is_dir() {
            return Err(SnapshotError::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }
}
