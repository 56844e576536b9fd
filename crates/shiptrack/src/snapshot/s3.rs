// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! S3-backed snapshot store.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

use super::traits::*;

/// Snapshot store backed by one S3 bucket.
#[derive(Debug, Clone)]
pub struct S3SnapshotStore {
    client: Client,
    bucket: String,
}

impl S3SnapshotStore {
    /// Create a store from an existing S3 client.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Create a store using the default AWS credential and region chain.
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket)
    }
}

#[async_trait]
impl SnapshotStore for S3SnapshotStore {
    fn backend_type(&self) -> &'static str {
        "s3"
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                SnapshotError::Unavailable(format!(
                    "s3://{}/{}: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        let body = output.body.collect().await.map_err(|e| {
            SnapshotError::Unavailable(format!("s3://{}/{}: {}", self.bucket, key, e))
        })?;

        Ok(body.into_bytes().to_vec())
    }

    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("text/csv")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                SnapshotError::WriteFailed(format!(
                    "s3://{}/{}: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!(bucket = %self.bucket, key = %key, bytes = size, "Wrote snapshot object");
        Ok(())
    }

    async fn check(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                SnapshotError::Unavailable(format!(
                    "s3://{}: {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }
}
