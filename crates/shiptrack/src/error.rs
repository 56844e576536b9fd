// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for shiptrack.

use thiserror::Error;

/// Shiptrack errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying schema migrations failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Telemetry provider request failed.
    #[error("Provider error: {0}")]
    Provider(#[from] crate::provider::ProviderError),

    /// Snapshot store operation failed.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] crate::snapshot::SnapshotError),
}

/// Result type using shiptrack Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;

    fn provider_step() -> Result<()> {
        Err(ProviderError::Unavailable("invalid base URL".into()))?;
        Ok(())
    }

    fn io_step() -> Result<()> {
        Err(std::io::Error::other("signal handler unavailable"))?;
        Ok(())
    }

    #[test]
    fn test_startup_errors_convert() {
        let err = provider_step().unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Unavailable(_))));
        assert!(err.to_string().starts_with("Provider error:"));

        assert!(matches!(io_step().unwrap_err(), Error::Io(_)));
    }
}
