// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Read-only HTTP API over the durable store.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /entities/{identifier}` | Up to 100 readings for one vessel, most recent first |
//! | `GET /entities` | Latest reading per known vessel |
//! | `GET /health` | `{"status":"ok"}`, or 503 when the store does not answer |
//!
//! An unknown identifier yields an empty array. Store failures are logged and
//! answered with a generic 500 body.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::model::ReadingRow;
use crate::store::{StoreError, VesselStore};

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    store: Arc<dyn VesselStore>,
}

impl ApiState {
    /// Create handler state over a store.
    pub fn new(store: Arc<dyn VesselStore>) -> Self {
        Self { store }
    }
}

/// Build the read API router.
pub fn router(store: Arc<dyn VesselStore>) -> Router {
    Router::new()
        .route("/entities", get(list_latest))
        .route("/entities/{identifier}", get(get_entity_readings))
        .route("/health", get(health))
        .with_state(ApiState::new(store))
        .layer(TraceLayer::new_for_http())
}

/// Store failure surfaced to a client.
#[derive(Debug)]
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Read API query failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal server error" })),
        )
            .into_response()
    }
}

async fn get_entity_readings(
    State(state): State<ApiState>,
    Path(identifier): Path<String>,
) -> Result<Json<Vec<ReadingRow>>, ApiError> {
    let readings = state.store.get_readings(&identifier).await?;
    Ok(Json(readings))
}

async fn list_latest(State(state): State<ApiState>) -> Result<Json<Vec<ReadingRow>>, ApiError> {
    let rows = state.store.get_latest_per_vessel().await?;
    Ok(Json(rows))
}

async fn health(State(state): State<ApiState>) -> Response {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
                .into_response()
        }
    }
}
