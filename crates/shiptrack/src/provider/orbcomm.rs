// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP client for the ORBCOMM vessel tracking API.
//!
//! - `GET {base}/vessels/{mmsi}?api_key=...` returns one vessel report.
//! - `POST {base}/vessel-list?api_key=...` with `{"mmsi_list": [...]}` replaces
//!   the tracked list.
//!
//! Only `200 OK` counts as success for either call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use super::traits::*;
use crate::model::VesselReport;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct VesselListRequest<'a> {
    mmsi_list: &'a [String],
}

/// ORBCOMM API client.
#[derive(Debug, Clone)]
pub struct OrbcommClient {
    base_url: Url,
    api_key: String,
    http: reqwest::Client,
}

impl OrbcommClient {
    /// Create a client with the default 30 second request timeout.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    ///
    /// The timeout bounds the whole request including the body, so one stalled
    /// vessel cannot hold up the rest of a cycle.
    pub fn with_timeout(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ProviderError::Unavailable(format!("invalid base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::Unavailable(format!(
                "base URL cannot carry a path: {}",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            http,
        })
    }

    /// Build an endpoint URL below the base URL, with the API key attached.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ProviderError::Unavailable("base URL cannot carry a path".into()))?;
            path.pop_if_empty().extend(segments);
        }
        url.query_pairs_mut().append_pair("api_key", &self.api_key);
        Ok(url)
    }
}

// reqwest errors embed the request URL, which carries the API key.
fn transport_error(e: reqwest::Error) -> ProviderError {
    ProviderError::Unavailable(e.without_url().to_string())
}

#[async_trait]
impl TelemetryProvider for OrbcommClient {
    fn provider_type(&self) -> &'static str {
        "orbcomm"
    }

    async fn fetch_report(&self, mmsi: &str) -> Result<VesselReport> {
        let url = self.endpoint(&["vessels", mmsi])?;

        let response = self.http.get(url).send().await.map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport_error)?;
        let report: VesselReport = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        if report.mmsi != mmsi {
            return Err(ProviderError::MalformedResponse(format!(
                "requested vessel {} but response describes {}",
                mmsi, report.mmsi
            )));
        }

        debug!(mmsi = %mmsi, "Fetched vessel report");
        Ok(report)
    }

    async fn replace_tracked_list(&self, mmsi_list: &[String]) -> Result<()> {
        let url = self.endpoint(&["vessel-list"])?;

        let response = self
            .http
            .post(url)
            .json(&VesselListRequest { mmsi_list })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
            });
        }

        debug!(count = mmsi_list.len(), "Replaced provider vessel list");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn vessel_json(mmsi: &str) -> serde_json::Value {
        serde_json::json!({
            "mmsi": mmsi,
            "name": "Test Ship",
            "latitude": 40.7128,
            "longitude": -74.0060,
            "speed": 10.5,
            "heading": 180,
            "timestamp": "2023-05-20T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_fetch_report_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vessels/123456789"))
            .and(query_param("api_key", "test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vessel_json("123456789")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OrbcommClient::new(&mock_server.uri(), "test-api-key").unwrap();
        let report = client.fetch_report("123456789").await.unwrap();

        assert_eq!(report.mmsi, "123456789");
        assert_eq!(report.name, "Test Ship");
        assert_eq!(report.latitude, 40.7128);
        assert_eq!(report.longitude, -74.0060);
        assert_eq!(report.speed, 10.5);
        assert_eq!(report.heading, 180.0);
        assert_eq!(report.timestamp.to_rfc3339(), "2023-05-20T12:00:00+00:00");
    }

    #[tokio::test]
    async fn test_fetch_report_keeps_base_path() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/vessels/111"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vessel_json("111")))
            .mount(&mock_server)
            .await;

        let base = format!("{}/api/v2/", mock_server.uri());
        let client = OrbcommClient::new(&base, "k").unwrap();
        assert!(client.fetch_report("111").await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_report_non_200_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vessels/222"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = OrbcommClient::new(&mock_server.uri(), "k").unwrap();
        let err = client.fetch_report("222").await.unwrap_err();
        assert_eq!(err, ProviderError::Rejected { status: 404 });
    }

    #[tokio::test]
    async fn test_fetch_report_non_ok_success_status_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vessels/333"))
            .respond_with(ResponseTemplate::new(202).set_body_json(vessel_json("333")))
            .mount(&mock_server)
            .await;

        let client = OrbcommClient::new(&mock_server.uri(), "k").unwrap();
        let err = client.fetch_report("333").await.unwrap_err();
        assert_eq!(err, ProviderError::Rejected { status: 202 });
    }

    #[tokio::test]
    async fn test_fetch_report_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vessels/444"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"mmsi\": \"444\""))
            .mount(&mock_server)
            .await;

        let client = OrbcommClient::new(&mock_server.uri(), "k").unwrap();
        let err = client.fetch_report("444").await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_fetch_report_mismatched_mmsi_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vessels/555"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vessel_json("999")))
            .mount(&mock_server)
            .await;

        let client = OrbcommClient::new(&mock_server.uri(), "k").unwrap();
        let err = client.fetch_report("555").await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_fetch_report_unreachable_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OrbcommClient::new(&format!("http://{}", addr), "secret-key").unwrap();
        let err = client.fetch_report("111").await.unwrap_err();
        match err {
            ProviderError::Unavailable(message) => {
                assert!(!message.contains("secret-key"), "API key leaked: {message}");
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_report_timeout_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vessels/111"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(vessel_json("111"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client =
            OrbcommClient::with_timeout(&mock_server.uri(), "k", Duration::from_millis(50))
                .unwrap();
        let err = client.fetch_report("111").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_replace_tracked_list_posts_full_list() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/vessel-list"))
            .and(query_param("api_key", "test-api-key"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(serde_json::json!({
                "mmsi_list": ["123456789", "987654321"]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OrbcommClient::new(&mock_server.uri(), "test-api-key").unwrap();
        client
            .replace_tracked_list(&["123456789".to_string(), "987654321".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_replace_tracked_list_empty_list_is_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/vessel-list"))
            .and(body_json(serde_json::json!({ "mmsi_list": [] })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OrbcommClient::new(&mock_server.uri(), "k").unwrap();
        client.replace_tracked_list(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_tracked_list_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/vessel-list"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = OrbcommClient::new(&mock_server.uri(), "k").unwrap();
        let err = client
            .replace_tracked_list(&["111".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::Rejected { status: 500 });
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(OrbcommClient::new("not a url", "k").is_err());
        assert!(OrbcommClient::new("mailto:ops@example.com", "k").is_err());
    }
}
