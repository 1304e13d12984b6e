// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level HTTP client for the Bitloss backend.
//!
//! [`BackendClient`] owns request construction, headers and status handling.
//! It returns raw wire rows; normalization happens in [`crate::wire`].

use std::time::Duration;

use bitloss_core::BitlossError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CACHE_CONTROL, PRAGMA};
use reqwest::{Response, StatusCode};
use tracing::{debug, warn};

use crate::wire::{self, CommentBody, FeedRow, InteractBody, InteractRow, RevealRow};

/// Header carrying the viewer's display name on every request.
const USER_NAME_HEADER: &str = "x-user-name";

/// HTTP client for backend communication.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Creates a new backend client.
    ///
    /// # Arguments
    /// * `base_url` - Backend root, e.g. `http://127.0.0.1:8000`
    /// * `timeout` - Transport-level deadline applied to every request
    /// * `viewer_name` - Display name sent as `X-User-Name`
    pub fn new(base_url: &str, timeout: Duration, viewer_name: &str) -> Result<Self, BitlossError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_NAME_HEADER,
            HeaderValue::from_str(viewer_name).map_err(|e| {
                BitlossError::Config(format!("invalid display name header value: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| BitlossError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET /feed`, bypassing intermediate caches.
    pub async fn get_feed(&self) -> Result<Vec<FeedRow>, BitlossError> {
        let response = self
            .client
            .get(self.url("feed"))
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| BitlossError::PollFailed {
                message: format!("feed request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "feed response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BitlossError::poll(failure_message(status, &body)));
        }

        let rows: Vec<serde_json::Value> =
            response.json().await.map_err(|e| BitlossError::PollFailed {
                message: format!("failed to parse feed: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(wire::decode_feed(rows))
    }

    /// `POST /interact` with a bearer credential.
    pub async fn post_interact(
        &self,
        token: &str,
        body: &InteractBody<'_>,
    ) -> Result<InteractRow, BitlossError> {
        let response = self
            .client
            .post(self.url("interact"))
            .header(AUTHORIZATION, bearer(token)?)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let response = ensure_success(response, "interact").await?;
        response.json().await.map_err(|e| BitlossError::TransactionFailed {
            message: format!("failed to parse interact response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// `POST /comment` with a bearer credential. The body is not inspected.
    pub async fn post_comment(
        &self,
        token: &str,
        body: &CommentBody<'_>,
    ) -> Result<(), BitlossError> {
        let response = self
            .client
            .post(self.url("comment"))
            .header(AUTHORIZATION, bearer(token)?)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response, "comment").await.map(|_| ())
    }

    /// `GET /reveal/{id}`.
    pub async fn get_reveal(&self, artifact_id: &str) -> Result<RevealRow, BitlossError> {
        let response = self
            .client
            .get(self.url(&format!("reveal/{artifact_id}")))
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(transport_error)?;

        let response = ensure_success(response, "reveal").await?;
        response.json().await.map_err(|e| BitlossError::TransactionFailed {
            message: format!("failed to parse reveal response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// `GET /me`, returning the status code without reading the body.
    pub async fn get_me(&self) -> Result<StatusCode, BitlossError> {
        let response = self
            .client
            .get(self.url("me"))
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(transport_error)?;
        Ok(response.status())
    }
}

fn bearer(token: &str) -> Result<HeaderValue, BitlossError> {
    HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| BitlossError::Config(format!("invalid access token header value: {e}")))
}

fn transport_error(e: reqwest::Error) -> BitlossError {
    BitlossError::TransactionFailed {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Pass 2xx responses through; turn anything else into `TransactionFailed`
/// carrying the backend's `detail` verbatim when present.
async fn ensure_success(response: Response, call: &str) -> Result<Response, BitlossError> {
    let status = response.status();
    debug!(status = %status, call, "backend response received");
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, call, "backend rejected request");
    Err(BitlossError::transaction(failure_message(status, &body)))
}

fn failure_message(status: StatusCode, body: &str) -> String {
    wire::error_detail(body).unwrap_or_else(|| format!("backend returned {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitloss_core::ActionKind;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> BackendClient {
        BackendClient::new(base_url, Duration::from_secs(2), "trinity").unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = test_client("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/feed"), "http://localhost:8000/feed");
    }

    #[test]
    fn control_char_in_display_name_is_a_config_error() {
        let err = BackendClient::new("http://localhost", Duration::from_secs(1), "bad\nname")
            .unwrap_err();
        assert!(matches!(err, BitlossError::Config(_)));
    }

    #[tokio::test]
    async fn feed_request_bypasses_caches_and_names_viewer() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/feed"))
            .and(header("cache-control", "no-cache"))
            .and(header("pragma", "no-cache"))
            .and(header("x-user-name", "trinity"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = test_client(&server.uri()).get_feed().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn feed_server_error_is_poll_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).get_feed().await.unwrap_err();
        assert!(matches!(err, BitlossError::PollFailed { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn interact_sends_bearer_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/interact"))
            .and(header("authorization", "Bearer tok-1"))
            .and(body_json(serde_json::json!({"post_id": "x1", "action": "corrupt"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "new_integrity": 62.5,
                "remaining_credits": 30
            })))
            .expect(1)
            .mount(&server)
            .await;

        let row = test_client(&server.uri())
            .post_interact(
                "tok-1",
                &InteractBody {
                    post_id: "x1",
                    action: ActionKind::Corrupt,
                },
            )
            .await
            .unwrap();
        assert_eq!(row.new_integrity, 62.5);
        assert_eq!(row.remaining_credits, 30);
    }

    #[tokio::test]
    async fn rejection_detail_is_kept_verbatim() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/interact"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"detail": "Insufficient credits"})),
            )
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .post_interact(
                "tok-1",
                &InteractBody {
                    post_id: "x1",
                    action: ActionKind::Heal,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.user_detail(), "Insufficient credits");
    }

    #[tokio::test]
    async fn rejection_without_detail_names_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/comment"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .post_comment(
                "tok-1",
                &CommentBody {
                    post_id: "x1",
                    content: "hi",
                    parent_id: None,
                },
            )
            .await
            .unwrap_err();
        assert!(err.user_detail().contains("502"), "got {err}");
    }

    #[tokio::test]
    async fn unreachable_backend_is_transaction_failure() {
        // Nothing listens on port 9 in the test environment.
        let client = test_client("http://127.0.0.1:9");
        let err = client.get_reveal("x1").await.unwrap_err();
        assert!(matches!(err, BitlossError::TransactionFailed { .. }));
    }
}
