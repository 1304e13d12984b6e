// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP backend adapter for the Bitloss client engine.
//!
//! Implements [`FeedBackend`] over the backend's JSON endpoints:
//! `GET /feed`, `POST /interact`, `POST /comment`, `GET /reveal/{id}` and
//! `GET /me`.

pub mod client;
pub mod wire;

use async_trait::async_trait;
use bitloss_config::model::BitlossConfig;
use bitloss_core::{
    ActionKind, ArtifactId, BitlossError, CommentDraft, FeedBackend, FeedSnapshot, HealthStatus,
    InteractReceipt, Reveal, ViewerSession,
};
use tracing::debug;

pub use client::BackendClient;

use crate::wire::{CommentBody, InteractBody};

/// [`FeedBackend`] implementation over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: BackendClient,
}

impl HttpBackend {
    /// Creates a backend from the `[backend]` and `[identity]` config sections.
    pub fn new(config: &BitlossConfig) -> Result<Self, BitlossError> {
        let client = BackendClient::new(
            &config.backend.base_url,
            config.backend.request_timeout(),
            &config.identity.display_name,
        )?;
        Ok(Self { client })
    }

    /// Wraps an already-built client.
    pub fn from_client(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_feed(&self) -> Result<FeedSnapshot, BitlossError> {
        let rows = self.client.get_feed().await?;
        let artifacts = rows.into_iter().map(wire::FeedRow::into_artifact).collect::<Vec<_>>();
        debug!(count = artifacts.len(), "feed snapshot normalized");
        Ok(FeedSnapshot { artifacts })
    }

    async fn interact(
        &self,
        session: &ViewerSession,
        artifact_id: &ArtifactId,
        action: ActionKind,
    ) -> Result<InteractReceipt, BitlossError> {
        let body = InteractBody {
            post_id: artifact_id.as_str(),
            action,
        };
        let row = self
            .client
            .post_interact(&session.access_token, &body)
            .await?;
        Ok(row.into_receipt())
    }

    async fn post_comment(
        &self,
        session: &ViewerSession,
        draft: &CommentDraft,
    ) -> Result<(), BitlossError> {
        self.client
            .post_comment(&session.access_token, &CommentBody::from(draft))
            .await
    }

    async fn reveal(&self, artifact_id: &ArtifactId) -> Result<Reveal, BitlossError> {
        let row = self.client.get_reveal(artifact_id.as_str()).await?;
        let message = row.message.unwrap_or_else(|| "UNKNOWN_ERROR".to_string());
        match row.status.as_str() {
            "success" => Ok(Reveal::Secret(message)),
            "dead" => Ok(Reveal::Dead(message)),
            _ => Err(BitlossError::transaction(message)),
        }
    }

    async fn ping(&self) -> Result<HealthStatus, BitlossError> {
        let status = self.client.get_me().await?;
        if status.is_success() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(format!("/me returned {status}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(uri: &str) -> HttpBackend {
        HttpBackend::from_client(BackendClient::new(uri, Duration::from_secs(2), "neo").unwrap())
    }

    fn session() -> ViewerSession {
        ViewerSession {
            access_token: "tok-1".into(),
            display_name: "neo".into(),
        }
    }

    #[test]
    fn builds_from_default_config() {
        let backend = HttpBackend::new(&BitlossConfig::default()).unwrap();
        assert_eq!(backend.name(), "http");
    }

    #[tokio::test]
    async fn fetch_feed_normalizes_rows() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": 1,
                    "username": "neo",
                    "storage_path": "active/1.jpg",
                    "bitIntegrity": 91.5,
                    "generations": 4,
                    "has_secret": true,
                    "comments": [
                        {"id": 10, "username": "a", "content": "root", "parent_id": null},
                        {"id": 11, "username": "b", "content": "reply", "parent_id": 10}
                    ]
                },
                {"id": "2", "caption": "no integrity"}
            ])))
            .mount(&server)
            .await;

        let snapshot = backend(&server.uri()).fetch_feed().await.unwrap();
        assert_eq!(snapshot.artifacts.len(), 2);

        let first = &snapshot.artifacts[0];
        assert_eq!(first.id, ArtifactId::from("1"));
        assert_eq!(first.image, "active/1.jpg");
        assert_eq!(first.integrity, 91.5);
        assert!(first.has_secret);
        assert_eq!(first.comments.len(), 2);
        assert_eq!(first.comments[1].parent_id.as_ref().unwrap().as_str(), "10");

        let second = &snapshot.artifacts[1];
        assert_eq!(second.integrity, 100.0);
        assert_eq!(second.caption, "no integrity");
    }

    #[tokio::test]
    async fn one_bad_row_does_not_fail_the_poll() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "a", "bitIntegrity": 90},
                {"id": "b", "generations": -1},
                {"username": "no id"}
            ])))
            .mount(&server)
            .await;

        let snapshot = backend(&server.uri()).fetch_feed().await.unwrap();
        let ids: Vec<&str> = snapshot.artifacts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(snapshot.artifacts[1].generations, 0);
    }

    #[tokio::test]
    async fn interact_returns_receipt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/interact"))
            .and(body_json(serde_json::json!({"post_id": "7", "action": "heal"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "new_integrity": 100.0,
                "remaining_credits": 90
            })))
            .mount(&server)
            .await;

        let receipt = backend(&server.uri())
            .interact(&session(), &ArtifactId::from("7"), ActionKind::Heal)
            .await
            .unwrap();
        assert_eq!(receipt.new_integrity, 100.0);
        assert_eq!(receipt.remaining_credits, 90);
    }

    #[tokio::test]
    async fn post_comment_carries_parent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/comment"))
            .and(body_json(serde_json::json!({
                "post_id": "7",
                "content": "nested",
                "parent_id": "10"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let draft = CommentDraft {
            artifact_id: ArtifactId::from("7"),
            content: "nested".into(),
            parent_id: Some("10".into()),
        };
        backend(&server.uri())
            .post_comment(&session(), &draft)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reveal_maps_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/reveal/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"status": "success", "message": "the cake is a lie"}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/reveal/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"status": "dead", "message": "DATA_CORRUPTED"}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/reveal/3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "error"})),
            )
            .mount(&server)
            .await;

        let backend = backend(&server.uri());
        assert_eq!(
            backend.reveal(&ArtifactId::from("1")).await.unwrap(),
            Reveal::Secret("the cake is a lie".into())
        );
        assert_eq!(
            backend.reveal(&ArtifactId::from("2")).await.unwrap(),
            Reveal::Dead("DATA_CORRUPTED".into())
        );
        let err = backend.reveal(&ArtifactId::from("3")).await.unwrap_err();
        assert_eq!(err.user_detail(), "UNKNOWN_ERROR");
    }

    #[tokio::test]
    async fn ping_reports_degraded_on_non_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let status = backend(&server.uri()).ping().await.unwrap();
        assert!(matches!(status, HealthStatus::Degraded(_)));
    }
}
