// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: a mounted feed over the HTTP backend against a local
//! mock server.

use std::sync::Arc;
use std::time::Duration;

use bitloss_client::HttpBackend;
use bitloss_config::model::BitlossConfig;
use bitloss_core::{ArtifactId, Notice};
use bitloss_engine::{Feed, FeedDeps, FeedSettings};
use bitloss_test_utils::{RecordingNotifier, StaticIdentity};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Viewer {
    server: MockServer,
    notifier: Arc<RecordingNotifier>,
    feed: Feed,
}

async fn mount_over(server: MockServer) -> Viewer {
    let mut config = BitlossConfig::default();
    config.backend.base_url = server.uri();
    config.identity.display_name = "neo".to_string();
    config.feed.poll_interval_ms = 50;

    let notifier = Arc::new(RecordingNotifier::new());
    let deps = FeedDeps {
        backend: Arc::new(HttpBackend::new(&config).unwrap()),
        identity: Arc::new(StaticIdentity::signed_in("e2e-token", "neo")),
        notifier: notifier.clone(),
    };
    let feed = Feed::mount(deps, FeedSettings::from_config(&config));

    let mut applied = feed.store().subscribe();
    tokio::time::timeout(Duration::from_secs(5), applied.wait_for(|seq| *seq > 0))
        .await
        .expect("first snapshot within 5s")
        .unwrap();

    Viewer {
        server,
        notifier,
        feed,
    }
}

async fn serve_feed(server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

#[tokio::test]
async fn snapshot_is_normalized_and_heal_applies_receipt() {
    let server = MockServer::start().await;
    serve_feed(
        &server,
        json!([{"id": 1, "storage_path": "active/1.jpg", "bitIntegrity": 140.0}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/interact"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"new_integrity": 100.0, "remaining_credits": 90})),
        )
        .mount(&server)
        .await;
    let viewer = mount_over(server).await;

    let artifact = viewer.feed.store().artifact(&ArtifactId::from("1")).await.unwrap();
    assert_eq!(artifact.integrity, 100.0);
    assert_eq!(artifact.username, "Anonymous");
    assert_eq!(artifact.image, "active/1.jpg");

    let receipt = viewer.feed.card(ArtifactId::from("1")).heal().await.unwrap();
    assert_eq!(receipt.remaining_credits, 90);
    assert_eq!(viewer.feed.store().credits().await, 90);

    let requests = viewer.server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| r.headers.get("x-user-name").map(|v| v.as_bytes()) == Some(b"neo".as_slice())));

    viewer.feed.unmount().await;
}

#[tokio::test]
async fn rejected_corrupt_leaves_state_and_notifies() {
    let server = MockServer::start().await;
    serve_feed(&server, json!([{"id": "x1", "bitIntegrity": 50.0}])).await;
    Mock::given(method("POST"))
        .and(path("/interact"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Insufficient credits"})),
        )
        .mount(&server)
        .await;
    let viewer = mount_over(server).await;

    let id = ArtifactId::from("x1");
    assert!(viewer.feed.card(id.clone()).corrupt().await.is_err());
    assert_eq!(viewer.feed.store().artifact(&id).await.unwrap().integrity, 50.0);
    match viewer.notifier.notices().as_slice() {
        [Notice::ActionFailed { detail, .. }] => assert!(detail.contains("Insufficient credits")),
        other => panic!("unexpected notices: {other:?}"),
    }

    viewer.feed.unmount().await;
}

#[tokio::test]
async fn unmount_stops_feed_requests() {
    let server = MockServer::start().await;
    serve_feed(&server, json!([])).await;
    let viewer = mount_over(server).await;

    viewer.feed.unmount().await;
    let before = viewer.server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let after = viewer.server.received_requests().await.unwrap().len();
    assert_eq!(before, after);
}
