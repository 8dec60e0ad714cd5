//! Fetch strategies against the active generation

use crate::support::{self, controller, deployment, get, navigate, FakeNetwork};
use shellcache::cache::{CacheStorage, DiskStorage, MemoryStorage};
use shellcache::controller::{
    CacheController, ControlMessage, FetchResponse, MessageOutcome, Notification, ResponseSource,
    Served, Strategy,
};
use shellcache::http::{Method, Request, Response, OFFLINE_STATUS};
use shellcache::ShellcacheError;
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;

async fn installed(net: &Arc<FakeNetwork>) -> CacheController {
    net.serve_shell("v1");
    let (controller, _) = controller(net);
    controller.register(&deployment("v1")).await.unwrap();
    controller
}

async fn serve(controller: &CacheController, request: &Request) -> Served {
    match controller.handle_fetch(request).await.unwrap() {
        FetchResponse::Respond(served) => served,
        FetchResponse::Passthrough => panic!("{} was not intercepted", request.url),
    }
}

#[tokio::test]
async fn cache_hit_never_touches_network() {
    let net = FakeNetwork::new();
    let controller = installed(&net).await;
    let calls = net.calls();

    let served = serve(&controller, &get("/style.css")).await;
    assert_eq!(served.source, ResponseSource::Cache);
    assert_eq!(served.strategy, Strategy::CacheFirst);
    assert_eq!(net.calls(), calls);
}

#[tokio::test]
async fn cache_miss_is_fetched_and_stored() {
    let net = FakeNetwork::new();
    let controller = installed(&net).await;
    net.serve("/icons/badge.png", vec![1u8, 2, 3]);

    let first = serve(&controller, &get("/icons/badge.png")).await;
    assert_eq!(first.source, ResponseSource::Network);

    let second = serve(&controller, &get("/icons/badge.png")).await;
    assert_eq!(second.source, ResponseSource::Cache);
    assert_eq!(second.response.body, vec![1u8, 2, 3]);
    assert_eq!(net.calls_for("/icons/badge.png"), 1);
}

#[tokio::test]
async fn error_responses_are_returned_but_not_stored() {
    let net = FakeNetwork::new();
    let controller = installed(&net).await;

    for _ in 0..2 {
        let served = serve(&controller, &get("/missing.png")).await;
        assert_eq!(served.response.status, 404);
        assert_eq!(served.source, ResponseSource::Network);
    }
    assert_eq!(net.calls_for("/missing.png"), 2);
}

#[tokio::test]
async fn network_first_refreshes_documents() {
    let net = FakeNetwork::new();
    let controller = installed(&net).await;

    net.serve("/index.html", "<html>fresh</html>");
    let served = serve(&controller, &navigate("/index.html")).await;
    assert_eq!(served.strategy, Strategy::NetworkFirst);
    assert_eq!(served.source, ResponseSource::Network);
    assert_eq!(served.response.text(), "<html>fresh</html>");

    net.set_online(false);
    let served = serve(&controller, &navigate("/index.html")).await;
    assert_eq!(served.source, ResponseSource::Cache);
    assert_eq!(served.response.text(), "<html>fresh</html>");
}

#[tokio::test]
async fn offline_navigation_gets_root_document() {
    let net = FakeNetwork::new();
    let controller = installed(&net).await;
    net.set_online(false);

    let served = serve(&controller, &navigate("/entries/2024-05-01")).await;
    assert_eq!(served.source, ResponseSource::OfflineDocument);
    assert_eq!(served.response.status, 200);
    assert!(served.response.text().contains("Diario v1"));
}

#[tokio::test]
async fn offline_network_first_miss_is_synthetic() {
    let net = FakeNetwork::new();
    let controller = installed(&net).await;
    net.set_online(false);

    let served = serve(&controller, &get("/api/entries.json")).await;
    assert_eq!(served.strategy, Strategy::NetworkFirst);
    assert_eq!(served.source, ResponseSource::Offline);
    assert_eq!(served.response.status, OFFLINE_STATUS);
    assert!(!served.response.is_ok());
    assert!(!served.response.body.is_empty());
}

#[tokio::test]
async fn offline_document_without_accept_header_is_synthetic() {
    let net = FakeNetwork::new();
    let controller = installed(&net).await;
    net.set_online(false);

    let served = serve(&controller, &get("/about.html")).await;
    assert_eq!(served.strategy, Strategy::NetworkFirst);
    assert_eq!(served.source, ResponseSource::Offline);
    assert_eq!(served.response.status, OFFLINE_STATUS);
    assert!(!served.response.is_ok());
}

#[tokio::test]
async fn offline_cache_first_miss_fails_for_subresources() {
    let net = FakeNetwork::new();
    let controller = installed(&net).await;
    net.set_online(false);

    let err = controller
        .handle_fetch(&get("/icons/unknown.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, ShellcacheError::Network { .. }));
}

#[tokio::test]
async fn connectivity_changes_are_broadcast() {
    let net = FakeNetwork::new();
    let controller = installed(&net).await;
    let mut page = controller.connect_client().await;

    net.set_online(false);
    serve(&controller, &navigate("/")).await;
    assert!(!controller.is_online());

    net.set_online(true);
    serve(&controller, &navigate("/")).await;

    let received = page.drain();
    assert_eq!(
        received,
        vec![
            Notification::Connectivity { online: false },
            Notification::Connectivity { online: true },
        ]
    );
}

#[tokio::test]
async fn uninterceptable_requests_pass_through() {
    let net = FakeNetwork::new();
    let (idle, _) = controller(&net);
    assert_eq!(
        idle.handle_fetch(&get("/style.css")).await.unwrap(),
        FetchResponse::Passthrough
    );

    let controller = installed(&net).await;
    let post = Request::new(Method::Post, Url::parse("https://journal.test/api/entries").unwrap());
    assert_eq!(
        controller.handle_fetch(&post).await.unwrap(),
        FetchResponse::Passthrough
    );

    let cross_origin = Request::parse_get("https://fonts.test/roboto.woff2").unwrap();
    assert_eq!(
        controller.handle_fetch(&cross_origin).await.unwrap(),
        FetchResponse::Passthrough
    );
}

#[tokio::test]
async fn binary_bodies_survive_disk_round_trip() {
    let temp = TempDir::new().unwrap();
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    net.route(
        "/icons/icon-192x192.png",
        Response::new(200, bytes.clone()).with_header("Content-Type", "image/png"),
    );

    let storage = Arc::new(DiskStorage::new(temp.path().join("caches")));
    let controller = support::controller_with(support::settings(), storage, &net);
    controller.register(&deployment("v1")).await.unwrap();

    net.set_online(false);
    let served = serve(&controller, &get("/icons/icon-192x192.png")).await;
    assert_eq!(served.source, ResponseSource::Cache);
    assert_eq!(served.response.body, bytes);
    assert_eq!(served.response.content_type(), Some("image/png"));
}

#[tokio::test]
async fn cache_write_failure_still_returns_response() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let storage = Arc::new(MemoryStorage::with_quota(1024));
    let controller = support::controller_with(support::settings(), storage.clone(), &net);
    controller.register(&deployment("v1")).await.unwrap();

    net.serve("/photo.png", vec![7u8; 4096]);
    let served = serve(&controller, &get("/photo.png")).await;
    assert_eq!(served.source, ResponseSource::Network);
    assert_eq!(served.response.body.len(), 4096);

    let cached = storage
        .match_request("diario-de-bordo-v1", &get("/photo.png"))
        .await
        .unwrap();
    assert!(cached.is_none());
}

#[tokio::test]
async fn precache_message_extends_active_generation() {
    let net = FakeNetwork::new();
    let controller = installed(&net).await;
    net.serve("/entries/photo.png", vec![9u8; 16]);
    let page = controller.connect_client().await;

    let reply = page
        .post_message(ControlMessage::Precache {
            urls: vec![
                "entries/photo.png".to_string(),
                "https://elsewhere.test/tracker.png".to_string(),
            ],
        })
        .await
        .unwrap();
    let MessageOutcome::Precached(summary) = reply else {
        panic!("expected precache summary");
    };
    assert_eq!(summary.cache_name, "diario-de-bordo-v1");
    assert_eq!(summary.cached.len(), 1);
    assert_eq!(summary.skipped.len(), 1);

    net.set_online(false);
    let served = serve(&controller, &get("/entries/photo.png")).await;
    assert_eq!(served.source, ResponseSource::Cache);
}

#[tokio::test]
async fn precache_without_active_generation_fails() {
    let net = FakeNetwork::new();
    let (controller, _) = controller(&net);
    let err = controller
        .precache(&["style.css".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, ShellcacheError::NoActiveGeneration));
}
