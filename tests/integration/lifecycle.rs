//! Install, wait and activate across generations

use crate::support::{self, capture_logs, controller, deployment, get, FakeNetwork, StickyStorage};
use shellcache::cache::{CacheStorage, MemoryStorage};
use shellcache::controller::{
    ControlMessage, LifecycleState, MessageOutcome, Notification, RegisterOutcome, ResponseSource,
};
use shellcache::ShellcacheError;
use std::sync::Arc;

async fn body_of(controller: &shellcache::controller::CacheController, path: &str) -> String {
    controller
        .handle_fetch(&get(path))
        .await
        .unwrap()
        .served()
        .expect("request should be intercepted")
        .response
        .text()
}

#[tokio::test]
async fn first_install_activates_immediately() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let (controller, storage) = controller(&net);

    let outcome = controller.register(&deployment("v1")).await.unwrap();
    match outcome {
        RegisterOutcome::Activated { version, summary } => {
            assert_eq!(version, "v1");
            assert_eq!(summary.cached.len(), 7);
            assert!(summary.is_complete());
        }
        other => panic!("expected activation, got {:?}", other),
    }

    let states: Vec<LifecycleState> = controller
        .state_trace()
        .await
        .into_iter()
        .map(|c| c.state)
        .collect();
    assert_eq!(
        states,
        vec![
            LifecycleState::Installing,
            LifecycleState::Installed,
            LifecycleState::Activating,
            LifecycleState::Activated,
        ]
    );
    assert_eq!(storage.keys().await.unwrap(), vec!["diario-de-bordo-v1"]);
}

#[tokio::test]
async fn registering_the_same_version_is_a_no_op() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let (controller, _) = controller(&net);

    controller.register(&deployment("v1")).await.unwrap();
    let calls = net.calls();

    let outcome = controller.register(&deployment("v1")).await.unwrap();
    assert_eq!(
        outcome,
        RegisterOutcome::Unchanged {
            version: "v1".to_string()
        }
    );
    assert_eq!(net.calls(), calls);
}

#[tokio::test]
async fn old_generation_serves_until_new_one_activates() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let (controller, storage) = controller(&net);
    controller.register(&deployment("v1")).await.unwrap();
    let page = controller.connect_client().await;

    net.serve_shell("v2");
    net.pause();
    let installer = controller.clone();
    let install = tokio::spawn(async move { installer.register(&deployment("v2")).await });

    while controller.snapshot().await.installing.is_none() {
        tokio::task::yield_now().await;
    }
    assert!(body_of(&controller, "/style.css").await.contains("v1"));

    net.resume();
    let outcome = install.await.unwrap().unwrap();
    assert!(matches!(outcome, RegisterOutcome::Waiting { .. }));

    // Installed but waiting: the open page still gets v1.
    assert!(body_of(&controller, "/style.css").await.contains("v1"));
    assert_eq!(controller.active_version().await.as_deref(), Some("v1"));
    assert_eq!(storage.keys().await.unwrap().len(), 2);

    page.close().await.unwrap();

    assert_eq!(controller.active_version().await.as_deref(), Some("v2"));
    assert!(body_of(&controller, "/style.css").await.contains("v2"));
    assert_eq!(storage.keys().await.unwrap(), vec!["diario-de-bordo-v2"]);
}

#[tokio::test]
async fn failed_required_asset_keeps_previous_generation() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let (controller, storage) = controller(&net);
    controller.register(&deployment("v1")).await.unwrap();
    let mut notifications = controller.subscribe();

    net.serve_shell("v2");
    net.remove("/script.js");

    let err = controller.register(&deployment("v2")).await.unwrap_err();
    assert!(matches!(err, ShellcacheError::RequiredAsset { ref url, .. } if url.ends_with("/script.js")));

    assert_eq!(controller.active_version().await.as_deref(), Some("v1"));
    assert_eq!(storage.keys().await.unwrap(), vec!["diario-de-bordo-v1"]);
    assert!(body_of(&controller, "/style.css").await.contains("v1"));

    let trace = controller.state_trace().await;
    let last = trace.last().unwrap();
    assert_eq!(last.version, "v2");
    assert_eq!(last.state, LifecycleState::Redundant);

    assert!(matches!(
        notifications.try_recv().unwrap(),
        Notification::InstallFailed { ref version, .. } if version == "v2"
    ));
}

#[tokio::test]
async fn missing_icon_is_skipped_with_a_warning() {
    let (logs, _guard) = capture_logs();
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    net.remove("/icons/icon-512x512.png");
    let (controller, _) = controller(&net);

    let outcome = controller.register(&deployment("v1")).await.unwrap();
    let RegisterOutcome::Activated { summary, .. } = outcome else {
        panic!("expected activation");
    };
    assert_eq!(summary.cached.len(), 6);
    assert_eq!(summary.skipped.len(), 1);
    assert!(summary.skipped[0].url.ends_with("/icons/icon-512x512.png"));

    let logs = logs.contents();
    assert!(logs.contains("WARN"));
    assert!(logs.contains("icon-512x512.png"));

    let icon = controller
        .handle_fetch(&get("/icons/icon-192x192.png"))
        .await
        .unwrap();
    assert_eq!(icon.served().unwrap().source, ResponseSource::Cache);
}

#[tokio::test]
async fn skip_waiting_activates_waiting_generation() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let (controller, _) = controller(&net);
    controller.register(&deployment("v1")).await.unwrap();
    let mut page = controller.connect_client().await;
    assert_eq!(page.controller_version().await.as_deref(), Some("v1"));

    net.serve_shell("v2");
    let outcome = controller.register(&deployment("v2")).await.unwrap();
    assert!(matches!(outcome, RegisterOutcome::Waiting { .. }));

    let reply = page.post_message(ControlMessage::SkipWaiting).await.unwrap();
    assert_eq!(
        reply,
        MessageOutcome::SkipWaiting {
            activated: Some("v2".to_string())
        }
    );

    let v2_states: Vec<LifecycleState> = controller
        .state_trace()
        .await
        .into_iter()
        .filter(|c| c.version == "v2")
        .map(|c| c.state)
        .collect();
    assert_eq!(
        v2_states,
        vec![
            LifecycleState::Installing,
            LifecycleState::Installed,
            LifecycleState::Activating,
            LifecycleState::Activated,
        ]
    );
    assert_eq!(page.controller_version().await.as_deref(), Some("v2"));

    let received = page.drain();
    assert!(received
        .iter()
        .any(|n| matches!(n, Notification::UpdateAvailable { version } if version == "v2")));
    assert!(received
        .iter()
        .any(|n| matches!(n, Notification::ControllerChanged { version } if version == "v2")));
}

#[tokio::test]
async fn skip_waiting_with_nothing_waiting_is_harmless() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let (controller, _) = controller(&net);
    controller.register(&deployment("v1")).await.unwrap();

    assert_eq!(controller.skip_waiting().await.unwrap(), None);
    assert_eq!(controller.active_version().await.as_deref(), Some("v1"));
}

#[tokio::test]
async fn skip_waiting_on_install_ignores_open_clients() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let storage = Arc::new(MemoryStorage::new());
    let controller = support::controller_with(
        support::settings().with_skip_waiting_on_install(true),
        storage,
        &net,
    );
    controller.register(&deployment("v1")).await.unwrap();
    let _page = controller.connect_client().await;

    net.serve_shell("v2");
    let outcome = controller.register(&deployment("v2")).await.unwrap();
    assert!(matches!(outcome, RegisterOutcome::Activated { .. }));
    assert_eq!(controller.active_version().await.as_deref(), Some("v2"));
}

#[tokio::test]
async fn newer_deploy_supersedes_waiting_generation() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let (controller, storage) = controller(&net);
    controller.register(&deployment("v1")).await.unwrap();
    let page = controller.connect_client().await;

    net.serve_shell("v2");
    controller.register(&deployment("v2")).await.unwrap();
    net.serve_shell("v3");
    controller.register(&deployment("v3")).await.unwrap();

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.waiting.unwrap().version, "v3");

    page.close().await.unwrap();
    assert_eq!(controller.active_version().await.as_deref(), Some("v3"));
    assert_eq!(storage.keys().await.unwrap(), vec!["diario-de-bordo-v3"]);
}

#[tokio::test]
async fn activation_deletes_every_other_cache() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let storage = Arc::new(MemoryStorage::new());
    storage.open("diario-de-bordo-v0").await.unwrap();
    storage.open("unrelated-cache").await.unwrap();
    let controller = support::controller_with(support::settings(), storage.clone(), &net);

    controller.register(&deployment("v1")).await.unwrap();
    assert_eq!(storage.keys().await.unwrap(), vec!["diario-de-bordo-v1"]);
}

#[tokio::test]
async fn restore_adopts_existing_generation_without_fetching() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let storage = Arc::new(MemoryStorage::new());
    let first = support::controller_with(support::settings(), storage.clone(), &net);
    first.register(&deployment("v1")).await.unwrap();

    let calls = net.calls();
    let second = support::controller_with(support::settings(), storage, &net);
    assert!(second.restore("v1").await.unwrap());
    assert!(!second.restore("v9").await.unwrap());
    assert_eq!(second.active_version().await.as_deref(), Some("v1"));

    let outcome = second.register(&deployment("v1")).await.unwrap();
    assert!(matches!(outcome, RegisterOutcome::Unchanged { .. }));
    assert!(body_of(&second, "/script.js").await.contains("v1"));
    assert_eq!(net.calls(), calls);
}

#[tokio::test]
async fn dropped_page_does_not_block_next_deploy() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let (controller, _) = controller(&net);
    controller.register(&deployment("v1")).await.unwrap();
    let page = controller.connect_client().await;
    drop(page);
    assert_eq!(controller.snapshot().await.clients, 0);

    net.serve_shell("v2");
    let outcome = controller.register(&deployment("v2")).await.unwrap();
    assert!(matches!(outcome, RegisterOutcome::Activated { .. }));
    assert_eq!(controller.active_version().await.as_deref(), Some("v2"));
}

#[tokio::test]
async fn dropping_last_page_activates_waiting_generation() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let (controller, _) = controller(&net);
    controller.register(&deployment("v1")).await.unwrap();
    let page = controller.connect_client().await;

    net.serve_shell("v2");
    let outcome = controller.register(&deployment("v2")).await.unwrap();
    assert!(matches!(outcome, RegisterOutcome::Waiting { .. }));

    drop(page);
    for _ in 0..100 {
        if controller.active_version().await.as_deref() == Some("v2") {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(controller.active_version().await.as_deref(), Some("v2"));
    assert!(controller.snapshot().await.waiting.is_none());
}

#[tokio::test]
async fn skip_waiting_during_install_activates_on_completion() {
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let (controller, _) = controller(&net);
    controller.register(&deployment("v1")).await.unwrap();
    let page = controller.connect_client().await;

    net.serve_shell("v2");
    net.pause();
    let installer = controller.clone();
    let install = tokio::spawn(async move { installer.register(&deployment("v2")).await });
    while controller.snapshot().await.installing.is_none() {
        tokio::task::yield_now().await;
    }

    let skipper = controller.clone();
    let skip = tokio::spawn(async move { skipper.handle_message(ControlMessage::SkipWaiting).await });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    net.resume();

    let outcome = install.await.unwrap().unwrap();
    assert!(matches!(outcome, RegisterOutcome::Activated { ref version, .. } if version == "v2"));
    assert!(skip.await.unwrap().is_ok());
    assert_eq!(page.controller_version().await.as_deref(), Some("v2"));

    // The request was used up: the next deploy waits for the open page again.
    net.serve_shell("v3");
    let outcome = controller.register(&deployment("v3")).await.unwrap();
    assert!(matches!(outcome, RegisterOutcome::Waiting { .. }));
}

#[tokio::test]
async fn stale_cache_delete_failure_does_not_block_activation() {
    let (logs, _guard) = capture_logs();
    let net = FakeNetwork::new();
    net.serve_shell("v1");
    let storage = Arc::new(StickyStorage::default());
    storage.open("diario-de-bordo-v0").await.unwrap();
    let controller = support::controller_with(support::settings(), storage.clone(), &net);

    let outcome = controller.register(&deployment("v1")).await.unwrap();
    assert!(matches!(outcome, RegisterOutcome::Activated { .. }));
    assert_eq!(controller.active_version().await.as_deref(), Some("v1"));
    assert_eq!(
        storage.keys().await.unwrap(),
        vec!["diario-de-bordo-v0", "diario-de-bordo-v1"]
    );
    assert!(logs.contents().contains("diario-de-bordo-v0"));
    assert!(body_of(&controller, "/style.css").await.contains("v1"));
}
