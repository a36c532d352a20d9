use std::time::Duration;

use crate::support::{
    helpers::{init_tracing, wait_until, ActivityEvent, RecordingActivity},
    mock_server::{MockAttributionServer, MockReply},
};
use anyhow::Result;
use attribution_poller::{
    Attribution, AttributionCoordinator, AttributionRequestDescriptor, CoordinatorConfig,
    CoordinatorParams,
};
use serde_json::json;
use tokio::time::sleep;

fn descriptor() -> AttributionRequestDescriptor {
    AttributionRequestDescriptor::new("attribution", "rust4.0.0")
        .with_parameter("app_token", "qwerty123456")
        .with_parameter("environment", "sandbox")
}

fn config_for(server: &MockAttributionServer) -> Result<CoordinatorConfig> {
    CoordinatorConfig::builder()
        .base_url(server.url())
        .request_timeout(Duration::from_secs(5))
        .build()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn follows_ask_in_until_attribution_arrives() -> Result<()> {
    init_tracing();
    let server = MockAttributionServer::start(vec![
        MockReply::json(json!({ "ask_in": 200 })),
        MockReply::json(json!({
            "attribution": {
                "tracker_token": "abc123",
                "network": "X",
                "campaign": "spring"
            }
        })),
    ])
    .await?;
    let activity = RecordingActivity::new();
    let coordinator = AttributionCoordinator::new(
        config_for(&server)?,
        CoordinatorParams::new(activity.clone(), descriptor(), true, true),
    );

    coordinator.request_lookup();
    wait_until("attribution delivery", Duration::from_secs(5), || {
        activity.deliveries() == 1
    })
    .await?;

    assert_eq!(
        activity.events(),
        vec![
            ActivityEvent::Asking(true),
            ActivityEvent::Asking(false),
            ActivityEvent::AttributionTasks(Some(Attribution {
                tracker_token: Some("abc123".into()),
                network: Some("X".into()),
                campaign: Some("spring".into()),
                ..Attribution::default()
            })),
        ]
    );
    assert_eq!(server.request_count(), 2);

    let last_url = coordinator
        .last_request_url()
        .await
        .expect("last url should be recorded");
    assert_eq!(last_url.path(), "/attribution");
    assert!(last_url.query_pairs().any(|(name, _)| name == "sent_at"));

    let telemetry = coordinator.telemetry();
    assert_eq!(telemetry.lookups_issued, 2);
    assert_eq!(telemetry.reschedules, 1);
    assert_eq!(telemetry.deliveries, 1);

    coordinator.shutdown().await;
    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn paused_coordinator_never_reaches_server() -> Result<()> {
    init_tracing();
    let server = MockAttributionServer::start(vec![]).await?;
    let activity = RecordingActivity::new();
    let coordinator = AttributionCoordinator::new(
        config_for(&server)?,
        CoordinatorParams::new(activity.clone(), descriptor(), false, true),
    );

    coordinator.request_lookup();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(server.request_count(), 0);
    assert_eq!(coordinator.telemetry().paused_fires, 1);

    coordinator.resume();
    coordinator.request_lookup();
    wait_until("lookup after resume", Duration::from_secs(5), || {
        server.request_count() == 1
    })
    .await?;
    wait_until("empty delivery", Duration::from_secs(5), || {
        activity.deliveries() == 1
    })
    .await?;
    assert_eq!(
        activity.events().last(),
        Some(&ActivityEvent::AttributionTasks(None))
    );

    coordinator.shutdown().await;
    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unreachable_server_ends_cycle_quietly() -> Result<()> {
    init_tracing();
    let server = MockAttributionServer::start(vec![]).await?;
    let config = config_for(&server)?;
    server.shutdown().await;

    let activity = RecordingActivity::new();
    let coordinator = AttributionCoordinator::new(
        config,
        CoordinatorParams::new(activity.clone(), descriptor(), true, true),
    );

    coordinator.request_lookup();
    wait_until("lookup failure", Duration::from_secs(10), || {
        coordinator.telemetry().lookup_failures == 1
    })
    .await?;

    sleep(Duration::from_millis(200)).await;
    let telemetry = coordinator.telemetry();
    assert_eq!(telemetry.lookups_issued, 1, "failures are not retried");
    assert!(activity.events().is_empty());
    assert_eq!(coordinator.last_request_url().await, None);

    coordinator.shutdown().await;
    Ok(())
}
