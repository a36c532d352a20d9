use std::time::Duration;

use crate::support::{
    helpers::init_tracing,
    mock_server::{MockAttributionServer, MockReply},
};
use anyhow::Result;
use attribution_poller::{
    classify, AttributionRequestDescriptor, AttributionTransport, Classification,
    CoordinatorConfig, HttpTransport, ResponseEnvelope, ResponseKind, TransportError,
};
use chrono::Utc;
use serde_json::json;

fn descriptor() -> AttributionRequestDescriptor {
    AttributionRequestDescriptor::new("attribution", "rust4.0.0")
        .with_parameter("app_token", "qwerty123456")
        .with_parameter("gps_adid", "00000000-0000-0000-0000-000000000000")
}

fn transport_for(server: &MockAttributionServer) -> Result<(HttpTransport, CoordinatorConfig)> {
    let config = CoordinatorConfig::builder()
        .base_url(server.url())
        .request_timeout(Duration::from_secs(5))
        .build()?;
    Ok((HttpTransport::from_config(&config)?, config))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn get_parses_json_reply_and_sends_client_sdk() -> Result<()> {
    init_tracing();
    let server = MockAttributionServer::start(vec![MockReply::json(json!({
        "ask_in": 1500,
        "message": "Attribution pending",
        "adid": "adid-1"
    }))])
    .await?;
    let (transport, config) = transport_for(&server)?;

    let request = descriptor().to_request(config.base_url(), Utc::now())?;
    let mut envelope = transport.perform_get(&request).await?;

    assert_eq!(envelope.kind(), ResponseKind::Attribution);
    assert_eq!(envelope.data().status_code, Some(200));
    assert_eq!(envelope.data().message.as_deref(), Some("Attribution pending"));
    assert_eq!(envelope.data().adid.as_deref(), Some("adid-1"));
    assert_eq!(
        classify(envelope.data_mut()),
        Classification::AskIn(Duration::from_millis(1500))
    );

    let recorded = server.requests();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].method, "GET");
    assert_eq!(recorded[0].path, "/attribution");
    assert_eq!(recorded[0].client_sdk.as_deref(), Some("rust4.0.0"));
    assert_eq!(
        recorded[0].query_names(),
        vec!["app_token", "gps_adid", "sent_at"]
    );
    assert_eq!(recorded[0].query_value("app_token"), Some("qwerty123456"));

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn error_status_still_parses_body() -> Result<()> {
    init_tracing();
    let server = MockAttributionServer::start(vec![MockReply::with_status(
        400,
        json!({ "message": "App token not found" }).to_string(),
    )])
    .await?;
    let (transport, config) = transport_for(&server)?;

    let request = descriptor().to_request(config.base_url(), Utc::now())?;
    let envelope = transport.perform_get(&request).await?;

    let data = envelope.data();
    assert_eq!(data.status_code, Some(400));
    assert!(!data.is_success());
    assert_eq!(data.message.as_deref(), Some("App token not found"));
    assert!(data.json.is_some());

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_body_yields_envelope_without_json() -> Result<()> {
    init_tracing();
    let server =
        MockAttributionServer::start(vec![MockReply::with_status(502, "<html>bad gateway</html>")])
            .await?;
    let (transport, config) = transport_for(&server)?;

    let request = descriptor()
        .with_kind(ResponseKind::Session)
        .to_request(config.base_url(), Utc::now())?;
    let mut envelope = transport.perform_get(&request).await?;

    assert!(matches!(envelope, ResponseEnvelope::Session(_)));
    assert!(envelope.data().json.is_none());
    assert_eq!(classify(envelope.data_mut()), Classification::MissingBody);

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stopped_server_surfaces_transport_error() -> Result<()> {
    init_tracing();
    let server = MockAttributionServer::start(vec![]).await?;
    let (transport, config) = transport_for(&server)?;
    server.shutdown().await;

    let request = descriptor().to_request(config.base_url(), Utc::now())?;
    let err = transport
        .perform_get(&request)
        .await
        .expect_err("request to a stopped server must fail");
    assert!(err.downcast_ref::<TransportError>().is_some());
    assert!(!format!("{err:#}").contains("qwerty123456"));
    Ok(())
}
