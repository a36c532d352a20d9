//! Transport seam used by the coordinator plus the default reqwest-backed
//! implementation.

use crate::response::envelope::{ResponseData, ResponseEnvelope};
use crate::runtime::config::CoordinatorConfig;
use crate::transport::descriptor::LookupRequest;
use crate::transport::options::{TransportOptions, CLIENT_SDK_HEADER};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::fmt;
use std::time::Instant;
use url::Url;

#[derive(Debug)]
pub enum TransportError {
    Timeout { url: Url },
    Request { url: Url, source: reqwest::Error },
    Body { url: Url, source: reqwest::Error },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout { url } => {
                write!(f, "attribution request to {} timed out", redacted(url))
            }
            TransportError::Request { url, .. } => {
                write!(f, "attribution request to {} failed", redacted(url))
            }
            TransportError::Body { url, .. } => {
                write!(f, "failed to read attribution response from {}", redacted(url))
            }
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Timeout { .. } => None,
            TransportError::Request { source, .. } | TransportError::Body { source, .. } => {
                Some(source)
            }
        }
    }
}

/// Query strings carry device identifiers; keep them out of error messages.
fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// Performs the outbound GET for an attribution lookup.
///
/// Implementations own timeouts and TLS; the coordinator awaits the returned
/// future inline, so it must eventually resolve.
pub trait AttributionTransport: Send + Sync {
    fn perform_get<'a>(&'a self, request: &'a LookupRequest)
        -> BoxFuture<'a, Result<ResponseEnvelope>>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    options: TransportOptions,
}

impl AttributionTransport for HttpTransport {
    fn perform_get<'a>(
        &'a self,
        request: &'a LookupRequest,
    ) -> BoxFuture<'a, Result<ResponseEnvelope>> {
        Box::pin(self.get(request))
    }
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::with_options(TransportOptions::default())
    }

    pub fn with_options(options: TransportOptions) -> Result<Self> {
        options.validate()?;

        let mut builder = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .connect_timeout(options.connect_timeout);
        if let Some(user_agent) = options.user_agent.as_deref() {
            builder = builder.user_agent(user_agent);
        }
        let client = builder
            .build()
            .context("failed to build attribution HTTP client")?;

        Ok(Self { client, options })
    }

    pub fn from_config(config: &CoordinatorConfig) -> Result<Self> {
        Self::with_options(config.transport_options())
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    pub async fn get(&self, request: &LookupRequest) -> Result<ResponseEnvelope> {
        let started = Instant::now();
        let response = self
            .client
            .get(request.url.clone())
            .header(CLIENT_SDK_HEADER, request.client_sdk.as_str())
            .send()
            .await
            .map_err(|source| classify_error(&request.url, source))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| TransportError::Body {
                url: request.url.clone(),
                source: source.without_url(),
            })?;

        let data = ResponseData::from_body(status.as_u16(), &body);
        let latency_ms = started.elapsed().as_millis() as u64;
        match data.message.as_deref() {
            Some(message) if status.is_success() => {
                tracing::info!(status = status.as_u16(), latency_ms, "{message}");
            }
            Some(message) => {
                tracing::error!(status = status.as_u16(), latency_ms, "{message}");
            }
            None if status.is_success() => {
                tracing::debug!(
                    status = status.as_u16(),
                    latency_ms,
                    "attribution response received"
                );
            }
            None => {
                tracing::error!(
                    status = status.as_u16(),
                    latency_ms,
                    "attribution request returned an error status without a message"
                );
            }
        }

        Ok(ResponseEnvelope::new(request.kind, data))
    }
}

fn classify_error(url: &Url, source: reqwest::Error) -> anyhow::Error {
    if source.is_timeout() {
        TransportError::Timeout { url: url.clone() }.into()
    } else {
        TransportError::Request {
            url: url.clone(),
            source: source.without_url(),
        }
        .into()
    }
}
