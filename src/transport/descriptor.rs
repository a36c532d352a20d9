use crate::response::envelope::ResponseKind;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

pub const SENT_AT_PARAMETER: &str = "sent_at";
const SENT_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ%z";

/// Describes the attribution lookup: where to send it and with which query
/// parameters. Parameters are kept sorted so the built URL is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionRequestDescriptor {
    path: String,
    parameters: BTreeMap<String, String>,
    client_sdk: String,
    kind: ResponseKind,
}

impl AttributionRequestDescriptor {
    pub fn new(path: impl Into<String>, client_sdk: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            parameters: BTreeMap::new(),
            client_sdk: client_sdk.into(),
            kind: ResponseKind::Attribution,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_parameters<I, K, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.parameters.extend(
            parameters
                .into_iter()
                .map(|(name, value)| (name.into(), value.into())),
        );
        self
    }

    /// Overrides the response kind the transport tags replies with.
    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn client_sdk(&self) -> &str {
        &self.client_sdk
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    /// Builds the lookup URL: base, descriptor path, descriptor parameters and
    /// finally the `sent_at` stamp.
    pub fn build_url(&self, base_url: &Url, sent_at: DateTime<Utc>) -> Result<Url> {
        let mut url = base_url.clone();
        url.set_query(None);
        url.set_fragment(None);

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("base url {base_url} cannot carry a path"))?;
            segments.pop_if_empty();
            for segment in self.path.split('/').filter(|segment| !segment.is_empty()) {
                segments.push(segment);
            }
        }

        {
            let mut query = url.query_pairs_mut();
            for (name, value) in &self.parameters {
                query.append_pair(name, value);
            }
            query.append_pair(SENT_AT_PARAMETER, &format_sent_at(sent_at));
        }

        Ok(url)
    }

    pub fn to_request(&self, base_url: &Url, sent_at: DateTime<Utc>) -> Result<LookupRequest> {
        Ok(LookupRequest {
            url: self.build_url(base_url, sent_at)?,
            client_sdk: self.client_sdk.clone(),
            kind: self.kind,
        })
    }
}

impl fmt::Display for AttributionRequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Path:      {}", self.path)?;
        writeln!(f, "ClientSdk: {}", self.client_sdk)?;
        write!(f, "Parameters:")?;
        for (name, value) in &self.parameters {
            write!(f, "\n\t{name:<22} {value}")?;
        }
        Ok(())
    }
}

/// Fully built outbound lookup, handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub url: Url,
    pub client_sdk: String,
    pub kind: ResponseKind,
}

/// Formats a `sent_at` timestamp, e.g. `2026-10-16T09:30:00.123Z+0000`.
pub fn format_sent_at(timestamp: DateTime<Utc>) -> String {
    timestamp.format(SENT_AT_FORMAT).to_string()
}
