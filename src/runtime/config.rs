use crate::transport::options::{
    TransportOptions, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use anyhow::{bail, Context, Result};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://app.adjust.com";

/// Runtime configuration for the attribution coordinator.
///
/// All instances must be constructed via [`CoordinatorConfig::builder`] or
/// [`CoordinatorConfig::new`] so invariants are validated before any consumer
/// observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    base_url: Url,
    request_timeout: Duration,
    connect_timeout: Duration,
    user_agent: Option<String>,
}

pub struct CoordinatorConfigParams {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            user_agent: None,
        }
    }
}

impl CoordinatorConfig {
    /// Returns a builder to incrementally construct and validate a configuration.
    pub fn builder() -> CoordinatorConfigBuilder {
        CoordinatorConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values.
    pub fn new(params: CoordinatorConfigParams) -> Result<Self> {
        let CoordinatorConfigParams {
            base_url,
            request_timeout,
            connect_timeout,
            user_agent,
        } = params;

        let base_url = parse_base_url(&base_url)?;
        let user_agent = user_agent
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config = Self {
            base_url,
            request_timeout,
            connect_timeout,
            user_agent,
        };

        config.validate()?;
        Ok(config)
    }

    /// Scheme and authority (plus optional base path) lookups are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Overall timeout applied to each lookup request.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent.clone(),
        }
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        validate_scheme(&self.base_url)?;

        if self.request_timeout.is_zero() {
            bail!("request_timeout must be greater than 0");
        }

        if self.connect_timeout.is_zero() {
            bail!("connect_timeout must be greater than 0");
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CoordinatorConfigBuilder {
    base_url: Option<String>,
    request_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl CoordinatorConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<CoordinatorConfig> {
        let params = CoordinatorConfigParams {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            request_timeout: self
                .request_timeout
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            connect_timeout: self
                .connect_timeout
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            user_agent: self.user_agent,
        };

        CoordinatorConfig::new(params)
    }
}

fn parse_base_url(url: &str) -> Result<Url> {
    let url = url.trim();
    if url.is_empty() {
        bail!("base_url cannot be empty");
    }
    let parsed = Url::parse(url).with_context(|| format!("base_url {url:?} is not a valid URL"))?;
    validate_scheme(&parsed)?;
    if parsed.cannot_be_a_base() {
        bail!("base_url must be able to carry a path");
    }
    Ok(parsed)
}

fn validate_scheme(url: &Url) -> Result<()> {
    if !matches!(url.scheme(), "http" | "https") {
        bail!("base_url must start with http:// or https://");
    }
    Ok(())
}
