//! Client configuration.
//!
//! A `ClientConfig` is validated once and never mutated afterwards. The base
//! endpoint must parse as an absolute URL that can carry a path; anything else
//! is rejected before a client exists.

use std::fmt;

use url::Url;

use crate::error::{ApiError, Result};

/// Environment variable holding the base endpoint for [`ClientConfig::from_env`].
pub const URL_ENV: &str = "UNIFI_ACCESS_URL";
/// Environment variable holding the bearer token for [`ClientConfig::from_env`].
pub const TOKEN_ENV: &str = "UNIFI_ACCESS_TOKEN";

/// Whether the HTTP status takes part in classifying a response.
///
/// The API reports application failures inside the envelope, often under
/// HTTP 200, so the default looks only at the envelope `code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Decode every response and classify by envelope `code` alone.
    #[default]
    EnvelopeOnly,
    /// Reject any status other than 200 before decoding.
    RequireOk,
}

#[derive(Clone)]
pub struct ClientConfig {
    base_url: Url,
    token: String,
    status_policy: StatusPolicy,
}

impl ClientConfig {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| ApiError::config(base_url, e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::config(base_url, "URL cannot be used as a base endpoint"));
        }
        if parsed.host_str().is_none() {
            return Err(ApiError::config(base_url, "URL has no host"));
        }
        Ok(Self {
            base_url: parsed,
            token: token.into(),
            status_policy: StatusPolicy::default(),
        })
    }

    /// Build `https://{host}:{port}`, the address a UniFi Access console
    /// serves its developer API on.
    pub fn from_host_port(host: &str, port: u16, token: impl Into<String>) -> Result<Self> {
        let base = if host.contains(':') && !host.starts_with('[') {
            format!("https://[{host}]:{port}")
        } else {
            format!("https://{host}:{port}")
        };
        Self::new(&base, token)
    }

    /// Read the base endpoint and token from `UNIFI_ACCESS_URL` and
    /// `UNIFI_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let base = std::env::var(URL_ENV).map_err(|e| ApiError::config(URL_ENV, e.to_string()))?;
        let token =
            std::env::var(TOKEN_ENV).map_err(|e| ApiError::config(TOKEN_ENV, e.to_string()))?;
        Self::new(&base, token)
    }

    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .field("status_policy", &self.status_policy)
            .finish()
    }
}
