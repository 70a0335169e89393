//! Upstream base URLs and call policy for the gateway.

use std::{fmt, time::Duration};
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Selects which configured upstream root a call resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseUrlClass {
    /// Token issuance and refresh.
    Auth,
    /// General resource calls.
    Api,
}

impl BaseUrlClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for BaseUrlClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {class} base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        class: BaseUrlClass,
        url: String,
        reason: String,
    },
    #[error("backend timeout must be greater than zero")]
    ZeroTimeout,
}

/// Immutable backend configuration injected into the [`super::Gateway`].
///
/// A base URL that is given must be an absolute `http`/`https` URL; that is
/// checked here. A base URL that is missing is only an error when a call for
/// that class is attempted.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    auth_base_url: Option<String>,
    api_base_url: Option<String>,
    timeout: Duration,
}

impl BackendConfig {
    /// Build a config from optional base URLs.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidBaseUrl` if a provided URL is malformed or
    /// does not use `http`/`https`.
    pub fn new(
        auth_base_url: Option<String>,
        api_base_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            auth_base_url: validate_base_url(BaseUrlClass::Auth, auth_base_url)?,
            api_base_url: validate_base_url(BaseUrlClass::Api, api_base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        })
    }

    /// Override the per-call timeout.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroTimeout` for a zero duration.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        self.timeout = timeout;
        Ok(self)
    }

    #[must_use]
    pub fn base_url(&self, class: BaseUrlClass) -> Option<&str> {
        match class {
            BaseUrlClass::Auth => self.auth_base_url.as_deref(),
            BaseUrlClass::Api => self.api_base_url.as_deref(),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn validate_base_url(
    class: BaseUrlClass,
    value: Option<String>,
) -> Result<Option<String>, ConfigError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    // An empty env var is the same as an unset one.
    if trimmed.is_empty() {
        return Ok(None);
    }

    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        class,
        url: trimmed.to_string(),
        reason,
    };

    let parsed = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid(format!("unsupported scheme {scheme}"))),
    }
    if parsed.host_str().is_none() {
        return Err(invalid("no host specified".to_string()));
    }

    Ok(Some(trimmed.to_string()))
}
