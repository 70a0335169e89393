use super::BaseUrlClass;
use thiserror::Error;

/// Status reported for transport failures that never produced a response.
pub const TRANSPORT_FAILURE_STATUS: u16 = 500;
/// Status reported when the upstream call hit the configured timeout.
pub const TIMEOUT_STATUS: u16 = 504;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The base URL for the requested class is not configured.
    #[error("{class} backend base URL is not configured")]
    Configuration { class: BaseUrlClass },
    /// The upstream answered with an error status.
    #[error("{detail}")]
    Backend { status: u16, detail: String },
    /// No response was received.
    #[error("{detail}")]
    Transport { status: u16, detail: String },
}

impl GatewayError {
    pub(super) fn backend(status: u16, detail: Option<&str>) -> Self {
        let detail = detail
            .map(str::trim)
            .filter(|detail| !detail.is_empty())
            .map_or_else(
                || format!("Request failed with status {status}"),
                str::to_string,
            );
        Self::Backend { status, detail }
    }

    /// The detail never carries the request URL; backend locations stay in
    /// server-side logs.
    pub(super) fn transport(err: reqwest::Error) -> Self {
        let status = if err.is_timeout() {
            TIMEOUT_STATUS
        } else {
            TRANSPORT_FAILURE_STATUS
        };
        Self::Transport {
            status,
            detail: err.without_url().to_string(),
        }
    }

    /// HTTP-like status of the failure; configuration errors report 500.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Configuration { .. } => TRANSPORT_FAILURE_STATUS,
            Self::Backend { status, .. } | Self::Transport { status, .. } => *status,
        }
    }

    /// Message suitable for surfacing to a user.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Configuration { .. } => self.to_string(),
            Self::Backend { detail, .. } | Self::Transport { detail, .. } => detail.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_uses_detail_when_present() {
        let err = GatewayError::backend(401, Some("bad credentials"));
        assert_eq!(err.status(), 401);
        assert_eq!(err.detail(), "bad credentials");
    }

    #[test]
    fn backend_error_falls_back_to_generic_message() {
        let err = GatewayError::backend(503, None);
        assert_eq!(err.detail(), "Request failed with status 503");
    }

    #[test]
    fn blank_backend_detail_falls_back_to_generic_message() {
        assert_eq!(
            GatewayError::backend(400, Some("")).detail(),
            "Request failed with status 400"
        );
        assert_eq!(
            GatewayError::backend(400, Some("  ")).detail(),
            "Request failed with status 400"
        );
    }

    #[test]
    fn configuration_error_names_the_class() {
        let err = GatewayError::Configuration {
            class: BaseUrlClass::Api,
        };
        assert_eq!(err.status(), 500);
        assert_eq!(err.detail(), "api backend base URL is not configured");
    }
}
