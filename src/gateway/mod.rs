//! Normalized server-to-server calls to the identity/resource backend.
//!
//! Every call resolves a logical endpoint against one of two configured base
//! URLs, goes to the upstream live (no caching), and comes back either as the
//! parsed JSON body or as a [`GatewayError`] carrying `status` and `detail`.

mod config;
mod error;

pub use config::{BackendConfig, BaseUrlClass, ConfigError};
pub use error::{GatewayError, TIMEOUT_STATUS, TRANSPORT_FAILURE_STATUS};

use reqwest::{
    Client, Method,
    header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, HeaderValue, PRAGMA},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

#[derive(Debug, Clone)]
pub struct Gateway {
    client: Client,
    config: BackendConfig,
}

impl Gateway {
    /// Build a gateway with a pooled HTTP client bounded by the configured timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: BackendConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Call `endpoint` on the upstream selected by `class`.
    ///
    /// Returns the parsed JSON body for a success status, or `None` if the body
    /// was empty or not JSON.
    ///
    /// # Errors
    /// - `GatewayError::Configuration` if the class has no base URL; no request is sent.
    /// - `GatewayError::Backend` for an error status, with `detail` from the body if present.
    /// - `GatewayError::Transport` if no response was received.
    pub async fn call(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
        class: BaseUrlClass,
    ) -> Result<Option<Value>, GatewayError> {
        self.send(endpoint, method, body, class, None).await
    }

    /// Same as [`Gateway::call`], with an `Authorization: Bearer` header.
    ///
    /// # Errors
    /// See [`Gateway::call`].
    pub async fn call_with_bearer(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
        class: BaseUrlClass,
        token: &SecretString,
    ) -> Result<Option<Value>, GatewayError> {
        self.send(endpoint, method, body, class, Some(token)).await
    }

    #[instrument(skip(self, body, bearer, class), fields(class = %class))]
    async fn send(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
        class: BaseUrlClass,
        bearer: Option<&SecretString>,
    ) -> Result<Option<Value>, GatewayError> {
        let Some(base_url) = self.config.base_url(class) else {
            error!("{class} backend base URL not configured");
            return Err(GatewayError::Configuration { class });
        };

        let url = join_url(base_url, endpoint);

        debug!("calling backend: {} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache");

        if let Some(token) = bearer {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|_| GatewayError::Transport {
                    status: TRANSPORT_FAILURE_STATUS,
                    detail: "Invalid bearer token".to_string(),
                })?;
            request = request.header(AUTHORIZATION, value);
        }

        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                error!("backend call {} {} failed: {}", method, url, err);
                return Err(GatewayError::transport(err));
            }
        };

        let status = response.status();
        // An unreadable or non-JSON body is treated as absent.
        let parsed = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes).ok(),
            Err(err) => {
                warn!("failed to read backend response body: {}", err);
                None
            }
        };

        if !status.is_success() {
            let detail = parsed
                .as_ref()
                .and_then(|value| value.get("detail"))
                .and_then(Value::as_str);
            warn!("backend call {} {} returned {}", method, url, status);
            return Err(GatewayError::backend(status.as_u16(), detail));
        }

        debug!("backend call {} {} succeeded with {}", method, url, status);

        Ok(parsed)
    }
}

/// Join a base URL and an endpoint with exactly one `/` between them.
#[must_use]
pub fn join_url(base_url: &str, endpoint: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let endpoint = endpoint.trim().trim_start_matches('/');

    format!("{base}/{endpoint}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;
    use std::{net::TcpListener, time::Duration};
    use wiremock::matchers::{any, body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn gateway(auth: Option<String>, api: Option<String>) -> Gateway {
        Gateway::new(BackendConfig::new(auth, api).unwrap()).unwrap()
    }

    #[test]
    fn join_url_is_stable_with_or_without_leading_slash() {
        let with_slash = join_url("http://backend:8000/auth", "/token/");
        let without_slash = join_url("http://backend:8000/auth", "token/");
        assert_eq!(with_slash, "http://backend:8000/auth/token/");
        assert_eq!(with_slash, without_slash);
    }

    #[test]
    fn join_url_does_not_duplicate_separator() {
        assert_eq!(
            join_url("http://backend:8000/api/", "/users/me/"),
            "http://backend:8000/api/users/me/"
        );
        assert_eq!(
            join_url("http://backend:8000/api//", "users/me/"),
            "http://backend:8000/api/users/me/"
        );
    }

    #[tokio::test]
    async fn missing_base_url_fails_before_any_request() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        // Only "auth" points at the mock; every "api" call must stop early.
        let gateway = gateway(Some(server.uri()), None);
        let methods = [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ];
        let body = json!({"k": "v"});
        for endpoint in ["/token/", "token/", "", "/users/me/"] {
            for verb in &methods {
                let result = gateway
                    .call(endpoint, verb.clone(), Some(&body), BaseUrlClass::Api)
                    .await;
                assert_eq!(
                    result,
                    Err(GatewayError::Configuration {
                        class: BaseUrlClass::Api
                    })
                );
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn success_returns_parsed_body_and_sends_json_headers() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token/"))
            .and(header("content-type", "application/json"))
            .and(header("accept", "application/json"))
            .and(body_json(json!({"username": "alice", "password": "pw"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access": "A", "refresh": "R"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway(Some(format!("{}/auth", server.uri())), None);
        let body = json!({"username": "alice", "password": "pw"});
        let value = gateway
            .call("/token/", Method::POST, Some(&body), BaseUrlClass::Auth)
            .await?;
        assert_eq!(value, Some(json!({"access": "A", "refresh": "R"})));
        Ok(())
    }

    #[tokio::test]
    async fn non_json_success_body_is_treated_as_absent() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ping/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .mount(&server)
            .await;

        let gateway = gateway(None, Some(format!("{}/api/", server.uri())));
        let value = gateway
            .call("ping/", Method::GET, None, BaseUrlClass::Api)
            .await?;
        assert_eq!(value, None);
        Ok(())
    }

    #[tokio::test]
    async fn error_status_surfaces_detail() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token/"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "bad credentials"})),
            )
            .mount(&server)
            .await;

        let gateway = gateway(Some(format!("{}/auth", server.uri())), None);
        let result = gateway
            .call("token/", Method::POST, None, BaseUrlClass::Auth)
            .await;
        assert_eq!(
            result,
            Err(GatewayError::Backend {
                status: 401,
                detail: "bad credentials".to_string()
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn error_status_without_json_uses_generic_detail() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let gateway = gateway(Some(server.uri()), None);
        let result = gateway
            .call("token/", Method::POST, None, BaseUrlClass::Auth)
            .await;
        assert_eq!(
            result,
            Err(GatewayError::Backend {
                status: 502,
                detail: "Request failed with status 502".to_string()
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn bearer_token_is_forwarded() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me/"))
            .and(header("authorization", "Bearer A"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"username": "alice"})))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway(None, Some(format!("{}/api", server.uri())));
        let value = gateway
            .call_with_bearer(
                "/users/me/",
                Method::GET,
                None,
                BaseUrlClass::Api,
                &SecretString::from("A"),
            )
            .await?;
        assert_eq!(value, Some(json!({"username": "alice"})));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        // Reserve a port, then release it so nothing is listening.
        let port = TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
        let config = BackendConfig::new(Some(format!("http://127.0.0.1:{port}/auth")), None)?
            .with_timeout(Duration::from_secs(2))?;
        let gateway = Gateway::new(config)?;

        let result = gateway
            .call("token/", Method::POST, None, BaseUrlClass::Auth)
            .await;
        let Err(err) = result else {
            panic!("expected transport error");
        };
        assert!(matches!(err, GatewayError::Transport { .. }));
        assert_eq!(err.status(), TRANSPORT_FAILURE_STATUS);
        assert!(!err.detail().is_empty());
        assert!(!err.detail().contains("127.0.0.1"));
        Ok(())
    }

    #[tokio::test]
    async fn slow_backend_times_out_with_gateway_timeout_status() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access": "A", "refresh": "R"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = BackendConfig::new(Some(format!("{}/auth", server.uri())), None)?
            .with_timeout(Duration::from_millis(300))?;
        let gateway = Gateway::new(config)?;

        let result = gateway
            .call("token/", Method::POST, None, BaseUrlClass::Auth)
            .await;
        let Err(err) = result else {
            panic!("expected timeout");
        };
        assert!(matches!(err, GatewayError::Transport { .. }));
        assert_eq!(err.status(), TIMEOUT_STATUS);
        assert!(!err.detail().contains(&server.uri()));
        Ok(())
    }
}
