use crate::{
    api::handlers::{auth, health, root},
    session::SessionManager,
};
use anyhow::{Result, anyhow};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, options, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, error, info, info_span};
use ulid::Ulid;

pub mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

/// Routes the refresh path may not shadow.
const RESERVED_PATHS: [&str; 5] = [
    "/",
    "/health",
    "/api/auth/login",
    "/api/auth/logout",
    "/api/users/me",
];

/// Build the full application router around a shared session manager.
///
/// # Errors
/// Returns an error if the configured refresh path collides with another route.
pub fn router(manager: Arc<SessionManager>) -> Result<Router> {
    let refresh_path = manager.policy().refresh_path().to_string();
    let scoped_logout_path = manager.policy().scoped_logout_path();
    for path in [&refresh_path, &scoped_logout_path] {
        if RESERVED_PATHS.contains(&path.as_str()) {
            return Err(anyhow!("route {path} collides with an existing route"));
        }
    }

    // Documented routes come from openapi.rs; `/`, `OPTIONS /health`, and the
    // routes under the configurable refresh path are added here. Logout is
    // served under the refresh path too, since only there does the browser
    // send the refresh cookie.
    let (router, _openapi) = openapi::api_router().split_for_parts();
    let app = router
        .route("/", get(root::root))
        .route("/health", options(health::health))
        .route(&refresh_path, post(auth::refresh))
        .route(&scoped_logout_path, post(auth::logout))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(manager)),
        );

    Ok(app)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, manager: Arc<SessionManager>) -> Result<()> {
    let app = router(manager)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::{BackendConfig, Gateway};
    use crate::session::CookiePolicy;
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    fn manager(policy: CookiePolicy) -> Arc<SessionManager> {
        let config = BackendConfig::new(None, None).unwrap();
        Arc::new(SessionManager::new(Gateway::new(config).unwrap(), policy))
    }

    #[test]
    fn refresh_path_cannot_shadow_login() {
        let policy = CookiePolicy::default()
            .with_refresh_path("/api/auth/login")
            .unwrap();
        assert!(router(manager(policy)).is_err());
    }

    #[tokio::test]
    async fn health_reports_missing_backends_and_request_id() -> Result<()> {
        let app = router(manager(CookiePolicy::default()))?;
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/health")
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("x-app"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(value["auth_backend"], "missing");
        assert_eq!(value["api_backend"], "missing");
        assert_eq!(value["name"], env!("CARGO_PKG_NAME"));
        Ok(())
    }

    #[tokio::test]
    async fn refresh_route_is_mounted_at_policy_path() -> Result<()> {
        let policy = CookiePolicy::default()
            .with_refresh_path("/bff/refresh/")
            .unwrap();
        let app = router(manager(policy))?;
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/bff/refresh/")
                    .body(Body::empty())?,
            )
            .await?;

        // No refresh cookie on the request.
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }
}
