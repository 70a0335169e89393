use crate::{GIT_COMMIT_HASH, gateway::BaseUrlClass, session::SessionManager};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header::InvalidHeaderValue},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

const SHORT_HASH_LEN: usize = 7;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    auth_backend: String,
    api_backend: String,
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Service is up; backend fields report whether each base URL is configured", body = Health)
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health(method: Method, manager: Extension<Arc<SessionManager>>) -> impl IntoResponse {
    let config = manager.gateway().config();
    let backend_status = |class: BaseUrlClass| {
        if config.base_url(class).is_some() {
            "configured".to_string()
        } else {
            "missing".to_string()
        }
    };

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        auth_backend: backend_status(BaseUrlClass::Auth),
        api_backend: backend_status(BaseUrlClass::Api),
    };

    let mut headers = HeaderMap::new();
    match x_app_value(&health.name, &health.version, &health.commit) {
        Ok(value) => {
            debug!("X-App header: {:?}", value);
            headers.insert("X-App", value);
        }
        Err(err) => error!("Failed to parse X-App header: {}", err),
    }

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    (StatusCode::OK, headers, body)
}

/// `name:version:short-hash`. The hash is cut to seven characters and left
/// empty unless the commit is a hex hash of at least that length.
fn x_app_value(
    name: &str,
    version: &str,
    commit: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let is_hash = commit.len() >= SHORT_HASH_LEN && commit.bytes().all(|b| b.is_ascii_hexdigit());
    let short_hash = if is_hash {
        &commit[..SHORT_HASH_LEN]
    } else {
        ""
    };
    HeaderValue::from_str(&format!("{name}:{version}:{short_hash}"))
}
