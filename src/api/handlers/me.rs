use crate::{
    gateway::BaseUrlClass,
    session::{ACCESS_COOKIE_NAME, CookieStore, SessionManager},
};
use axum::{
    Json,
    extract::Extension,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

const ME_ENDPOINT: &str = "/users/me/";
const NOT_AUTHENTICATED_DETAIL: &str = "Authentication credentials were not provided.";

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Profile of the signed-in user, as returned by the backend"),
        (status = 401, description = "No access cookie, or the backend rejected it")
    ),
    tag = "users"
)]
pub async fn me(manager: Extension<Arc<SessionManager>>, jar: CookieJar) -> Response {
    let Some(token) = jar.value(ACCESS_COOKIE_NAME) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": NOT_AUTHENTICATED_DETAIL })),
        )
            .into_response();
    };

    match manager
        .gateway()
        .call_with_bearer(ME_ENDPOINT, Method::GET, None, BaseUrlClass::Api, &token)
        .await
    {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            warn!("profile lookup failed: {err}");
            let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(json!({ "detail": err.detail() }))).into_response()
        }
    }
}
