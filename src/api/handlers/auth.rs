//! Login, logout, and refresh endpoints backed by the [`SessionManager`].

use crate::session::{
    ActionResult, LoginForm, LoginOutcome, LogoutOutcome, RefreshOutcome, SessionManager,
    types::INVALID_INPUT_MESSAGE,
};
use axum::{
    Form, Json, async_trait,
    extract::{Extension, FromRequest, Multipart, Request},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::warn;

/// Login fields from either a urlencoded form or a `multipart/form-data`
/// body. Unknown fields are ignored and missing ones are empty.
#[derive(Debug)]
pub struct LoginSubmission(pub LoginForm);

/// Body that could not be read as a login form.
#[derive(Debug)]
pub struct InvalidLoginSubmission(String);

impl IntoResponse for InvalidLoginSubmission {
    fn into_response(self) -> Response {
        warn!("unreadable login submission: {}", self.0);
        (
            StatusCode::BAD_REQUEST,
            Json(ActionResult::failed(INVALID_INPUT_MESSAGE)),
        )
            .into_response()
    }
}

#[async_trait]
impl<S> FromRequest<S> for LoginSubmission
where
    S: Send + Sync,
{
    type Rejection = InvalidLoginSubmission;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| {
                value
                    .trim_start()
                    .to_ascii_lowercase()
                    .starts_with("multipart/form-data")
            });

        if !is_multipart {
            let Form(form) = Form::<LoginForm>::from_request(req, state)
                .await
                .map_err(|err| InvalidLoginSubmission(err.body_text()))?;
            return Ok(Self(form));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|err| InvalidLoginSubmission(err.body_text()))?;
        let mut form = LoginForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| InvalidLoginSubmission(err.body_text()))?
        {
            let name = field.name().map(str::to_string);
            let value = field
                .text()
                .await
                .map_err(|err| InvalidLoginSubmission(err.body_text()))?;
            match name.as_deref() {
                Some("username") => form.username = value,
                Some("password") => form.password = value,
                _ => {}
            }
        }
        Ok(Self(form))
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Login successful; access and refresh cookies set", body = ActionResult),
        (status = 400, description = "Missing username or password, or a body that is not a form; multipart/form-data is also accepted", body = ActionResult),
        (status = 401, description = "Identity backend rejected the credentials or answered without a token pair", body = ActionResult),
        (status = 500, description = "Session cookies could not be written", body = ActionResult)
    ),
    tag = "auth"
)]
pub async fn login(
    manager: Extension<Arc<SessionManager>>,
    jar: CookieJar,
    LoginSubmission(form): LoginSubmission,
) -> impl IntoResponse {
    let mut jar = jar;
    let outcome = manager.login(None, form, &mut jar).await;
    let status = match &outcome {
        LoginOutcome::Success => StatusCode::OK,
        LoginOutcome::ValidationFailed(_) => StatusCode::BAD_REQUEST,
        LoginOutcome::AuthFailed(_) => StatusCode::UNAUTHORIZED,
        LoginOutcome::StoreFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, jar, Json(ActionResult::from(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cookies cleared, or none were present", body = ActionResult),
        (status = 500, description = "Session cookies could not be cleared", body = ActionResult)
    ),
    tag = "auth"
)]
pub async fn logout(manager: Extension<Arc<SessionManager>>, jar: CookieJar) -> impl IntoResponse {
    let mut jar = jar;
    let outcome = manager.logout(&mut jar);
    let status = match &outcome {
        LogoutOutcome::Cleared | LogoutOutcome::NothingToClear => StatusCode::OK,
        LogoutOutcome::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, jar, Json(ActionResult::from(outcome)))
}

/// Mounted at the configured refresh path, so it is not part of the `OpenAPI` router.
pub async fn refresh(manager: Extension<Arc<SessionManager>>, jar: CookieJar) -> impl IntoResponse {
    let mut jar = jar;
    let outcome = manager.refresh(&mut jar).await;
    let status = match &outcome {
        RefreshOutcome::Refreshed { .. } => StatusCode::OK,
        RefreshOutcome::MissingToken => StatusCode::UNAUTHORIZED,
        RefreshOutcome::AuthFailed { status, .. } => {
            if *status == 401 {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::BAD_GATEWAY
            }
        }
        RefreshOutcome::StoreFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, jar, Json(ActionResult::from(outcome)))
}
