use super::{
    CookieStore, CookieStoreError, SessionManager, TOKEN_ENDPOINT,
    types::{
        ActionResult, Credentials, INVALID_AUTH_RESPONSE_MESSAGE, LoginForm, LoginOutcome,
        TokenPair, UNKNOWN_LOGIN_ERROR_MESSAGE,
    },
};
use crate::gateway::BaseUrlClass;
use reqwest::Method;
use tracing::{error, info, instrument, warn};

impl SessionManager {
    /// Exchange submitted credentials for a token pair and persist it as cookies.
    ///
    /// `_previous` is the last result shown by the form; it only threads UI
    /// state and does not affect the outcome. Either both cookies are written
    /// and `Success` is returned, or neither is.
    #[instrument(skip_all)]
    pub async fn login<S: CookieStore>(
        &self,
        _previous: Option<&ActionResult>,
        form: LoginForm,
        store: &mut S,
    ) -> LoginOutcome {
        let credentials = match Credentials::from_form(form) {
            Ok(credentials) => credentials,
            Err(errors) => {
                warn!("login input validation failed: {:?}", errors);
                return LoginOutcome::ValidationFailed(errors);
            }
        };

        let body = credentials.to_json();
        let response = match self
            .gateway
            .call(TOKEN_ENDPOINT, Method::POST, Some(&body), BaseUrlClass::Auth)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!("token exchange failed: {err}");
                let detail = err.detail();
                return LoginOutcome::AuthFailed(if detail.is_empty() {
                    UNKNOWN_LOGIN_ERROR_MESSAGE.to_string()
                } else {
                    detail
                });
            }
        };

        // A success status without both tokens is still an auth failure.
        let Some(tokens) = TokenPair::from_response(response.as_ref()) else {
            error!("authentication response is missing access or refresh token");
            return LoginOutcome::AuthFailed(INVALID_AUTH_RESPONSE_MESSAGE.to_string());
        };

        if let Err(err) = self.commit(store, &tokens) {
            error!("failed to store session cookies: {err}");
            return LoginOutcome::StoreFailed(err.to_string());
        }

        info!("session cookies set for user: {}", credentials.username());

        LoginOutcome::Success
    }

    /// Write both cookies, rolling back the access cookie if the refresh write fails.
    fn commit<S: CookieStore>(
        &self,
        store: &mut S,
        tokens: &TokenPair,
    ) -> Result<(), CookieStoreError> {
        let access = self.policy.access_cookie(&tokens.access);
        let refresh = self.policy.refresh_cookie(&tokens.refresh);

        store.set(access)?;
        if let Err(err) = store.set(refresh) {
            if let Err(rollback) = store.remove(self.policy.access_removal()) {
                error!("failed to roll back access cookie: {rollback}");
            }
            return Err(err);
        }

        Ok(())
    }
}
