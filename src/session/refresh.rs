use super::{
    CookieStore, REFRESH_COOKIE_NAME, SessionManager, TOKEN_REFRESH_ENDPOINT,
    types::{INVALID_AUTH_RESPONSE_MESSAGE, LogoutOutcome, RefreshOutcome, non_empty_str},
};
use crate::gateway::{BaseUrlClass, GatewayError};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

impl SessionManager {
    /// Trade the refresh cookie for a new access cookie.
    ///
    /// If the backend rotates refresh tokens, the refresh cookie is replaced
    /// as well. A 401 from the backend clears both cookies.
    #[instrument(skip_all)]
    pub async fn refresh<S: CookieStore>(&self, store: &mut S) -> RefreshOutcome {
        let Some(refresh_token) = store.value(REFRESH_COOKIE_NAME) else {
            debug!("refresh requested without a refresh cookie");
            return RefreshOutcome::MissingToken;
        };

        let body = json!({ "refresh": refresh_token.expose_secret() });
        let response = match self
            .gateway
            .call(
                TOKEN_REFRESH_ENDPOINT,
                Method::POST,
                Some(&body),
                BaseUrlClass::Auth,
            )
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!("token refresh failed: {err}");
                if matches!(err, GatewayError::Backend { status: 401, .. }) {
                    warn!("refresh token rejected, clearing session cookies");
                    if let LogoutOutcome::Failed(reason) = self.logout(store) {
                        error!("failed to clear rejected session cookies: {reason}");
                        return RefreshOutcome::StoreFailed(reason);
                    }
                }
                return RefreshOutcome::AuthFailed {
                    status: err.status(),
                    message: err.detail(),
                };
            }
        };

        let Some(access) = response
            .as_ref()
            .and_then(|value| non_empty_str(value, "access"))
        else {
            error!("refresh response is missing access token");
            return RefreshOutcome::AuthFailed {
                status: 502,
                message: INVALID_AUTH_RESPONSE_MESSAGE.to_string(),
            };
        };
        let rotated = response
            .as_ref()
            .and_then(|value| non_empty_str(value, "refresh"));

        // Write the rotated refresh token first so a failure leaves the old pair intact.
        if let Some(refresh) = &rotated {
            let cookie = self
                .policy
                .refresh_cookie(&SecretString::from(refresh.clone()));
            if let Err(err) = store.set(cookie) {
                error!("failed to store refresh cookie: {err}");
                return RefreshOutcome::StoreFailed(err.to_string());
            }
        }
        if let Err(err) = store.set(self.policy.access_cookie(&SecretString::from(access))) {
            error!("failed to store access cookie: {err}");
            return RefreshOutcome::StoreFailed(err.to_string());
        }

        info!("access token refreshed");

        RefreshOutcome::Refreshed {
            rotated: rotated.is_some(),
        }
    }
}
