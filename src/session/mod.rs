//! Login, logout, and refresh orchestration on top of the [`Gateway`].
//!
//! The manager never navigates or renders; it returns an outcome and the
//! caller decides what to do with it.

pub mod cookies;
mod login;
mod logout;
mod refresh;
pub mod types;

pub use cookies::{
    ACCESS_COOKIE_NAME, CookiePolicy, CookiePolicyError, CookieStore, CookieStoreError,
    REFRESH_COOKIE_NAME,
};
pub use types::{
    ActionResult, Credentials, FieldErrors, LoginForm, LoginOutcome, LogoutOutcome,
    RefreshOutcome, TokenPair,
};

use crate::gateway::Gateway;

/// Token-issuance endpoint on the "auth" upstream.
pub const TOKEN_ENDPOINT: &str = "/token/";
/// Token-refresh endpoint on the "auth" upstream.
pub const TOKEN_REFRESH_ENDPOINT: &str = "/token/refresh/";

#[derive(Debug, Clone)]
pub struct SessionManager {
    gateway: Gateway,
    policy: CookiePolicy,
}

impl SessionManager {
    #[must_use]
    pub fn new(gateway: Gateway, policy: CookiePolicy) -> Self {
        Self { gateway, policy }
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    #[must_use]
    pub fn policy(&self) -> &CookiePolicy {
        &self.policy
    }
}
