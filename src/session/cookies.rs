//! Session cookie policy and the cookie store seam.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use time::Duration;

pub const ACCESS_COOKIE_NAME: &str = "access_token";
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";
pub const DEFAULT_REFRESH_PATH: &str = "/api/auth/token/refresh/";

const DEFAULT_ACCESS_MAX_AGE_SECONDS: i64 = 60 * 60;
const DEFAULT_REFRESH_MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CookieStoreError {
    #[error("cookie store rejected {name}: {reason}")]
    Rejected { name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CookiePolicyError {
    #[error("refresh path must start with '/': {0:?}")]
    RelativeRefreshPath(String),
    #[error("refresh path must not be the site root")]
    RootRefreshPath,
}

/// Where session cookies persist. Implemented for the response [`CookieJar`].
pub trait CookieStore {
    /// Value of the cookie named `name`, if present.
    fn value(&self, name: &str) -> Option<SecretString>;

    /// Whether a cookie named `name` with a non-empty value is present.
    fn has(&self, name: &str) -> bool {
        self.value(name)
            .is_some_and(|value| !value.expose_secret().is_empty())
    }

    /// Add or replace a cookie.
    ///
    /// # Errors
    /// Returns `CookieStoreError` if the store refuses the write.
    fn set(&mut self, cookie: Cookie<'static>) -> Result<(), CookieStoreError>;

    /// Remove a cookie. `cookie` must carry the path it was created with.
    ///
    /// # Errors
    /// Returns `CookieStoreError` if the store refuses the removal.
    fn remove(&mut self, cookie: Cookie<'static>) -> Result<(), CookieStoreError>;
}

impl CookieStore for CookieJar {
    fn value(&self, name: &str) -> Option<SecretString> {
        self.get(name)
            .map(|cookie| SecretString::from(cookie.value().to_string()))
    }

    fn set(&mut self, cookie: Cookie<'static>) -> Result<(), CookieStoreError> {
        let jar = std::mem::replace(self, CookieJar::new());
        *self = jar.add(cookie);
        Ok(())
    }

    fn remove(&mut self, cookie: Cookie<'static>) -> Result<(), CookieStoreError> {
        let jar = std::mem::replace(self, CookieJar::new());
        *self = jar.remove(cookie);
        Ok(())
    }
}

/// Names, scopes, and lifetimes of the two session cookies.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    refresh_path: String,
    access_max_age: Option<Duration>,
    refresh_max_age: Option<Duration>,
    secure: bool,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            access_max_age: Some(Duration::seconds(DEFAULT_ACCESS_MAX_AGE_SECONDS)),
            refresh_max_age: Some(Duration::seconds(DEFAULT_REFRESH_MAX_AGE_SECONDS)),
            secure: true,
        }
    }
}

impl CookiePolicy {
    /// Restrict the refresh cookie to `path`.
    ///
    /// # Errors
    /// Returns an error if `path` is relative or is `/`, since either would
    /// send the refresh token on unrelated requests.
    pub fn with_refresh_path(mut self, path: &str) -> Result<Self, CookiePolicyError> {
        let path = path.trim();
        if !path.starts_with('/') {
            return Err(CookiePolicyError::RelativeRefreshPath(path.to_string()));
        }
        if path.trim_matches('/').is_empty() {
            return Err(CookiePolicyError::RootRefreshPath);
        }
        self.refresh_path = path.to_string();
        Ok(self)
    }

    /// Access cookie lifetime in seconds; `0` makes it a browser-session cookie.
    #[must_use]
    pub fn with_access_max_age_seconds(mut self, seconds: i64) -> Self {
        self.access_max_age = positive_seconds(seconds);
        self
    }

    /// Refresh cookie lifetime in seconds; `0` makes it a browser-session cookie.
    #[must_use]
    pub fn with_refresh_max_age_seconds(mut self, seconds: i64) -> Self {
        self.refresh_max_age = positive_seconds(seconds);
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn refresh_path(&self) -> &str {
        &self.refresh_path
    }

    #[must_use]
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Site-wide cookie carrying the access token.
    #[must_use]
    pub fn access_cookie(&self, token: &SecretString) -> Cookie<'static> {
        self.build(
            ACCESS_COOKIE_NAME,
            token.expose_secret().to_string(),
            "/".to_string(),
            self.access_max_age,
        )
    }

    /// Cookie carrying the refresh token, scoped to the refresh endpoint only.
    #[must_use]
    pub fn refresh_cookie(&self, token: &SecretString) -> Cookie<'static> {
        self.build(
            REFRESH_COOKIE_NAME,
            token.expose_secret().to_string(),
            self.refresh_path.clone(),
            self.refresh_max_age,
        )
    }

    /// Removal template for the access cookie (same name and path as when set).
    #[must_use]
    pub fn access_removal(&self) -> Cookie<'static> {
        self.build(ACCESS_COOKIE_NAME, String::new(), "/".to_string(), None)
    }

    /// Removal template for the refresh cookie. The path must match, otherwise
    /// the browser keeps the original cookie.
    #[must_use]
    pub fn refresh_removal(&self) -> Cookie<'static> {
        self.build(
            REFRESH_COOKIE_NAME,
            String::new(),
            self.refresh_path.clone(),
            None,
        )
    }

    /// Already-expired refresh cookie on the refresh path.
    ///
    /// Unlike [`Self::refresh_removal`] this is written with
    /// [`CookieStore::set`], so it reaches the browser even when the request
    /// did not carry the refresh cookie.
    #[must_use]
    pub fn refresh_expiry(&self) -> Cookie<'static> {
        let mut cookie = self.refresh_removal();
        cookie.make_removal();
        cookie
    }

    /// Logout route inside the refresh cookie's scope, where the browser sends
    /// both session cookies.
    #[must_use]
    pub fn scoped_logout_path(&self) -> String {
        format!("{}/logout/", self.refresh_path.trim_end_matches('/'))
    }

    fn build(
        &self,
        name: &'static str,
        value: String,
        path: String,
        max_age: Option<Duration>,
    ) -> Cookie<'static> {
        let mut cookie = Cookie::build((name, value))
            .path(path)
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build();
        if let Some(max_age) = max_age {
            cookie.set_max_age(max_age);
        }
        cookie
    }
}

fn positive_seconds(seconds: i64) -> Option<Duration> {
    (seconds > 0).then(|| Duration::seconds(seconds))
}
