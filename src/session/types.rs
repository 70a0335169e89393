//! Values exchanged between the UI layer, the session manager, and the backend.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use utoipa::ToSchema;

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful!";
pub const INVALID_INPUT_MESSAGE: &str = "Invalid input.";
pub const INVALID_AUTH_RESPONSE_MESSAGE: &str =
    "Authentication failed: Invalid response from authentication server.";
pub const UNKNOWN_LOGIN_ERROR_MESSAGE: &str = "An unknown error occurred during login.";
pub const LOGOUT_SUCCESS_MESSAGE: &str = "Logged out successfully.";
pub const LOGOUT_NOTHING_MESSAGE: &str = "No authentication cookies found to clear.";
pub const REFRESH_SUCCESS_MESSAGE: &str = "Session refreshed.";
pub const REFRESH_MISSING_MESSAGE: &str = "No refresh token found.";

/// Per-field validation messages, in field-name order.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Raw login form as submitted by the browser. Missing fields are empty.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default, Clone)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    #[schema(format = Password)]
    pub password: String,
}

/// Validated credentials. Only lives for the duration of one exchange.
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    /// Validate a submitted form.
    ///
    /// # Errors
    /// Returns the per-field messages when `username` or `password` is empty.
    pub fn from_form(form: LoginForm) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        if form.username.is_empty() {
            errors
                .entry("username".to_string())
                .or_default()
                .push("Username is required".to_string());
        }
        if form.password.is_empty() {
            errors
                .entry("password".to_string())
                .or_default()
                .push("Password is required".to_string());
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            username: form.username,
            password: SecretString::from(form.password),
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// JSON body for the token-issuance endpoint.
    pub(super) fn to_json(&self) -> Value {
        json!({
            "username": self.username,
            "password": self.password.expose_secret(),
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Opaque bearer tokens issued by the identity backend.
pub struct TokenPair {
    pub access: SecretString,
    pub refresh: SecretString,
}

impl TokenPair {
    /// Extract both tokens from a token-issuance response.
    ///
    /// Returns `None` unless `access` and `refresh` are both non-empty strings.
    #[must_use]
    pub fn from_response(body: Option<&Value>) -> Option<Self> {
        let body = body?;
        let access = non_empty_str(body, "access")?;
        let refresh = non_empty_str(body, "refresh")?;
        Some(Self {
            access: SecretString::from(access),
            refresh: SecretString::from(refresh),
        })
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"***")
            .field("refresh", &"***")
            .finish()
    }
}

pub(super) fn non_empty_str(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Uniform result handed back to the UI after every session action.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ActionResult {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            field_errors: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            field_errors: None,
        }
    }
}

/// Terminal states of the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Input was rejected before any network call.
    ValidationFailed(FieldErrors),
    /// The backend refused, was unreachable, or answered without a token pair.
    AuthFailed(String),
    /// The cookie store refused a write; no session was established.
    StoreFailed(String),
    /// Both cookies were written.
    Success,
}

impl From<LoginOutcome> for ActionResult {
    fn from(outcome: LoginOutcome) -> Self {
        match outcome {
            LoginOutcome::ValidationFailed(errors) => Self {
                success: false,
                message: INVALID_INPUT_MESSAGE.to_string(),
                field_errors: Some(errors),
            },
            LoginOutcome::AuthFailed(message) | LoginOutcome::StoreFailed(message) => {
                Self::failed(message)
            }
            LoginOutcome::Success => Self::ok(LOGIN_SUCCESS_MESSAGE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// At least one cookie was removed.
    Cleared,
    /// Nothing to remove; still a success.
    NothingToClear,
    Failed(String),
}

impl From<LogoutOutcome> for ActionResult {
    fn from(outcome: LogoutOutcome) -> Self {
        match outcome {
            LogoutOutcome::Cleared => Self::ok(LOGOUT_SUCCESS_MESSAGE),
            LogoutOutcome::NothingToClear => Self::ok(LOGOUT_NOTHING_MESSAGE),
            LogoutOutcome::Failed(message) => Self::failed(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No refresh cookie was presented; nothing was sent upstream.
    MissingToken,
    AuthFailed { status: u16, message: String },
    StoreFailed(String),
    /// A new access cookie was written; `rotated` when the refresh cookie was replaced too.
    Refreshed { rotated: bool },
}

impl From<RefreshOutcome> for ActionResult {
    fn from(outcome: RefreshOutcome) -> Self {
        match outcome {
            RefreshOutcome::MissingToken => Self::failed(REFRESH_MISSING_MESSAGE),
            RefreshOutcome::AuthFailed { message, .. } | RefreshOutcome::StoreFailed(message) => {
                Self::failed(message)
            }
            RefreshOutcome::Refreshed { .. } => Self::ok(REFRESH_SUCCESS_MESSAGE),
        }
    }
}
