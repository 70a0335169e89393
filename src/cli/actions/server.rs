use crate::{
    api,
    gateway::{BackendConfig, Gateway},
    session::{CookiePolicy, SessionManager},
};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Args {
    pub port: u16,
    pub auth_base_url: Option<String>,
    pub api_base_url: Option<String>,
    pub backend_timeout_seconds: u64,
    pub refresh_path: String,
    pub access_max_age_seconds: i64,
    pub refresh_max_age_seconds: i64,
    pub secure_cookies: bool,
}

impl Args {
    /// Build the session manager these arguments describe.
    ///
    /// # Errors
    /// Returns an error if a base URL is malformed, the timeout is zero, the
    /// refresh path is unusable, or the HTTP client cannot be built.
    pub fn session_manager(&self) -> Result<SessionManager> {
        let config = BackendConfig::new(self.auth_base_url.clone(), self.api_base_url.clone())?
            .with_timeout(Duration::from_secs(self.backend_timeout_seconds))?;

        let policy = CookiePolicy::default()
            .with_refresh_path(&self.refresh_path)?
            .with_access_max_age_seconds(self.access_max_age_seconds)
            .with_refresh_max_age_seconds(self.refresh_max_age_seconds)
            .with_secure(self.secure_cookies);

        let gateway = Gateway::new(config).context("failed to build backend HTTP client")?;

        Ok(SessionManager::new(gateway, policy))
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let manager = args.session_manager()?;

    if !args.secure_cookies {
        warn!("Session cookies are issued without the Secure flag");
    }

    api::new(args.port, Arc::new(manager)).await
}
