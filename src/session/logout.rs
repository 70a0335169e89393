use super::{
    ACCESS_COOKIE_NAME, CookieStore, REFRESH_COOKIE_NAME, SessionManager, types::LogoutOutcome,
};
use tracing::{error, info, instrument};

impl SessionManager {
    /// Remove whichever session cookies are present. Calling it again is harmless.
    ///
    /// Outside the refresh path the browser never sends the refresh cookie, so
    /// a request that only carries the access cookie also gets an expired
    /// refresh cookie on the refresh path.
    #[instrument(skip_all)]
    pub fn logout<S: CookieStore>(&self, store: &mut S) -> LogoutOutcome {
        let has_access = store.has(ACCESS_COOKIE_NAME);
        let has_refresh = store.has(REFRESH_COOKIE_NAME);

        if !has_access && !has_refresh {
            info!("no authentication cookies found to clear");
            return LogoutOutcome::NothingToClear;
        }

        if has_access {
            if let Err(err) = store.remove(self.policy.access_removal()) {
                error!("failed to clear access cookie: {err}");
                return LogoutOutcome::Failed(err.to_string());
            }
        }
        // Must use the refresh path; a removal at "/" leaves the cookie in place.
        let cleared = if has_refresh {
            store.remove(self.policy.refresh_removal())
        } else {
            store.set(self.policy.refresh_expiry())
        };
        if let Err(err) = cleared {
            error!("failed to clear refresh cookie: {err}");
            return LogoutOutcome::Failed(err.to_string());
        }

        info!("cleared authentication cookies");

        LogoutOutcome::Cleared
    }
}
