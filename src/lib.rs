//! # Authbridge (server-side session bridge)
//!
//! `authbridge` sits between a browser client and a remote identity backend that
//! issues access/refresh token pairs. Browsers never see the tokens: they are
//! exchanged server-to-server and persisted as `HttpOnly` cookies.
//!
//! ## Components
//!
//! - **Gateway** ([`gateway`]): resolves a logical endpoint against the "auth" or
//!   "api" upstream base URL, performs the call without caching, and normalizes
//!   success and failure into one shape.
//! - **Session manager** ([`session`]): validates credentials, exchanges them for a
//!   token pair, and sets or clears the two session cookies.
//!
//! ## Cookie scopes
//!
//! - `access_token` is scoped to the whole site (`Path=/`).
//! - `refresh_token` is scoped to the refresh endpoint only, so the long-lived
//!   credential is never sent on unrelated requests.
//!
//! Login is all-or-nothing: either both cookies are written or neither is.

pub mod api;
pub mod cli;
pub mod gateway;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
