//! Map parsed CLI arguments to the action the binary runs.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, backend, cookies};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if an option is present but unusable.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let backend_opts = backend::Options::parse(matches)?;
    let cookie_opts = cookies::Options::parse(matches);

    let args = Args {
        port,
        auth_base_url: backend_opts.auth_base_url,
        api_base_url: backend_opts.api_base_url,
        backend_timeout_seconds: backend_opts.timeout_seconds,
        refresh_path: cookie_opts.refresh_path,
        access_max_age_seconds: cookie_opts.access_max_age_seconds,
        refresh_max_age_seconds: cookie_opts.refresh_max_age_seconds,
        secure_cookies: cookie_opts.secure,
    };

    // Fail at startup on malformed URLs or a bad refresh path rather than on
    // the first request.
    args.session_manager()?;

    Ok(Action::Server(args))
}
