use anyhow::Result;
use clap::{Arg, ArgMatches, Command};

pub const ARG_AUTH_BASE_URL: &str = "auth-base-url";
pub const ARG_API_BASE_URL: &str = "api-base-url";
pub const ARG_BACKEND_TIMEOUT_SECONDS: &str = "backend-timeout-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub auth_base_url: Option<String>,
    pub api_base_url: Option<String>,
    pub timeout_seconds: u64,
}

impl Options {
    /// Read the upstream settings. Missing base URLs are allowed here; calls
    /// against an unconfigured class fail when they are made.
    ///
    /// # Errors
    /// Returns an error if the timeout is zero.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let timeout_seconds = matches
            .get_one::<u64>(ARG_BACKEND_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(10);
        if timeout_seconds == 0 {
            anyhow::bail!("--{ARG_BACKEND_TIMEOUT_SECONDS} must be greater than zero");
        }

        Ok(Self {
            auth_base_url: matches.get_one::<String>(ARG_AUTH_BASE_URL).cloned(),
            api_base_url: matches.get_one::<String>(ARG_API_BASE_URL).cloned(),
            timeout_seconds,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AUTH_BASE_URL)
                .long(ARG_AUTH_BASE_URL)
                .help("Base URL of the token-issuing backend, e.g. https://auth.example.com/api/auth")
                .env("AUTHBRIDGE_AUTH_URL"),
        )
        .arg(
            Arg::new(ARG_API_BASE_URL)
                .long(ARG_API_BASE_URL)
                .help("Base URL of the resource backend, e.g. https://api.example.com/api")
                .env("AUTHBRIDGE_API_URL"),
        )
        .arg(
            Arg::new(ARG_BACKEND_TIMEOUT_SECONDS)
                .long(ARG_BACKEND_TIMEOUT_SECONDS)
                .help("Per-request timeout for backend calls, in seconds")
                .env("AUTHBRIDGE_BACKEND_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64)),
        )
}
