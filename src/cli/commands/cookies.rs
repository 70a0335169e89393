use crate::session::cookies::DEFAULT_REFRESH_PATH;
use clap::{Arg, ArgMatches, Command, builder::PossibleValuesParser};

pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_REFRESH_PATH: &str = "refresh-path";
pub const ARG_ACCESS_MAX_AGE_SECONDS: &str = "access-max-age-seconds";
pub const ARG_REFRESH_MAX_AGE_SECONDS: &str = "refresh-max-age-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub secure: bool,
    pub refresh_path: String,
    pub access_max_age_seconds: i64,
    pub refresh_max_age_seconds: i64,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        // Cookies are Secure everywhere except an explicit development run.
        let secure = matches
            .get_one::<String>(ARG_ENVIRONMENT)
            .is_none_or(|environment| environment != "development");

        Self {
            secure,
            refresh_path: matches
                .get_one::<String>(ARG_REFRESH_PATH)
                .cloned()
                .unwrap_or_else(|| DEFAULT_REFRESH_PATH.to_string()),
            access_max_age_seconds: matches
                .get_one::<i64>(ARG_ACCESS_MAX_AGE_SECONDS)
                .copied()
                .unwrap_or(3600),
            refresh_max_age_seconds: matches
                .get_one::<i64>(ARG_REFRESH_MAX_AGE_SECONDS)
                .copied()
                .unwrap_or(604_800),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .long(ARG_ENVIRONMENT)
                .help("Deployment environment; cookies drop the Secure flag only in development")
                .env("AUTHBRIDGE_ENVIRONMENT")
                .default_value("production")
                .value_parser(PossibleValuesParser::new(["production", "development"])),
        )
        .arg(
            Arg::new(ARG_REFRESH_PATH)
                .long(ARG_REFRESH_PATH)
                .help("Path the refresh cookie is scoped to; the refresh endpoint is served here")
                .env("AUTHBRIDGE_REFRESH_PATH")
                .default_value(DEFAULT_REFRESH_PATH),
        )
        .arg(
            Arg::new(ARG_ACCESS_MAX_AGE_SECONDS)
                .long(ARG_ACCESS_MAX_AGE_SECONDS)
                .help("Access cookie lifetime in seconds (0 for a browser-session cookie)")
                .env("AUTHBRIDGE_ACCESS_MAX_AGE_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64).range(0..)),
        )
        .arg(
            Arg::new(ARG_REFRESH_MAX_AGE_SECONDS)
                .long(ARG_REFRESH_MAX_AGE_SECONDS)
                .help("Refresh cookie lifetime in seconds (0 for a browser-session cookie)")
                .env("AUTHBRIDGE_REFRESH_MAX_AGE_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64).range(0..)),
        )
}
