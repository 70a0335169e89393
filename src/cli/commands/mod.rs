pub mod backend;
pub mod cookies;
pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_PORT: &str = "port";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("authbridge")
        .about("Cookie-based session bridge for a token-issuing backend")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("AUTHBRIDGE_PORT")
                .value_parser(clap::value_parser!(u16)),
        );

    let command = backend::with_args(command);
    let command = cookies::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 9] = [
        "AUTHBRIDGE_PORT",
        "AUTHBRIDGE_AUTH_URL",
        "AUTHBRIDGE_API_URL",
        "AUTHBRIDGE_BACKEND_TIMEOUT_SECONDS",
        "AUTHBRIDGE_ENVIRONMENT",
        "AUTHBRIDGE_REFRESH_PATH",
        "AUTHBRIDGE_ACCESS_MAX_AGE_SECONDS",
        "AUTHBRIDGE_REFRESH_MAX_AGE_SECONDS",
        "AUTHBRIDGE_LOG_LEVEL",
    ];

    fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
        ALL_VARS.iter().map(|name| (*name, None)).collect()
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "authbridge");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Cookie-based session bridge for a token-issuing backend".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(cleared(), || {
            let matches = new().get_matches_from(vec!["authbridge"]);
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8080));
            assert_eq!(
                matches
                    .get_one::<String>(cookies::ARG_ENVIRONMENT)
                    .map(String::as_str),
                Some("production")
            );
            assert!(
                matches
                    .get_one::<String>(backend::ARG_AUTH_BASE_URL)
                    .is_none()
            );
        });
    }

    #[test]
    fn test_check_env() {
        let overrides = [
            ("AUTHBRIDGE_PORT", Some("443")),
            ("AUTHBRIDGE_AUTH_URL", Some("https://auth.tld/api/auth")),
            ("AUTHBRIDGE_REFRESH_PATH", Some("/bff/refresh/")),
            ("AUTHBRIDGE_LOG_LEVEL", Some("info")),
        ];
        let mut vars: Vec<_> = cleared()
            .into_iter()
            .filter(|(name, _)| !overrides.iter().any(|(set, _)| set == name))
            .collect();
        vars.extend(overrides);
        temp_env::with_vars(vars, || {
            let matches = new().get_matches_from(vec!["authbridge"]);
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(443));
            assert_eq!(
                matches.get_one::<String>(backend::ARG_AUTH_BASE_URL).cloned(),
                Some("https://auth.tld/api/auth".to_string())
            );
            assert_eq!(
                matches.get_one::<String>(cookies::ARG_REFRESH_PATH).cloned(),
                Some("/bff/refresh/".to_string())
            );
            assert_eq!(
                matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                Some(2)
            );
        });
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars(cleared(), || {
                let mut args = vec!["authbridge".to_string()];

                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }
}
