use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_ADMIN_PASSWORD: &str = "admin-password";
pub const ARG_ADMIN_SESSION_TTL_SECONDS: &str = "admin-session-ttl-seconds";
pub const ARG_ADMIN_FIRST_LOGIN_PROVISIONING: &str = "admin-first-login-provisioning";
pub const ARG_MEMORY_ADMIN_STORE: &str = "memory-admin-store";

/// One year.
pub const MAX_SESSION_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ADMIN_PASSWORD)
                .long(ARG_ADMIN_PASSWORD)
                .help("Admin password stored on startup when none is set yet")
                .env("SANCTUARY_ADMIN_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_ADMIN_SESSION_TTL_SECONDS)
                .long(ARG_ADMIN_SESSION_TTL_SECONDS)
                .help("Admin session lifetime in seconds")
                .env("SANCTUARY_ADMIN_SESSION_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_SESSION_TTL_SECONDS)),
        )
        .arg(
            Arg::new(ARG_ADMIN_FIRST_LOGIN_PROVISIONING)
                .long(ARG_ADMIN_FIRST_LOGIN_PROVISIONING)
                .help("Let the first login set the admin password when none is stored")
                .env("SANCTUARY_ADMIN_FIRST_LOGIN_PROVISIONING")
                .default_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new(ARG_MEMORY_ADMIN_STORE)
                .long(ARG_MEMORY_ADMIN_STORE)
                .help("Keep the admin password and session in memory instead of the database")
                .env("SANCTUARY_MEMORY_ADMIN_STORE")
                .action(ArgAction::SetTrue),
        )
}

#[derive(Debug)]
pub struct Options {
    pub password: Option<SecretString>,
    pub session_ttl_seconds: i64,
    pub first_login_provisioning: bool,
    pub memory_store: bool,
}

impl Options {
    /// Parse admin options from CLI matches.
    ///
    /// # Errors
    /// Returns an error if a provided password is blank.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let password = match matches.get_one::<String>(ARG_ADMIN_PASSWORD) {
            Some(password) if password.trim().is_empty() => {
                anyhow::bail!("--{ARG_ADMIN_PASSWORD} must not be blank")
            }
            Some(password) => Some(SecretString::from(password.clone())),
            None => None,
        };

        Ok(Self {
            password,
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_ADMIN_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(86_400),
            first_login_provisioning: matches
                .get_one::<bool>(ARG_ADMIN_FIRST_LOGIN_PROVISIONING)
                .copied()
                .unwrap_or(true),
            memory_store: matches.get_flag(ARG_MEMORY_ADMIN_STORE),
        })
    }
}
