//! Map validated CLI arguments to the action the binary runs.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{admin, media, ARG_DSN, ARG_FRONTEND_BASE_URL, ARG_PORT};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let frontend_base_url = matches
        .get_one::<String>(ARG_FRONTEND_BASE_URL)
        .cloned()
        .context("missing required argument: --frontend-base-url")?;

    let media_dir = matches
        .get_one::<String>(media::ARG_MEDIA_DIR)
        .map(PathBuf::from)
        .context("missing required argument: --media-dir")?;
    let public_base_url = matches
        .get_one::<String>(media::ARG_PUBLIC_BASE_URL)
        .cloned()
        .context("missing required argument: --public-base-url")?;
    let max_upload_bytes = matches
        .get_one::<usize>(media::ARG_MAX_UPLOAD_BYTES)
        .copied()
        .context("missing required argument: --max-upload-bytes")?;

    let admin = admin::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        frontend_base_url,
        public_base_url,
        media_dir,
        max_upload_bytes,
        admin_password: admin.password,
        admin_session_ttl_seconds: admin.session_ttl_seconds,
        admin_first_login_provisioning: admin.first_login_provisioning,
        memory_admin_store: admin.memory_store,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn builds_server_args() {
        temp_env::with_vars(
            [
                (
                    "SANCTUARY_DSN",
                    Some("postgres://sanctuary@localhost:5432/sanctuary"),
                ),
                ("SANCTUARY_ADMIN_PASSWORD", Some("hallelujah")),
                ("SANCTUARY_MEDIA_DIR", Some("/var/lib/sanctuary")),
                ("SANCTUARY_ADMIN_SESSION_TTL_SECONDS", None),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["sanctuary"]);
                let result = handler(&matches);
                assert!(result.is_ok());
                if let Ok(Action::Server(args)) = result {
                    assert_eq!(args.media_dir, PathBuf::from("/var/lib/sanctuary"));
                    assert_eq!(args.admin_session_ttl_seconds, 86_400);
                    assert_eq!(
                        args.admin_password
                            .as_ref()
                            .map(|password| password.expose_secret().to_string()),
                        Some("hallelujah".to_string())
                    );
                }
            },
        );
    }

    #[test]
    fn blank_admin_password_is_rejected() {
        temp_env::with_vars(
            [
                (
                    "SANCTUARY_DSN",
                    Some("postgres://sanctuary@localhost:5432/sanctuary"),
                ),
                ("SANCTUARY_ADMIN_PASSWORD", Some("   ")),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["sanctuary"]);
                let result = handler(&matches);
                assert!(result.is_err());
                if let Err(err) = result {
                    assert!(err.to_string().contains("must not be blank"));
                }
            },
        );
    }
}
