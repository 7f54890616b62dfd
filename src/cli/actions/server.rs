use crate::{
    admin::AdminConfig,
    api::{self, ServerConfig},
};
use anyhow::Result;
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub public_base_url: String,
    pub media_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub admin_password: Option<SecretString>,
    pub admin_session_ttl_seconds: i64,
    pub admin_first_login_provisioning: bool,
    pub memory_admin_store: bool,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let admin = AdminConfig::new()
            .with_session_ttl_seconds(self.admin_session_ttl_seconds)
            .with_first_login_provisioning(self.admin_first_login_provisioning);

        ServerConfig {
            port: self.port,
            dsn: self.dsn,
            frontend_base_url: self.frontend_base_url,
            public_base_url: self.public_base_url,
            media_dir: self.media_dir,
            max_upload_bytes: self.max_upload_bytes,
            admin,
            admin_password: self.admin_password,
            memory_admin_store: self.memory_admin_store,
        }
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    info!(
        port = args.port,
        frontend = %args.frontend_base_url,
        media_dir = %args.media_dir.display(),
        "starting sanctuary {} ({})",
        env!("CARGO_PKG_VERSION"),
        crate::GIT_COMMIT_HASH
    );
    debug!("Server args: {:?}", args);

    api::new(args.into_config()).await
}
