use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_client::api_client::{ApiClient, SystemNavigator};
use resume_client::cli::{self, Cli};
use resume_client::config::Config;
use resume_client::errors::ClientError;
use resume_client::session::{FileStore, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Logs go to stderr; stdout carries command output only
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("Resume client v{} against {}", env!("CARGO_PKG_VERSION"), config.api_base_url);

    // Restore the persisted session, if any
    let session = SessionStore::new(Arc::new(FileStore::new(config.session_file.clone())));
    if let Some(restored) = session.restore() {
        debug!("Restored session for {}", restored.email);
    }

    let api = ApiClient::new(
        config.api_base_url.clone(),
        config.request_timeout,
        session,
        Arc::new(SystemNavigator),
    )?;

    if let Err(e) = cli::run(cli, &config, api).await {
        let (message, code) = match e.downcast_ref::<ClientError>() {
            Some(client_error) => (client_error.user_message(), client_error.kind().exit_code()),
            None => (format!("{e:#}"), 1),
        };
        eprintln!("error: {message}");
        std::process::exit(code);
    }

    Ok(())
}
