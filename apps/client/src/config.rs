use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";
const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration loaded from environment variables.
/// Every variable has a default; only malformed values are errors.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub session_file: PathBuf,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub download_dir: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_base_url: std::env::var("RESUME_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            session_file: match std::env::var("RESUME_SESSION_FILE") {
                Ok(path) => PathBuf::from(path),
                Err(_) => default_session_file()?,
            },
            poll_interval: Duration::from_millis(parse_env(
                "RESUME_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
            request_timeout: Duration::from_secs(parse_env(
                "RESUME_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            download_dir: std::env::var("RESUME_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// `<config dir>/resume-enhancer/session.json`
fn default_session_file() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("resume-enhancer").join("session.json"))
        .context("No config directory found; set RESUME_SESSION_FILE")
}

fn parse_env(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
