use tracing::{info, warn};

use crate::errors::ClientError;

/// Where the client sends the user when it has to leave the current view.
pub trait Navigator: Send + Sync {
    /// Forced sign-out: the session has already been cleared.
    fn to_login(&self);

    /// Opens an external URL, e.g. a generated PDF.
    fn open(&self, url: &str) -> Result<(), ClientError>;
}

/// Terminal navigator: logs the sign-out and hands URLs to the OS opener.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNavigator;

impl Navigator for SystemNavigator {
    fn to_login(&self) {
        warn!("Session expired or revoked. Run `resume-client login` to sign in again.");
    }

    fn open(&self, url: &str) -> Result<(), ClientError> {
        info!("Opening {url}");
        open::that(url)?;
        Ok(())
    }
}
