use serde::Serialize;

use crate::models::Resume;

/// Where a resume is in server-side processing, as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No fetch has completed yet.
    Loading,
    /// Uploaded, text not extracted yet.
    Pending,
    /// Text extracted, structured parse still running.
    Processing,
    Ready,
    Failed,
}

impl LifecycleState {
    /// Classifies a fetched resume. A parse error wins over parsed data.
    pub fn of(resume: &Resume) -> Self {
        if resume.parse_error {
            LifecycleState::Failed
        } else if resume.parsed_json.is_some() {
            LifecycleState::Ready
        } else if resume.raw_text.is_some() {
            LifecycleState::Processing
        } else {
            LifecycleState::Pending
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Ready | LifecycleState::Failed)
    }

    /// Whether the poller should fetch again after observing this state.
    pub fn needs_polling(self) -> bool {
        !self.is_terminal()
    }

    pub fn label(self) -> &'static str {
        match self {
            LifecycleState::Loading => "Loading...",
            LifecycleState::Pending => "Waiting for upload processing",
            LifecycleState::Processing => "Processing...",
            LifecycleState::Ready => "Ready for enhancement",
            LifecycleState::Failed => "Processing failed",
        }
    }
}
