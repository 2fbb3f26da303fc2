//! Poll ownership for the viewed resume.
//!
//! A `PollHandle` is the only owner of its task; dropping it cancels the
//! token and aborts the task. `ResumeWatcher` keeps at most one handle, so
//! switching resumes always stops the previous poller before the next starts.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::ClientError;
use crate::lifecycle::backend::ResumeBackend;
use crate::lifecycle::tracker::ResumeTracker;

/// Fetches until the resume settles, the session dies, or `cancel` fires.
/// Transient fetch errors are retried on the next tick.
pub async fn poll_until_settled(
    tracker: Arc<ResumeTracker>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let resume_id = tracker.resume_id();
    loop {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = tracker.refresh() => outcome,
        };

        match outcome {
            Ok(state) if !state.needs_polling() => {
                info!("Resume {resume_id} settled as {state:?}; polling stopped");
                break;
            }
            Ok(_) => {}
            Err(ClientError::Unauthorized) => {
                warn!("Polling for resume {resume_id} stopped: session is no longer valid");
                break;
            }
            Err(e) => warn!("Polling resume {resume_id} failed, retrying next tick: {e}"),
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    debug!("Poll task for resume {resume_id} exited");
}

pub struct PollHandle {
    resume_id: i64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn spawn(tracker: Arc<ResumeTracker>, interval: Duration) -> Self {
        let resume_id = tracker.resume_id();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_until_settled(tracker, interval, cancel.clone()));
        debug!("Started poller for resume {resume_id}");
        Self {
            resume_id,
            cancel,
            task,
        }
    }

    pub fn resume_id(&self) -> i64 {
        self.resume_id
    }

    /// True once the loop has exited on its own or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.task.abort();
        debug!("Stopped poller for resume {}", self.resume_id);
    }
}

struct ActiveWatch {
    tracker: Arc<ResumeTracker>,
    poll: PollHandle,
}

/// Owns the tracker and poller for whichever resume is being viewed.
pub struct ResumeWatcher {
    backend: Arc<dyn ResumeBackend>,
    interval: Duration,
    active: Option<ActiveWatch>,
}

impl ResumeWatcher {
    pub fn new(backend: Arc<dyn ResumeBackend>, interval: Duration) -> Self {
        Self {
            backend,
            interval,
            active: None,
        }
    }

    /// Starts tracking `resume_id`. Watching the id already being watched
    /// returns the existing tracker; any other id replaces it.
    pub fn watch(&mut self, resume_id: i64) -> Arc<ResumeTracker> {
        if let Some(active) = &self.active {
            if active.tracker.resume_id() == resume_id {
                return active.tracker.clone();
            }
        }
        self.stop();

        let tracker = Arc::new(ResumeTracker::new(self.backend.clone(), resume_id));
        let poll = PollHandle::spawn(tracker.clone(), self.interval);
        self.active = Some(ActiveWatch {
            tracker: tracker.clone(),
            poll,
        });
        tracker
    }

    pub fn current(&self) -> Option<Arc<ResumeTracker>> {
        self.active.as_ref().map(|a| a.tracker.clone())
    }

    pub fn is_polling(&self) -> bool {
        self.active
            .as_ref()
            .map(|a| !a.poll.is_finished())
            .unwrap_or(false)
    }

    /// Leaves the detail view: cancels the poller and forgets the tracker.
    pub fn stop(&mut self) {
        self.active.take();
    }
}
