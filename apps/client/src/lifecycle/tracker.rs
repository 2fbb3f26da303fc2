//! Resume Lifecycle Tracker: client-side state for the currently viewed resume.
//!
//! Each `refresh()` is one fetch: the result is classified, recorded in the
//! observation history and published on a watch channel. A `Ready` fetch
//! loads the enhanced versions before the new state is published, so a view
//! that wakes on `Ready` already sees them. Until one version load succeeds,
//! every `Ready` refresh tries again and the failure stays in `last_error`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::errors::ClientError;
use crate::lifecycle::backend::ResumeBackend;
use crate::lifecycle::state::LifecycleState;
use crate::lifecycle::versions::{EnhancedVersion, SuggestionDraft, VersionCollection, VersionKey};
use crate::models::{
    AnalyzeRequest, EnhanceRequest, Mode, Resume, SuggestionRequest, TranslateRequest,
};

/// User-chosen knobs shared by every enhancement-type request.
#[derive(Debug, Clone, Default)]
pub struct EnhancementOptions {
    pub job_description: Option<String>,
    pub output_language: Option<String>,
    pub mode: Mode,
}

impl EnhancementOptions {
    /// Blank job descriptions are sent as absent.
    fn job_description(&self) -> Option<String> {
        self.job_description
            .as_deref()
            .map(str::trim)
            .filter(|jd| !jd.is_empty())
            .map(str::to_string)
    }
}

/// A consistent copy of the tracker's state for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerSnapshot {
    pub resume_id: i64,
    pub state: LifecycleState,
    pub resume: Option<Resume>,
    pub versions: VersionCollection,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct TrackerInner {
    state: LifecycleState,
    resume: Option<Resume>,
    versions: VersionCollection,
    history: Vec<LifecycleState>,
    last_error: Option<String>,
    versions_loaded: bool,
}

pub struct ResumeTracker {
    resume_id: i64,
    backend: Arc<dyn ResumeBackend>,
    inner: Mutex<TrackerInner>,
    state_tx: watch::Sender<LifecycleState>,
    in_flight: AtomicBool,
}

impl ResumeTracker {
    pub fn new(backend: Arc<dyn ResumeBackend>, resume_id: i64) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Loading);
        Self {
            resume_id,
            backend,
            inner: Mutex::new(TrackerInner {
                state: LifecycleState::Loading,
                resume: None,
                versions: VersionCollection::new(),
                history: Vec::new(),
                last_error: None,
                versions_loaded: false,
            }),
            state_tx,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn resume_id(&self) -> i64 {
        self.resume_id
    }

    /// The last published state.
    pub fn state(&self) -> LifecycleState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    pub async fn snapshot(&self) -> TrackerSnapshot {
        let inner = self.inner.lock().await;
        TrackerSnapshot {
            resume_id: self.resume_id,
            state: inner.state,
            resume: inner.resume.clone(),
            versions: inner.versions.clone(),
            last_error: inner.last_error.clone(),
        }
    }

    /// Every state observed, one entry per successful fetch.
    pub async fn history(&self) -> Vec<LifecycleState> {
        self.inner.lock().await.history.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Fetching
    // ────────────────────────────────────────────────────────────────────────

    /// Fetches the resume once and applies the resulting transition.
    pub async fn refresh(&self) -> Result<LifecycleState, ClientError> {
        let resume = match self.backend.get_resume(self.resume_id).await {
            Ok(resume) => resume,
            Err(e) => {
                self.record_error(&e).await;
                return Err(e);
            }
        };

        let next = LifecycleState::of(&resume);
        let (previous, versions_loaded) = {
            let mut inner = self.inner.lock().await;
            let previous = inner.state;
            inner.state = next;
            inner.resume = Some(resume);
            inner.history.push(next);
            inner.last_error = None;
            (previous, inner.versions_loaded)
        };

        if previous != next {
            info!(
                "Resume {} lifecycle: {:?} -> {:?}",
                self.resume_id, previous, next
            );
        }

        if next == LifecycleState::Ready && !versions_loaded {
            if let Err(e) = self.reload_versions().await {
                warn!(
                    "Resume {} is ready but its enhanced versions failed to load: {e}",
                    self.resume_id
                );
            }
        }

        self.state_tx.send_replace(next);
        Ok(next)
    }

    /// Re-fetches the enhanced versions. The server list replaces the local
    /// one, dropping any transient suggestion drafts.
    pub async fn reload_versions(&self) -> Result<usize, ClientError> {
        match self.backend.get_enhanced_versions(self.resume_id).await {
            Ok(versions) => {
                let mut inner = self.inner.lock().await;
                inner.versions.replace_from_server(versions);
                inner.versions_loaded = true;
                Ok(inner.versions.len())
            }
            Err(e) => {
                self.record_error(&e).await;
                Err(e)
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Enhancement requests
    // ────────────────────────────────────────────────────────────────────────

    /// `POST /analyze`, always forcing a fresh result.
    pub async fn analyze(
        &self,
        options: &EnhancementOptions,
    ) -> Result<EnhancedVersion, ClientError> {
        let _guard = self.begin_request()?;
        let request = AnalyzeRequest {
            resume_id: self.resume_id,
            job_description: options.job_description(),
            mode: options.mode,
            force_refresh: Some(true),
        };
        let enhanced = self.finish(self.backend.analyze(&request).await).await?;
        Ok(self.adopt(EnhancedVersion::Stored(enhanced)).await)
    }

    /// `POST /enhance`
    pub async fn enhance(
        &self,
        options: &EnhancementOptions,
    ) -> Result<EnhancedVersion, ClientError> {
        let _guard = self.begin_request()?;
        let request = EnhanceRequest {
            resume_id: self.resume_id,
            job_description: options.job_description(),
            output_language: options.output_language.clone(),
            mode: options.mode,
        };
        let enhanced = self.finish(self.backend.enhance(&request).await).await?;
        Ok(self.adopt(EnhancedVersion::Stored(enhanced)).await)
    }

    /// `POST /translate` of the whole resume.
    pub async fn translate(
        &self,
        target_lang: &str,
        mode: Mode,
    ) -> Result<EnhancedVersion, ClientError> {
        if target_lang.trim().is_empty() {
            return Err(ClientError::Validation(
                "Target language is required".to_string(),
            ));
        }
        let _guard = self.begin_request()?;
        let request = TranslateRequest {
            resume_id: Some(self.resume_id),
            text: None,
            target_lang: target_lang.trim().to_string(),
            mode,
        };
        let enhanced = self.finish(self.backend.translate(&request).await).await?;
        Ok(self.adopt(EnhancedVersion::Stored(enhanced)).await)
    }

    /// `POST /suggestions`. The answer is not stored server-side, so it is
    /// kept as a transient draft until the next version re-fetch.
    pub async fn suggest(
        &self,
        options: &EnhancementOptions,
    ) -> Result<EnhancedVersion, ClientError> {
        let _guard = self.begin_request()?;
        let request = SuggestionRequest {
            resume_id: self.resume_id,
            job_description: options.job_description(),
            mode: options.mode,
        };
        let suggestions = self.finish(self.backend.suggestions(&request).await).await?;
        let draft = SuggestionDraft::new(self.resume_id, suggestions);
        Ok(self.adopt(EnhancedVersion::Transient(draft)).await)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Selection
    // ────────────────────────────────────────────────────────────────────────

    pub async fn select_version(&self, key: VersionKey) -> bool {
        self.inner.lock().await.versions.select(key)
    }

    pub async fn selected(&self) -> Option<EnhancedVersion> {
        self.inner.lock().await.versions.selected().cloned()
    }

    /// Server id of the selected version, for the export endpoints.
    pub async fn selected_export_id(&self) -> Result<i64, ClientError> {
        match self.selected().await {
            None => Err(ClientError::Validation(
                "Select an enhanced version to export".to_string(),
            )),
            Some(version) => version.exportable_id().ok_or_else(|| {
                ClientError::ExportUnavailable(
                    "Suggestion drafts are not stored on the server and cannot be exported"
                        .to_string(),
                )
            }),
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Internals
    // ────────────────────────────────────────────────────────────────────────

    fn begin_request(&self) -> Result<InFlight<'_>, ClientError> {
        let state = self.state();
        if state != LifecycleState::Ready {
            return Err(ClientError::Validation(format!(
                "Resume {} is not ready for enhancement ({})",
                self.resume_id,
                state.label()
            )));
        }
        InFlight::acquire(&self.in_flight)
    }

    async fn finish<T>(&self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(e) = &result {
            self.record_error(e).await;
        }
        result
    }

    async fn adopt(&self, version: EnhancedVersion) -> EnhancedVersion {
        let mut inner = self.inner.lock().await;
        inner.versions.push_selected(version.clone());
        inner.last_error = None;
        info!(
            "Resume {} gained {:?} version {:?}",
            self.resume_id,
            version.enhancement_type(),
            version.key()
        );
        version
    }

    async fn record_error(&self, e: &ClientError) {
        self.inner.lock().await.last_error = Some(e.user_message());
    }
}

/// Holds the tracker's single request slot until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ClientError> {
        if flag.swap(true, Ordering::AcqRel) {
            Err(ClientError::Busy)
        } else {
            Ok(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
