//! Load controller: picks an extractor, runs it off the async threads and
//! commits the outcome only if the request is still current.

use crate::cancellation::CancellationToken;
use crate::config::{ContentKind, extension_of};
use crate::error::{FailureKind, GENERIC_FAILURE_MESSAGE, ReaderError, Result};
use crate::formats::{ContentPayload, ExtractorSet};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Identity of one load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// File being loaded.
    pub path: PathBuf,
    /// Monotonic reload token; a new value forces a fresh attempt.
    pub token: u64,
}

/// User-facing failure of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// Failure category.
    pub kind: FailureKind,
    /// Message safe to display.
    pub message: String,
}

impl From<&ReaderError> for LoadFailure {
    fn from(e: &ReaderError) -> Self {
        Self {
            kind: e.failure_kind(),
            message: e.user_message(),
        }
    }
}

/// Load lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Extraction in progress.
    Loading,
    /// Content available.
    Ready,
    /// Load failed; retry or delete the file.
    Failed(LoadFailure),
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, Default)]
pub struct LoadSnapshot {
    /// Request this state belongs to.
    pub request: Option<LoadRequest>,
    /// Lifecycle state.
    pub state: LoadState,
    /// Loaded content; `None` unless `state` is `Ready`.
    pub content: Arc<ContentPayload>,
}

impl LoadSnapshot {
    /// True when the load succeeded and there is something to show.
    pub fn content_ready(&self) -> bool {
        self.state == LoadState::Ready && self.content.has_content()
    }

    /// Failure details, if the load failed.
    pub fn failure(&self) -> Option<&LoadFailure> {
        match &self.state {
            LoadState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

struct RunningLoad {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
    request: LoadRequest,
}

/// Drives loads for one reader session.
///
/// `load` and `reload` spawn onto the current tokio runtime.
pub struct LoadController {
    extractors: ExtractorSet,
    shared: Arc<Mutex<LoadSnapshot>>,
    next_token: u64,
    running: Option<RunningLoad>,
}

impl LoadController {
    /// Create an idle controller.
    pub fn new(extractors: ExtractorSet) -> Self {
        Self {
            extractors,
            shared: Arc::new(Mutex::new(LoadSnapshot::default())),
            next_token: 0,
            running: None,
        }
    }

    /// Start loading `path`, superseding any load in flight.
    pub fn load(&mut self, path: impl Into<PathBuf>) -> LoadRequest {
        let request = LoadRequest {
            path: path.into(),
            token: self.bump_token(),
        };
        self.start(request.clone());
        request
    }

    /// Load the current path again with a new token.
    pub fn reload(&mut self) -> Option<LoadRequest> {
        let path = self.shared.lock().request.as_ref()?.path.clone();
        Some(self.load(path))
    }

    /// Request currently considered current.
    pub fn current(&self) -> Option<LoadRequest> {
        self.shared.lock().request.clone()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> LoadSnapshot {
        self.shared.lock().clone()
    }

    /// Wait for the current load to settle and return the resulting state.
    pub async fn wait(&mut self) -> LoadSnapshot {
        if let Some(running) = self.running.take() {
            let request = running.request;
            if let Err(e) = running.handle.await
                && e.is_panic()
            {
                tracing::error!(path = %request.path.display(), "Load task panicked");
                let fault = ReaderError::Internal("load task panicked".into());
                commit(&self.shared, &request, Err(fault));
            }
        }
        self.snapshot()
    }

    /// Cancel the load in flight, if any.
    pub fn cancel(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
            running.handle.abort();
        }
    }

    fn bump_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn start(&mut self, request: LoadRequest) {
        self.cancel();

        {
            let mut shared = self.shared.lock();
            shared.request = Some(request.clone());
            shared.state = LoadState::Loading;
            shared.content = Arc::new(ContentPayload::None);
        }

        tracing::debug!(path = %request.path.display(), token = request.token, "Starting load");

        let cancel = CancellationToken::new();
        let extractors = self.extractors.clone();
        let shared = Arc::clone(&self.shared);
        let task_request = request.clone();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let outcome = run_load(&extractors, &task_request.path, &task_cancel).await;
            commit(&shared, &task_request, outcome);
        });

        self.running = Some(RunningLoad {
            handle,
            cancel,
            request,
        });
    }
}

impl Drop for LoadController {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Apply an outcome if `request` is still current. Returns whether it was applied.
fn commit(
    shared: &Mutex<LoadSnapshot>,
    request: &LoadRequest,
    outcome: Result<ContentPayload>,
) -> bool {
    let mut shared = shared.lock();
    if shared.request.as_ref() != Some(request) {
        tracing::debug!(
            path = %request.path.display(),
            token = request.token,
            "Dropping stale load result"
        );
        return false;
    }

    match outcome {
        Ok(content) => {
            tracing::info!(path = %request.path.display(), "Book loaded");
            shared.state = LoadState::Ready;
            shared.content = Arc::new(content);
        }
        Err(e) => {
            tracing::warn!(path = %request.path.display(), error = %e, "Book failed to load");
            shared.state = LoadState::Failed(LoadFailure::from(&e));
            shared.content = Arc::new(ContentPayload::None);
        }
    }
    true
}

/// Load one file: existence check, format dispatch and blocking extraction.
///
/// Extractor panics are reported as internal errors, never propagated.
pub async fn run_load(
    extractors: &ExtractorSet,
    path: &Path,
    cancel: &CancellationToken,
) -> Result<ContentPayload> {
    if !tokio::fs::try_exists(path).await? {
        return Err(ReaderError::NotFound(path.to_path_buf()));
    }

    let kind = ContentKind::detect(path);
    let Some(extractor) = extractors.get(kind) else {
        return Err(ReaderError::UnsupportedFormat(extension_of(path)));
    };

    tracing::debug!(path = %path.display(), kind = ?kind, "Dispatching extractor");

    let owned_path = path.to_path_buf();
    let task_cancel = cancel.clone();
    let payload = tokio::task::spawn_blocking(move || extractor.extract(&owned_path, &task_cancel))
        .await
        .map_err(|e| ReaderError::Internal(format!("Extractor task failed: {}", e)))??;

    match &payload {
        ContentPayload::Pages(pages) if pages.is_empty() => {
            Err(ReaderError::Render("No pages rendered".into()))
        }
        ContentPayload::None => Err(ReaderError::Internal(GENERIC_FAILURE_MESSAGE.into())),
        _ => Ok(payload),
    }
}
