//! One open document: title, load state, progress and display settings.

use crate::config::ContentKind;
use crate::error::Result;
use crate::formats::ExtractorSet;
use crate::reader::display::DisplayPreferences;
use crate::reader::load::{LoadController, LoadRequest, LoadSnapshot, LoadState};
use crate::reader::progress::{ProgressStore, ProgressTracker, ScrollLayout};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Collaborators injected into a session.
#[derive(Clone)]
pub struct ReaderDeps {
    /// Extractors used for loading.
    pub extractors: ExtractorSet,
    /// Durable progress storage.
    pub progress: Arc<dyn ProgressStore>,
    /// Initial display preferences.
    pub display: DisplayPreferences,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    /// Closed normally.
    Closed,
    /// Local file deleted after a failed load; the caller should leave the reader.
    FileDeleted {
        /// Whether there was a file to delete.
        existed: bool,
    },
}

/// An open reader for one local file.
pub struct ReaderSession {
    title: String,
    path: PathBuf,
    kind: ContentKind,
    loader: LoadController,
    progress: ProgressTracker,
    display: DisplayPreferences,
}

/// Open a reader for `path` and start loading it.
///
/// Must be called from within a tokio runtime.
pub fn open_reader(
    title: impl Into<String>,
    path: impl Into<PathBuf>,
    deps: ReaderDeps,
) -> ReaderSession {
    let title = title.into();
    let path = path.into();
    let kind = ContentKind::detect(&path);

    tracing::info!(title = %title, path = %path.display(), kind = ?kind, "Opening reader");

    // Restore read happens here, before any write for this path.
    let progress = ProgressTracker::open(deps.progress, &path);
    let mut loader = LoadController::new(deps.extractors);
    loader.load(path.clone());

    ReaderSession {
        title,
        path,
        kind,
        loader,
        progress,
        display: deps.display,
    }
}

impl ReaderSession {
    /// Title shown in the header.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Local file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Detected content kind.
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Current display preferences.
    pub fn display(&self) -> &DisplayPreferences {
        &self.display
    }

    /// Change display preferences for the rest of the session.
    pub fn set_display(&mut self, display: DisplayPreferences) {
        self.display = display;
    }

    /// Current load state and content.
    pub fn snapshot(&self) -> LoadSnapshot {
        self.loader.snapshot()
    }

    /// Wait until the current load settles.
    pub async fn wait_loaded(&mut self) -> LoadSnapshot {
        let snapshot = self.loader.wait().await;
        self.progress.set_content_ready(snapshot.content_ready());
        snapshot
    }

    /// Load the same file again with a fresh token.
    pub fn reload(&mut self) -> Option<LoadRequest> {
        self.progress.begin_load();
        self.loader.reload()
    }

    /// Retry after a failure; does nothing unless the load failed.
    pub fn retry(&mut self) -> Option<LoadRequest> {
        if !matches!(self.loader.snapshot().state, LoadState::Failed(_)) {
            return None;
        }
        self.reload()
    }

    /// Observe a layout pass. Returns the initial scroll offset, at most once.
    pub fn on_layout(&mut self, layout: ScrollLayout) -> Option<u32> {
        self.sync_content_ready();
        self.progress.on_layout(layout)
    }

    /// Observe a settled scroll; persists and returns the fraction.
    pub fn on_scroll_settled(&mut self, offset: u32, max: u32) -> f32 {
        self.sync_content_ready();
        self.progress.on_scroll_settled(offset, max)
    }

    /// Reading progress in [0.0, 1.0].
    pub fn progress_fraction(&self) -> f32 {
        self.progress.fraction()
    }

    /// Reading progress as a whole percentage.
    pub fn progress_percent(&self) -> u32 {
        self.progress.percent()
    }

    /// Progress tracker for this session.
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Delete the local file and end the session.
    ///
    /// Idempotent: a missing file is not an error.
    pub fn delete_and_exit(mut self) -> Result<ReaderExit> {
        self.loader.cancel();

        let existed = match std::fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        tracing::info!(path = %self.path.display(), existed, "Deleted local book file");
        Ok(ReaderExit::FileDeleted { existed })
    }

    /// End the session. Only the saved progress outlives it.
    pub fn close(mut self) -> ReaderExit {
        self.loader.cancel();
        tracing::debug!(path = %self.path.display(), "Closing reader");
        ReaderExit::Closed
    }

    fn sync_content_ready(&mut self) {
        let ready = self.loader.snapshot().content_ready();
        self.progress.set_content_ready(ready);
    }
}
