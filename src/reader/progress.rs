//! Reading progress: scroll fraction, one-shot restore and persistence.

use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Upper bound applied to a restored fraction and to stored fractions.
///
/// Keeps a reopened book from looking finished, and keeps "near the end"
/// distinct from "nothing to scroll".
pub const MAX_RESTORED_FRACTION: f32 = 0.99;

/// Durable key-value storage for reading fractions.
pub trait ProgressStore: Send + Sync {
    /// Stored fraction for a key, if any.
    fn get_fraction(&self, key: &str) -> Result<Option<f32>>;

    /// Store a fraction, replacing any previous value.
    fn set_fraction(&self, key: &str, path: &Path, fraction: f32) -> Result<()>;

    /// Remove a stored fraction. Returns whether one existed.
    fn clear(&self, key: &str) -> Result<bool>;
}

/// Stable progress key for a local path.
pub fn progress_key(path: &Path) -> String {
    let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, path.to_string_lossy().as_bytes());
    format!("book_progress_{}", id)
}

/// Fraction for a scroll position.
///
/// With nothing to scroll the book counts as fully read once content is
/// ready, and unread otherwise.
pub fn compute_fraction(offset: u32, max: u32, content_ready: bool) -> f32 {
    if max > 0 {
        (offset as f32 / max as f32).clamp(0.0, 1.0)
    } else if content_ready {
        1.0
    } else {
        0.0
    }
}

/// Fraction as written to the store: finite and capped below 1.0.
pub fn stored_fraction(fraction: f32) -> f32 {
    if fraction.is_finite() {
        fraction.clamp(0.0, MAX_RESTORED_FRACTION)
    } else {
        0.0
    }
}

/// Scroll geometry as seen by the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollLayout {
    /// Content not measured yet; a zero extent here means nothing.
    #[default]
    Pending,
    /// Content measured.
    Measured {
        /// Current scroll offset in pixels.
        offset: u32,
        /// Maximum scroll offset in pixels; zero when everything fits.
        max: u32,
    },
}

/// One-shot restore of the saved position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RestoreState {
    /// Waiting for a measured layout to jump to `target`.
    NotRestored {
        /// Fraction to jump to, already clamped.
        target: f32,
    },
    /// Initial position applied, or found unnecessary.
    Restored,
}

impl RestoreState {
    /// Advance on a layout pass. Returns the scroll offset to jump to, once.
    ///
    /// A zero extent only completes the restore when content is ready,
    /// since before that it just means layout has not happened.
    pub fn advance(&mut self, layout: ScrollLayout, content_ready: bool) -> Option<u32> {
        let RestoreState::NotRestored { target } = *self else {
            return None;
        };
        let ScrollLayout::Measured { max, .. } = layout else {
            return None;
        };
        if !content_ready {
            return None;
        }

        *self = RestoreState::Restored;
        (max > 0).then(|| (max as f32 * target).round() as u32)
    }

    /// Whether the initial position has been handled.
    pub fn is_restored(&self) -> bool {
        matches!(self, RestoreState::Restored)
    }
}

/// Tracks and persists the reading position of one open file.
pub struct ProgressTracker {
    store: Arc<dyn ProgressStore>,
    path: PathBuf,
    key: String,
    restore: RestoreState,
    layout: ScrollLayout,
    content_ready: bool,
}

impl ProgressTracker {
    /// Read the saved position for `path` and wait for a layout to apply it.
    pub fn open(store: Arc<dyn ProgressStore>, path: &Path) -> Self {
        let key = progress_key(path);
        let mut tracker = Self {
            store,
            path: path.to_path_buf(),
            key,
            restore: RestoreState::Restored,
            layout: ScrollLayout::Pending,
            content_ready: false,
        };
        tracker.begin_load();
        tracker
    }

    /// Reset for a fresh load: re-read the saved fraction and arm the restore.
    pub fn begin_load(&mut self) {
        let saved = match self.store.get_fraction(&self.key) {
            Ok(saved) => saved.unwrap_or(0.0),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read progress");
                0.0
            }
        };

        let target = stored_fraction(saved);

        self.restore = RestoreState::NotRestored { target };
        self.layout = ScrollLayout::Pending;
        self.content_ready = false;
    }

    /// Progress key for this file.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current restore state.
    pub fn restore_state(&self) -> RestoreState {
        self.restore
    }

    /// Last known layout.
    pub fn layout(&self) -> ScrollLayout {
        self.layout
    }

    /// Record whether the load finished successfully with content.
    pub fn set_content_ready(&mut self, ready: bool) {
        self.content_ready = ready;
    }

    /// Observe a layout pass. Returns the initial scroll offset, at most once.
    ///
    /// Once an offset is known, later passes only update the extent; the
    /// offset itself changes through the restore jump or a settled scroll.
    pub fn on_layout(&mut self, layout: ScrollLayout) -> Option<u32> {
        self.layout = match (self.layout, layout) {
            (ScrollLayout::Measured { offset, .. }, ScrollLayout::Measured { max, .. }) => {
                ScrollLayout::Measured {
                    offset: offset.min(max),
                    max,
                }
            }
            _ => layout,
        };
        let target = self.restore.advance(layout, self.content_ready);
        if let Some(offset) = target {
            tracing::debug!(path = %self.path.display(), offset, "Restoring reading position");
            if let ScrollLayout::Measured { max, .. } = layout {
                self.layout = ScrollLayout::Measured { offset, max };
            }
        }
        target
    }

    /// Observe a settled scroll and persist the new fraction.
    ///
    /// Nothing is written until the restore has happened, so an early
    /// offset of zero cannot clobber the saved position.
    pub fn on_scroll_settled(&mut self, offset: u32, max: u32) -> f32 {
        self.layout = ScrollLayout::Measured { offset, max };

        let fraction = self.fraction();
        if self.restore.is_restored() && max > 0 {
            self.persist(fraction);
        }
        fraction
    }

    /// Current fraction in [0.0, 1.0].
    pub fn fraction(&self) -> f32 {
        match self.layout {
            ScrollLayout::Measured { offset, max } => {
                compute_fraction(offset, max, self.content_ready)
            }
            ScrollLayout::Pending => 0.0,
        }
    }

    /// Current fraction as a whole percentage.
    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }

    /// Best-effort write; losing one update is harmless.
    fn persist(&self, fraction: f32) {
        let stored = stored_fraction(fraction);
        if let Err(e) = self.store.set_fraction(&self.key, &self.path, stored) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to save progress");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn fraction_uses_extent_when_scrollable() {
        assert_eq!(compute_fraction(250, 1000, true), 0.25);
        assert_eq!(compute_fraction(0, 1000, false), 0.0);
        assert_eq!(compute_fraction(1200, 1000, true), 1.0);
    }

    #[test]
    fn fraction_without_scroll_range_depends_on_content() {
        assert_eq!(compute_fraction(0, 0, true), 1.0);
        assert_eq!(compute_fraction(0, 0, false), 0.0);
    }

    #[test]
    fn restore_waits_for_measured_layout() {
        let mut state = RestoreState::NotRestored { target: 0.5 };

        assert_eq!(state.advance(ScrollLayout::Pending, true), None);
        assert!(!state.is_restored());

        let unmeasured = ScrollLayout::Measured { offset: 0, max: 0 };
        assert_eq!(state.advance(unmeasured, false), None);
        assert!(!state.is_restored());

        let measured = ScrollLayout::Measured { offset: 0, max: 800 };
        assert_eq!(state.advance(measured, true), Some(400));
        assert!(state.is_restored());
    }

    #[test]
    fn restore_fires_at_most_once() {
        let mut state = RestoreState::NotRestored { target: 0.3 };
        let layout = ScrollLayout::Measured { offset: 0, max: 1000 };

        assert_eq!(state.advance(layout, true), Some(300));
        assert_eq!(state.advance(layout, true), None);
        assert_eq!(
            state.advance(ScrollLayout::Measured { offset: 0, max: 5000 }, true),
            None
        );
    }

    #[test]
    fn restore_completes_without_jump_when_nothing_scrolls() {
        let mut state = RestoreState::NotRestored { target: 0.7 };
        let fits = ScrollLayout::Measured { offset: 0, max: 0 };

        assert_eq!(state.advance(fits, true), None);
        assert!(state.is_restored());
    }

    #[derive(Default)]
    struct MemoryStore {
        values: parking_lot::Mutex<HashMap<String, f32>>,
    }

    impl ProgressStore for MemoryStore {
        fn get_fraction(&self, key: &str) -> Result<Option<f32>> {
            Ok(self.values.lock().get(key).copied())
        }

        fn set_fraction(&self, key: &str, _path: &Path, fraction: f32) -> Result<()> {
            self.values.lock().insert(key.to_string(), fraction);
            Ok(())
        }

        fn clear(&self, key: &str) -> Result<bool> {
            Ok(self.values.lock().remove(key).is_some())
        }
    }

    fn ready_tracker(saved: Option<f32>) -> ProgressTracker {
        let path = Path::new("/x/book.epub");
        let store = Arc::new(MemoryStore::default());
        if let Some(fraction) = saved {
            store.set_fraction(&progress_key(path), path, fraction).unwrap();
        }
        let mut tracker = ProgressTracker::open(store, path);
        tracker.set_content_ready(true);
        tracker
    }

    #[test]
    fn later_layout_pass_keeps_restored_offset() {
        let mut tracker = ready_tracker(Some(0.42));
        let pass = ScrollLayout::Measured { offset: 0, max: 1000 };

        assert_eq!(tracker.on_layout(pass), Some(420));
        assert_eq!(tracker.on_layout(pass), None);
        assert_eq!(tracker.layout(), ScrollLayout::Measured { offset: 420, max: 1000 });
        assert_eq!(tracker.percent(), 42);
    }

    #[test]
    fn layout_pass_after_scroll_only_changes_extent() {
        let mut tracker = ready_tracker(None);
        tracker.on_layout(ScrollLayout::Measured { offset: 0, max: 1000 });
        tracker.on_scroll_settled(600, 1000);

        tracker.on_layout(ScrollLayout::Measured { offset: 0, max: 2000 });
        assert_eq!(tracker.layout(), ScrollLayout::Measured { offset: 600, max: 2000 });

        tracker.on_layout(ScrollLayout::Measured { offset: 0, max: 400 });
        assert_eq!(tracker.layout(), ScrollLayout::Measured { offset: 400, max: 400 });
        assert_eq!(tracker.fraction(), 1.0);
    }

    #[test]
    fn stored_fraction_stays_below_one() {
        assert_eq!(stored_fraction(1.0), MAX_RESTORED_FRACTION);
        assert_eq!(stored_fraction(0.5), 0.5);
        assert_eq!(stored_fraction(-0.2), 0.0);
        assert_eq!(stored_fraction(f32::NAN), 0.0);
    }

    #[test]
    fn progress_key_is_stable_per_path() {
        let a = progress_key(Path::new("/x/book.epub"));
        let b = progress_key(Path::new("/x/book.epub"));
        let c = progress_key(Path::new("/x/other.epub"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("book_progress_"));
    }
}
