//! The document reader: loading, progress tracking and display settings.

mod display;
mod load;
mod progress;
mod session;

pub use display::{DisplayPreferences, FontSize, LineSpacing, Palette, Theme};
pub use load::{LoadController, LoadFailure, LoadRequest, LoadSnapshot, LoadState, run_load};
pub use progress::{
    MAX_RESTORED_FRACTION, ProgressStore, ProgressTracker, RestoreState, ScrollLayout,
    compute_fraction, progress_key, stored_fraction,
};
pub use session::{ReaderDeps, ReaderExit, ReaderSession, open_reader};
