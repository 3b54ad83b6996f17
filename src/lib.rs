//! ebook-reader: the document reader core of an e-book library.
//!
//! Opens local plain text, PDF and EPUB files, loads them off the async
//! threads with stale-result protection, and keeps a persisted reading
//! position per file.
//!
//! # Features
//!
//! - Format detection by extension
//! - Plain text, EPUB text extraction and PDF page rasterization
//! - Cancellable loads with retry and delete-on-failure actions
//! - Scroll fraction tracking with one-shot restore
//! - SQLite-backed progress store
//! - Display presets (font size, line spacing, theme)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Cooperative cancellation.
pub mod cancellation;
/// Configuration and CLI.
pub mod config;
/// Database operations.
pub mod db;
/// Error types.
pub mod error;
/// Content extractors.
pub mod formats;
/// Book records and local copies.
pub mod library;
/// Reader sessions.
pub mod reader;


pub use config::{Cli, Command, Config, ContentKind};
pub use db::Database;
pub use error::{FailureKind, ReaderError, Result};
pub use reader::{ReaderSession, open_reader};
