//! Book metadata record and local file naming.

use crate::config::ContentKind;
use crate::library::storage::UserId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const UNTITLED: &str = "Untitled";
const UNKNOWN_AUTHOR: &str = "Unknown author";
const DEFAULT_EXTENSION: &str = "pdf";
const MAX_COMPONENT_CHARS: usize = 50;

static RE_RESERVED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]"#).unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A book as described by the remote metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Document id.
    pub id: String,

    /// Book title.
    pub title: String,

    /// Author.
    pub author: String,

    /// Blob storage path of the uploaded file.
    pub storage_path: String,

    /// File extension without the dot.
    pub extension: String,
}

impl BookRecord {
    /// Build a record from possibly-missing store fields, applying fallbacks.
    pub fn from_fields(
        id: impl Into<String>,
        title: Option<String>,
        author: Option<String>,
        storage_path: Option<String>,
        extension: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.unwrap_or_else(|| UNTITLED.to_string()),
            author: author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            storage_path: storage_path.unwrap_or_default(),
            extension: extension
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
        }
    }

    /// Content kind implied by the stored extension.
    pub fn kind(&self) -> ContentKind {
        ContentKind::from_extension(&self.extension)
    }

    /// Where this book lives once downloaded for `user`.
    ///
    /// `<books_dir>/<user>/<author>_<title>_<id>.<ext>`
    pub fn local_file(&self, books_dir: &Path, user: &UserId) -> PathBuf {
        let ext = if self.extension.trim().is_empty() {
            DEFAULT_EXTENSION
        } else {
            self.extension.trim()
        };

        let file_name = format!(
            "{}_{}_{}.{}",
            sanitize_component(&self.author),
            sanitize_component(&self.title),
            self.id,
            ext
        );

        books_dir.join(user.as_str()).join(file_name)
    }

    /// Case-insensitive match on title or author.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query) || self.author.to_lowercase().contains(&query)
    }
}

/// Make a string safe to use inside a file name.
pub fn sanitize_component(input: &str) -> String {
    let replaced = RE_RESERVED.replace_all(input.trim(), "_");
    let collapsed = RE_WHITESPACE.replace_all(&replaced, "_");

    if collapsed.is_empty() {
        return "unknown".to_string();
    }

    collapsed.chars().take(MAX_COMPONENT_CHARS).collect()
}

/// Filter records by a search query; a blank query keeps everything.
pub fn search<'a>(records: &'a [BookRecord], query: &str) -> Vec<&'a BookRecord> {
    let query = query.trim();
    if query.is_empty() {
        return records.iter().collect();
    }

    records.iter().filter(|r| r.matches(query)).collect()
}
