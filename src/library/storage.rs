//! Interfaces to the auth provider and blob storage, and the download flow
//! that turns a remote book into a local file the reader can open.

use crate::error::{ReaderError, Result};
use crate::library::book::BookRecord;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identifier of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Borrow as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Source of the signed-in user.
pub trait AuthProvider: Send + Sync {
    /// Currently signed-in user, if any.
    fn current_user(&self) -> Option<UserId>;
}

/// Remote file storage.
pub trait BlobStorage: Send + Sync {
    /// Copy the object at `storage_path` into `dest`.
    fn download(&self, storage_path: &str, dest: &Path) -> Result<()>;
}

/// Blob storage backed by a directory, e.g. a mounted bucket.
pub struct FsBlobStorage {
    root: PathBuf,
}

impl FsBlobStorage {
    /// Serve objects from below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BlobStorage for FsBlobStorage {
    fn download(&self, storage_path: &str, dest: &Path) -> Result<()> {
        let source = self.root.join(storage_path.trim_start_matches('/'));
        if !source.is_file() {
            return Err(ReaderError::Storage(format!(
                "Object not found: {}",
                storage_path
            )));
        }
        std::fs::copy(&source, dest)?;
        Ok(())
    }
}

/// Whether the book has already been downloaded for `user`.
pub fn is_downloaded(record: &BookRecord, books_dir: &Path, user: &UserId) -> bool {
    record.local_file(books_dir, user).exists()
}

/// Download a book for the signed-in user and return its local path.
///
/// A zero-length file left by a failed transfer is removed.
pub fn materialize(
    record: &BookRecord,
    books_dir: &Path,
    auth: &dyn AuthProvider,
    storage: &dyn BlobStorage,
) -> Result<PathBuf> {
    let user = auth.current_user().ok_or(ReaderError::Unauthenticated)?;
    if record.storage_path.trim().is_empty() {
        return Err(ReaderError::Storage(format!(
            "No storage path for book {}",
            record.id
        )));
    }

    let local = record.local_file(books_dir, &user);
    if let Some(parent) = local.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::debug!(
        book = %record.id,
        path = %local.display(),
        "Downloading book"
    );

    if let Err(e) = storage.download(&record.storage_path, &local) {
        if std::fs::metadata(&local).is_ok_and(|m| m.len() == 0) {
            let _ = std::fs::remove_file(&local);
        }
        return Err(e);
    }

    Ok(local)
}

/// Remove the local copy of a book. Returns whether a file was removed.
pub fn delete_local_copy(record: &BookRecord, books_dir: &Path, user: &UserId) -> Result<bool> {
    let local = record.local_file(books_dir, user);
    match std::fs::remove_file(&local) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
