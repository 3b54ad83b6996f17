//! Library glue around the reader: book records, local copies and the
//! collaborator interfaces they depend on.

pub mod book;
pub mod storage;

pub use book::{BookRecord, sanitize_component, search};
pub use storage::{
    AuthProvider, BlobStorage, FsBlobStorage, UserId, delete_local_copy, is_downloaded,
    materialize,
};
