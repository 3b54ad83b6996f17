//! Plain text extractor.

use crate::cancellation::CancellationToken;
use crate::error::Result;
use crate::formats::{ContentExtractor, ContentPayload};
use std::path::Path;

/// Reads the whole file as one string.
pub struct TextExtractor;

impl ContentExtractor for TextExtractor {
    fn extract(&self, path: &Path, _cancel: &CancellationToken) -> Result<ContentPayload> {
        let bytes = std::fs::read(path)?;
        // Malformed sequences become U+FFFD rather than failing the load.
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Ok(ContentPayload::Text(text))
    }
}
