//! EPUB text extractor.
//!
//! Content documents are read in entry-name order rather than spine order.
//! This is a known approximation: books whose file names do not sort in
//! reading order come out shuffled.

use crate::cancellation::CancellationToken;
use crate::error::Result;
use crate::formats::{ContentExtractor, ContentPayload};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Returned when the archive holds no HTML/XHTML documents.
pub const NO_READABLE_PAGES_TEXT: &str = "This EPUB file contains no readable HTML pages.";

/// Returned when every content document extracts to blank text.
pub const EXTRACTION_FAILED_TEXT: &str = "Could not extract text from this EPUB.";

static RE_SCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<script.*?</script>").unwrap());
static RE_STYLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<style.*?</style>").unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Handler for EPUB files.
pub struct EpubExtractor;

impl EpubExtractor {
    /// Check if an entry name is a content document.
    fn is_content_document(name: &str) -> bool {
        let lower = name.to_lowercase();
        lower.ends_with(".xhtml") || lower.ends_with(".html") || lower.ends_with(".htm")
    }

    /// Get sorted list of content documents in the archive.
    fn content_documents(archive: &mut ZipArchive<File>) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            if !entry.is_dir() && Self::is_content_document(entry.name()) {
                names.push(entry.name().to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Reduce one markup document to a single line of plain text.
    pub(crate) fn markup_to_text(raw: &str) -> String {
        let without_scripts = RE_SCRIPT.replace_all(raw, " ");
        let without_styles = RE_STYLE.replace_all(&without_scripts, " ");
        let without_tags = RE_TAG.replace_all(&without_styles, " ");

        RE_WHITESPACE
            .replace_all(&without_tags, " ")
            .trim()
            .to_string()
    }
}

impl ContentExtractor for EpubExtractor {
    fn extract(&self, path: &Path, cancel: &CancellationToken) -> Result<ContentPayload> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;

        let documents = Self::content_documents(&mut archive)?;
        if documents.is_empty() {
            tracing::debug!(path = %path.display(), "EPUB has no content documents");
            return Ok(ContentPayload::Text(NO_READABLE_PAGES_TEXT.to_string()));
        }

        let mut parts = Vec::with_capacity(documents.len());
        for name in &documents {
            cancel.check_cancelled("epub document")?;

            let mut raw = Vec::new();
            archive.by_name(name)?.read_to_end(&mut raw)?;

            let plain = Self::markup_to_text(&String::from_utf8_lossy(&raw));
            if !plain.is_empty() {
                parts.push(plain);
            }
        }

        tracing::debug!(
            path = %path.display(),
            documents = documents.len(),
            non_blank = parts.len(),
            "Extracted EPUB text"
        );

        if parts.is_empty() {
            return Ok(ContentPayload::Text(EXTRACTION_FAILED_TEXT.to_string()));
        }

        Ok(ContentPayload::Text(parts.join("\n\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::EpubExtractor;

    #[test]
    fn markup_drops_scripts_styles_and_tags() {
        let raw = "<html><head><style>p { color: red; }</style>\
                   <script type=\"text/javascript\">var x = '<p>';</script></head>\
                   <body><h1>Title</h1>\n\n<p>First   line</p></body></html>";
        assert_eq!(EpubExtractor::markup_to_text(raw), "Title First line");
    }

    #[test]
    fn markup_blocks_span_lines() {
        let raw = "<script>\nalert(1);\n</script><p>kept</p><style>\nbody{}\n</style>";
        assert_eq!(EpubExtractor::markup_to_text(raw), "kept");
    }

    #[test]
    fn content_document_extensions_ignore_case() {
        assert!(EpubExtractor::is_content_document("OEBPS/ch1.XHTML"));
        assert!(EpubExtractor::is_content_document("text/part.htm"));
        assert!(!EpubExtractor::is_content_document("content.opf"));
        assert!(!EpubExtractor::is_content_document("images/cover.jpg"));
    }
}
