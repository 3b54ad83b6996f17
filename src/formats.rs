mod epub;
mod pdf;
mod text;

pub use epub::{EXTRACTION_FAILED_TEXT, EpubExtractor, NO_READABLE_PAGES_TEXT};
pub use pdf::{PageLayout, PageRasterizer, PdfRenderer, PdfiumRasterizer};
pub use text::TextExtractor;

use crate::cancellation::CancellationToken;
use crate::config::{ContentKind, ReaderConfig};
use crate::error::Result;
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;

/// One rasterized PDF page.
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// Zero-based page index in document order.
    pub page_index: usize,
    /// Page width in PDF points, after rotation.
    pub source_width: f32,
    /// Page height in PDF points, after rotation.
    pub source_height: f32,
    /// Rendered pixels.
    pub image: RgbaImage,
}

impl RasterImage {
    /// Pixel width.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Pixel height.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Width over height of the rendered image.
    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height().max(1) as f32
    }

    /// Width over height of the source page.
    pub fn source_aspect_ratio(&self) -> f32 {
        self.source_width / self.source_height
    }
}

/// Renderable representation of a book.
#[derive(Debug, Clone, Default)]
pub enum ContentPayload {
    /// Flowing text (plain text and EPUB).
    Text(String),
    /// Page images in document order (PDF).
    Pages(Vec<RasterImage>),
    /// Nothing loaded.
    #[default]
    None,
}

impl ContentPayload {
    /// Text body, if this is a text payload.
    pub fn text(&self) -> Option<&str> {
        match self {
            ContentPayload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Page images, if this is a page payload.
    pub fn pages(&self) -> Option<&[RasterImage]> {
        match self {
            ContentPayload::Pages(pages) => Some(pages),
            _ => None,
        }
    }

    /// True when a text or page payload is present.
    pub fn has_content(&self) -> bool {
        !matches!(self, ContentPayload::None)
    }
}

/// Trait for format-specific content extractors.
pub trait ContentExtractor: Send + Sync {
    /// Turn a local file into a renderable payload.
    fn extract(&self, path: &Path, cancel: &CancellationToken) -> Result<ContentPayload>;
}

/// Extractors for every supported kind.
#[derive(Clone)]
pub struct ExtractorSet {
    text: Arc<dyn ContentExtractor>,
    pdf: Arc<dyn ContentExtractor>,
    epub: Arc<dyn ContentExtractor>,
}

impl ExtractorSet {
    /// Default extractors, rasterizing PDF pages with the system Pdfium library.
    pub fn new(config: &ReaderConfig) -> Self {
        Self::with_rasterizer(config, Arc::new(PdfiumRasterizer::new()))
    }

    /// Default extractors with a custom PDF rasterizer.
    pub fn with_rasterizer(config: &ReaderConfig, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self {
            text: Arc::new(TextExtractor),
            pdf: Arc::new(PdfRenderer::new(rasterizer, config.render_width)),
            epub: Arc::new(EpubExtractor),
        }
    }

    /// Replace the extractor used for one kind.
    pub fn with_extractor(
        mut self,
        kind: ContentKind,
        extractor: Arc<dyn ContentExtractor>,
    ) -> Self {
        match kind {
            ContentKind::PlainText => self.text = extractor,
            ContentKind::Pdf => self.pdf = extractor,
            ContentKind::Epub => self.epub = extractor,
            ContentKind::Unsupported => {}
        }
        self
    }

    /// Get the extractor for a kind; `None` for unsupported kinds.
    pub fn get(&self, kind: ContentKind) -> Option<Arc<dyn ContentExtractor>> {
        match kind {
            ContentKind::PlainText => Some(Arc::clone(&self.text)),
            ContentKind::Pdf => Some(Arc::clone(&self.pdf)),
            ContentKind::Epub => Some(Arc::clone(&self.epub)),
            ContentKind::Unsupported => None,
        }
    }
}
