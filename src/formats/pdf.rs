//! PDF page renderer.
//!
//! Page geometry comes from `lopdf`; pixels come from a [`PageRasterizer`].
//! The page list is all-or-nothing: a single failing page fails the load.

use crate::cancellation::CancellationToken;
use crate::error::{ReaderError, Result};
use crate::formats::{ContentExtractor, ContentPayload, RasterImage};
use image::RgbaImage;
use lopdf::{Dictionary, Document, Object, ObjectId};
use once_cell::sync::OnceCell;
use pdfium_render::prelude::{PdfBitmapFormat, PdfRenderConfig, Pdfium};
use std::path::Path;
use std::sync::Arc;

/// US Letter, used when a page carries no usable MediaBox.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Parent chain depth limit when resolving inherited page attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Size of one page, in points and in target pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// Zero-based page index in document order.
    pub index: usize,
    /// Width in points after applying `/Rotate`.
    pub width_pt: f32,
    /// Height in points after applying `/Rotate`.
    pub height_pt: f32,
    /// Target raster width.
    pub pixel_width: u32,
    /// Target raster height, keeping the page aspect ratio.
    pub pixel_height: u32,
}

impl PageLayout {
    fn new(index: usize, width_pt: f32, height_pt: f32, render_width: u32) -> Self {
        let pixel_width = render_width.max(1);
        let pixel_height = ((pixel_width as f32) * height_pt / width_pt).round().max(1.0) as u32;

        Self {
            index,
            width_pt,
            height_pt,
            pixel_width,
            pixel_height,
        }
    }
}

/// Rasterizes every page of a PDF file.
pub trait PageRasterizer: Send + Sync {
    /// Render the pages described by `layout`, in order, one image each.
    ///
    /// Native handles must be released before returning, whatever the outcome.
    fn rasterize(
        &self,
        path: &Path,
        layout: &[PageLayout],
        cancel: &CancellationToken,
    ) -> Result<Vec<RgbaImage>>;
}

/// Handler for PDF files.
pub struct PdfRenderer {
    rasterizer: Arc<dyn PageRasterizer>,
    render_width: u32,
}

impl PdfRenderer {
    /// Create a renderer producing pages `render_width` pixels wide.
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, render_width: u32) -> Self {
        Self {
            rasterizer,
            render_width,
        }
    }

    /// Compute the page layout in document order.
    pub fn layout(&self, path: &Path) -> Result<Vec<PageLayout>> {
        let doc = Document::load(path).map_err(|e| ReaderError::Render(e.to_string()))?;

        // get_pages() returns BTreeMap<u32, ObjectId> keyed by 1-based page number
        let layout = doc
            .get_pages()
            .values()
            .enumerate()
            .map(|(index, &page_id)| {
                let (width, height) = Self::page_size(&doc, page_id);
                PageLayout::new(index, width, height, self.render_width)
            })
            .collect();

        Ok(layout)
    }

    /// Page size in points with rotation applied.
    fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
        let (width, height) = Self::inherited(doc, page_id, b"MediaBox")
            .and_then(|obj| Self::media_box(doc, obj))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let rotate = Self::inherited(doc, page_id, b"Rotate")
            .and_then(Self::number)
            .map(|r| (r as i64).rem_euclid(360))
            .unwrap_or(0);

        if rotate == 90 || rotate == 270 {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Look up a page attribute, walking `/Parent` for inherited values.
    fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
        let mut dict: &Dictionary = doc.get_dictionary(page_id).ok()?;

        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Some(Self::resolve(doc, value));
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = doc.get_dictionary(parent).ok()?;
        }

        None
    }

    fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    fn number(obj: &Object) -> Option<f32> {
        match obj {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(r) => Some(*r as f32),
            _ => None,
        }
    }

    /// Width and height of a `[llx lly urx ury]` rectangle.
    fn media_box(doc: &Document, obj: &Object) -> Option<(f32, f32)> {
        let Object::Array(values) = obj else {
            return None;
        };

        let coords: Vec<f32> = values
            .iter()
            .filter_map(|v| Self::number(Self::resolve(doc, v)))
            .collect();

        let &[llx, lly, urx, ury] = coords.as_slice() else {
            return None;
        };

        let width = (urx - llx).abs();
        let height = (ury - lly).abs();
        (width > 0.0 && height > 0.0).then_some((width, height))
    }
}

impl ContentExtractor for PdfRenderer {
    fn extract(&self, path: &Path, cancel: &CancellationToken) -> Result<ContentPayload> {
        let start = std::time::Instant::now();
        let layout = self.layout(path)?;
        if layout.is_empty() {
            return Err(ReaderError::Render("PDF has no pages".into()));
        }

        let images = self.rasterizer.rasterize(path, &layout, cancel)?;
        if images.len() != layout.len() {
            return Err(ReaderError::Render(format!(
                "Rasterizer returned {} pages, expected {}",
                images.len(),
                layout.len()
            )));
        }

        let pages: Vec<RasterImage> = layout
            .iter()
            .zip(images)
            .map(|(page, image)| RasterImage {
                page_index: page.index,
                source_width: page.width_pt,
                source_height: page.height_pt,
                image,
            })
            .collect();

        tracing::debug!(
            path = %path.display(),
            pages = pages.len(),
            elapsed = ?start.elapsed(),
            "Rendered PDF"
        );

        Ok(ContentPayload::Pages(pages))
    }
}

/// Process-wide Pdfium bindings; bound on first use.
static PDFIUM: OnceCell<Pdfium> = OnceCell::new();

/// Rasterizer backed by the Pdfium library found on the system.
///
/// `PDFIUM_LIB_PATH` may point at a specific library file.
#[derive(Default)]
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    /// Create a rasterizer; the library is bound lazily.
    pub fn new() -> Self {
        Self
    }

    fn pdfium() -> Result<&'static Pdfium> {
        PDFIUM.get_or_try_init(|| {
            let bindings = match std::env::var("PDFIUM_LIB_PATH") {
                Ok(path) => Pdfium::bind_to_library(path),
                Err(_) => Pdfium::bind_to_system_library(),
            }
            .map_err(|e| ReaderError::Render(format!("Failed to bind Pdfium: {}", e)))?;

            Ok(Pdfium::new(bindings))
        })
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        path: &Path,
        layout: &[PageLayout],
        cancel: &CancellationToken,
    ) -> Result<Vec<RgbaImage>> {
        let pdfium = Self::pdfium()?;

        // Document and page handles close on drop, on every exit path.
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| ReaderError::Render(e.to_string()))?;

        let mut images = Vec::with_capacity(layout.len());
        for (page, target) in document.pages().iter().zip(layout) {
            cancel.check_cancelled("pdf page")?;

            let config = PdfRenderConfig::new()
                .set_target_size(target.pixel_width as i32, target.pixel_height as i32)
                .set_format(PdfBitmapFormat::BGRA)
                .set_reverse_byte_order(false);

            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| ReaderError::Render(format!("page {}: {}", target.index + 1, e)))?;

            let width = bitmap.width().max(0) as u32;
            let height = bitmap.height().max(0) as u32;
            let image = bgra_to_rgba(&bitmap.as_raw_bytes(), width, height).ok_or_else(|| {
                ReaderError::Render(format!("page {}: bad bitmap size", target.index + 1))
            })?;

            images.push(image);
        }

        Ok(images)
    }
}

/// Convert a Pdfium BGRA buffer, whose rows may be padded, into an RGBA image.
fn bgra_to_rgba(raw: &[u8], width: u32, height: u32) -> Option<RgbaImage> {
    if width == 0 || height == 0 {
        return None;
    }

    let stride = raw.len() / height as usize;
    let row_bytes = width as usize * 4;
    if stride < row_bytes {
        return None;
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in raw.chunks_exact(stride).take(height as usize) {
        for bgra in row[..row_bytes].chunks_exact(4) {
            pixels.extend_from_slice(&[bgra[2], bgra[1], bgra[0], bgra[3]]);
        }
    }

    RgbaImage::from_raw(width, height, pixels)
}

#[cfg(test)]
mod tests {
    use super::bgra_to_rgba;

    #[test]
    fn bgra_rows_are_swizzled_and_unpadded() {
        // 1x2 image, each row padded to 8 bytes
        let raw = [3, 2, 1, 255, 0, 0, 0, 0, 30, 20, 10, 128, 0, 0, 0, 0];
        let image = bgra_to_rgba(&raw, 1, 2).unwrap();

        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3, 255]);
        assert_eq!(image.get_pixel(0, 1).0, [10, 20, 30, 128]);
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(bgra_to_rgba(&[0; 4], 2, 1).is_none());
        assert!(bgra_to_rgba(&[], 0, 0).is_none());
    }
}
