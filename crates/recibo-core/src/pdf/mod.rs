//! PDF processing module.

mod document;
mod writer;

pub use document::PdfDocument;
pub use writer::{extract_pages, merge_documents, save_pages};

use image::DynamicImage;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Read-side interface over a paged document.
///
/// Page indices are zero-based. `page_text` returns an empty string for a
/// page without a text layer; an `Err` means the page itself is broken.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Extract the text layer of a page.
    fn page_text(&self, index: usize) -> Result<String>;

    /// Obtain an image of the page suitable for OCR.
    fn page_image(&self, index: usize) -> Result<DynamicImage>;
}
