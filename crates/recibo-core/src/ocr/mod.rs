//! OCR fallback for pages without an extractable text layer.

mod preprocessing;

#[cfg(feature = "ocr")]
mod engine;

pub use preprocessing::ImagePreprocessor;

#[cfg(feature = "ocr")]
pub use engine::TesseractEngine;

use image::DynamicImage;

use crate::error::OcrError;

/// Result type for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;

/// Text recognition backend.
///
/// Implementations receive an already-cleaned page image and return
/// whatever text they can read; an empty string is a valid result for a
/// blank page.
pub trait OcrEngine {
    /// Recognize text in the image.
    fn recognize(&self, image: &DynamicImage) -> Result<String>;
}
