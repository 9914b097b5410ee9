//! Tesseract-backed text recognition.

use std::io::Cursor;

use image::DynamicImage;
use leptess::{LepTess, Variable};
use tracing::debug;

use super::{OcrEngine, Result};
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Tesseract engine configured for sparse Portuguese/English receipt text.
pub struct TesseractEngine {
    config: OcrConfig,
}

impl TesseractEngine {
    /// Create an engine, failing fast when the language data is missing.
    pub fn new(config: OcrConfig) -> Result<Self> {
        LepTess::new(None, &config.languages).map_err(|e| {
            OcrError::Init(format!(
                "failed to initialize Tesseract with language '{}': {e}",
                config.languages
            ))
        })?;
        Ok(Self { config })
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let mut engine = LepTess::new(None, &self.config.languages)
            .map_err(|e| OcrError::Init(e.to_string()))?;

        engine
            .set_variable(
                Variable::TesseditPagesegMode,
                &self.config.page_seg_mode.to_string(),
            )
            .map_err(|e| OcrError::Init(format!("failed to set page segmentation mode: {e}")))?;

        // leptess expects encoded image data
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;
        engine
            .set_image_from_mem(png.get_ref())
            .map_err(|e| OcrError::Recognition(e.to_string()))?;
        engine.set_source_resolution(self.config.source_dpi as i32);

        let text = engine
            .get_utf8_text()
            .map_err(|e| OcrError::Recognition(e.to_string()))?;
        debug!("OCR produced {} characters", text.len());
        Ok(text)
    }
}
