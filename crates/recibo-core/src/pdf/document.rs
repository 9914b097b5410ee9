//! PDF reading using lopdf, with pdf-extract as text fallback.

use std::path::Path;
use std::sync::OnceLock;

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PageSource, Result};
use crate::error::PdfError;

/// A loaded input PDF.
pub struct PdfDocument {
    document: Document,
    raw_data: Vec<u8>,
    /// Per-page text from pdf-extract, produced lazily on the first page
    /// where lopdf extraction fails.
    fallback_pages: OnceLock<Vec<String>>,
}

impl PdfDocument {
    /// Load a PDF from a file.
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| PdfError::Parse(e.to_string()))?;
        Self::load(&data)
    }

    /// Load a PDF from bytes.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document =
            Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty-password encryption
        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("decrypted PDF with empty password");
        }

        if document.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        Ok(Self {
            document,
            raw_data: data.to_vec(),
            fallback_pages: OnceLock::new(),
        })
    }

    /// The underlying lopdf document, for page-range extraction.
    pub fn inner(&self) -> &Document {
        &self.document
    }

    /// One-based page number for a zero-based index, validated.
    fn page_number(&self, index: usize) -> Result<u32> {
        if index >= self.page_count() {
            return Err(PdfError::InvalidPage(index));
        }
        Ok(index as u32 + 1)
    }

    /// Whole-document text from pdf-extract, split at its form-feed page
    /// separators.
    fn fallback_page_text(&self, index: usize) -> String {
        let pages = self.fallback_pages.get_or_init(|| {
            match pdf_extract::extract_text_from_mem(&self.raw_data) {
                Ok(text) => text.split('\u{c}').map(str::to_string).collect(),
                Err(err) => {
                    debug!("pdf-extract fallback failed: {err}");
                    Vec::new()
                }
            }
        });
        pages.get(index).cloned().unwrap_or_default()
    }

    /// Resources dictionary for a page, following Parent inheritance.
    fn page_resources(&self, page_id: ObjectId) -> Option<Dictionary> {
        let mut node_id = page_id;
        loop {
            let node = self.document.get_object(node_id).ok()?;
            let dict = node.as_dict().ok()?;

            if let Ok(resources) = dict.get(b"Resources") {
                if let Ok((_, Object::Dictionary(resources))) =
                    self.document.dereference(resources)
                {
                    return Some(resources.clone());
                }
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => node_id = *parent_id,
                _ => return None,
            }
        }
    }

    fn image_from_object(&self, object: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = object else {
            return None;
        };
        let dict = &stream.dict;

        let subtype = dict.get(b"Subtype").ok()?;
        if subtype.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
        trace!("found image object: {width}x{height}");

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(array) => array.first().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    // JPEG data, stream content is the encoded image
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("unsupported image filter on page image");
                    return None;
                }
                _ => {}
            }
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(array) => array.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self
                    .document
                    .get_object(*r)
                    .ok()
                    .and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            trace!("unsupported bits per component: {bits}");
            return None;
        }

        raw_image(&data, width, height, color_space)
    }

    /// All embedded images of a page, via its XObject resources.
    fn page_images(&self, index: usize) -> Result<Vec<DynamicImage>> {
        let number = self.page_number(index)?;
        let pages = self.document.get_pages();
        let page_id = pages.get(&number).ok_or(PdfError::InvalidPage(index))?;

        let mut images = Vec::new();
        if let Some(resources) = self.page_resources(*page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobjects))) =
                    self.document.dereference(xobjects)
                {
                    for (_name, reference) in xobjects.iter() {
                        if let Ok((_, object)) = self.document.dereference(reference) {
                            if let Some(image) = self.image_from_object(object) {
                                images.push(image);
                            }
                        }
                    }
                }
            }
        }

        debug!("extracted {} images from page {number}", images.len());
        Ok(images)
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        let number = self.page_number(index)?;
        match self.document.extract_text(&[number]) {
            Ok(text) => Ok(text),
            Err(err) => {
                debug!("lopdf text extraction failed on page {number}: {err}");
                Ok(self.fallback_page_text(index))
            }
        }
    }

    /// The largest embedded image of the page. Scanned receipts are a
    /// single full-page scan, so the largest XObject is the page itself.
    fn page_image(&self, index: usize) -> Result<DynamicImage> {
        let images = self.page_images(index)?;
        images
            .into_iter()
            .max_by_key(|image| image.width() as u64 * image.height() as u64)
            .ok_or_else(|| {
                PdfError::ImageExtraction(format!("no image on page {}", index + 1))
            })
    }
}

fn raw_image(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixel_count = (width * height) as usize;

    if color_space == b"DeviceRGB" || color_space == b"RGB" {
        let expected = pixel_count * 3;
        if data.len() < expected {
            return None;
        }
        let mut rgba = Vec::with_capacity(pixel_count * 4);
        for chunk in data[..expected].chunks_exact(3) {
            rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
        }
        return ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba)
            .map(DynamicImage::ImageRgba8);
    }

    if color_space == b"DeviceGray" || color_space == b"G" {
        if data.len() < pixel_count {
            return None;
        }
        let mut rgba = Vec::with_capacity(pixel_count * 4);
        for &gray in &data[..pixel_count] {
            rgba.extend_from_slice(&[gray, gray, gray, 255]);
        }
        return ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba)
            .map(DynamicImage::ImageRgba8);
    }

    trace!(
        "unsupported color space {:?}",
        String::from_utf8_lossy(color_space)
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::writer::tests::sample_document;

    #[test]
    fn test_load_rejects_empty_data() {
        assert!(PdfDocument::load(b"not a pdf").is_err());
    }

    #[test]
    fn test_page_text_roundtrip() {
        let mut doc = sample_document(&["FAVORECIDO: ACME LTDA", "VALOR: 1,00"]);
        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();

        let loaded = PdfDocument::load(&data).unwrap();
        assert_eq!(loaded.page_count(), 2);
        assert!(loaded.page_text(0).unwrap().contains("FAVORECIDO: ACME LTDA"));
        assert!(loaded.page_text(1).unwrap().contains("VALOR: 1,00"));
    }

    #[test]
    fn test_invalid_page_index() {
        let mut doc = sample_document(&["PAGINA"]);
        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();

        let loaded = PdfDocument::load(&data).unwrap();
        assert!(matches!(
            loaded.page_text(5),
            Err(PdfError::InvalidPage(5))
        ));
    }

    #[test]
    fn test_page_image_missing() {
        let mut doc = sample_document(&["SO TEXTO"]);
        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();

        let loaded = PdfDocument::load(&data).unwrap();
        assert!(loaded.page_image(0).is_err());
    }
}
