//! Per-page classification: text acquisition, field extraction, OCR
//! fallback.

use tracing::{debug, warn};

use crate::models::receipt::{
    PAYROLL_LABEL, ReceiptPage, UNDEFINED_AMOUNT, UNDEFINED_BENEFICIARY,
};
use crate::ocr::{ImagePreprocessor, OcrEngine};
use crate::pdf::PageSource;

use super::rules::{extract_amount, extract_beneficiary};

/// Upper-cases page text for matching; `None` when there is nothing to
/// match. This is the single gate that decides whether the OCR fallback is
/// attempted for a page.
pub fn normalize(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_uppercase())
    }
}

/// Monotonic merge of an extraction result with a fallback candidate: a
/// defined value is never replaced by a still-undefined one.
pub fn keep_defined(existing: String, candidate: String) -> String {
    if existing.contains("INDEFINIDO") && !candidate.contains("INDEFINIDO") {
        candidate
    } else {
        existing
    }
}

/// Classifies the pages of a document into [`ReceiptPage`] records.
pub struct PageClassifier<'a> {
    ocr: Option<&'a dyn OcrEngine>,
    preprocessor: ImagePreprocessor,
}

impl<'a> PageClassifier<'a> {
    /// Classifier without OCR fallback.
    pub fn new() -> Self {
        Self {
            ocr: None,
            preprocessor: ImagePreprocessor::new(),
        }
    }

    /// Enable the OCR fallback for pages whose fields stay undefined.
    pub fn with_ocr(mut self, engine: &'a dyn OcrEngine) -> Self {
        self.ocr = Some(engine);
        self
    }

    /// Classify every page of `source` in order.
    pub fn classify_document(&self, source: &dyn PageSource) -> Vec<ReceiptPage> {
        (0..source.page_count())
            .map(|index| self.classify_page(source, index))
            .collect()
    }

    /// Classify a single page. Never fails: a page that cannot be read at
    /// all becomes a doubly-undefined record so the document keeps going.
    pub fn classify_page(&self, source: &dyn PageSource, index: usize) -> ReceiptPage {
        let raw_text = match source.page_text(index) {
            Ok(text) => text,
            Err(err) => {
                warn!("page {}: unreadable, recording as undefined: {err}", index + 1);
                return ReceiptPage::undefined(index);
            }
        };

        let normalized = normalize(&raw_text);
        let (mut beneficiary, mut amount) = match &normalized {
            Some(text) => (extract_beneficiary(text, false), extract_amount(text, false)),
            None => (
                UNDEFINED_BENEFICIARY.to_string(),
                UNDEFINED_AMOUNT.to_string(),
            ),
        };

        if let Some(engine) = self.ocr {
            let needs_ocr = normalized.is_none()
                || beneficiary.contains("INDEFINIDO")
                || amount.contains("INDEFINIDO");

            if needs_ocr {
                debug!("page {}: running OCR fallback", index + 1);
                let ocr_text = self.recognize_page(source, index, engine);
                if let Some(ocr_normalized) = normalize(&ocr_text) {
                    beneficiary =
                        keep_defined(beneficiary, extract_beneficiary(&ocr_normalized, true));
                    amount = keep_defined(amount, extract_amount(&ocr_normalized, true));
                }
            }
        }

        let is_payroll = beneficiary == PAYROLL_LABEL;
        ReceiptPage {
            index,
            raw_text: normalized,
            beneficiary,
            amount,
            is_payroll,
        }
    }

    /// Image cleanup plus recognition. Any failure degrades to empty text;
    /// OCR problems never abort a page.
    fn recognize_page(
        &self,
        source: &dyn PageSource,
        index: usize,
        engine: &dyn OcrEngine,
    ) -> String {
        let image = match source.page_image(index) {
            Ok(image) => image,
            Err(err) => {
                warn!("page {}: no image for OCR: {err}", index + 1);
                return String::new();
            }
        };

        let cleaned = self.preprocessor.prepare(&image);
        match engine.recognize(&cleaned) {
            Ok(text) => text,
            Err(err) => {
                warn!("page {}: OCR failed: {err}", index + 1);
                String::new()
            }
        }
    }
}

impl Default for PageClassifier<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OcrError, PdfError};
    use crate::pdf;
    use image::DynamicImage;
    use pretty_assertions::assert_eq;

    /// In-memory page source with fixed per-page text.
    struct FakeSource {
        pages: Vec<Option<String>>,
    }

    impl FakeSource {
        fn new(pages: &[Option<&str>]) -> Self {
            Self {
                pages: pages.iter().map(|p| p.map(str::to_string)).collect(),
            }
        }
    }

    impl PageSource for FakeSource {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, index: usize) -> pdf::Result<String> {
            match &self.pages[index] {
                Some(text) => Ok(text.clone()),
                None => Err(PdfError::TextExtraction("broken page".to_string())),
            }
        }

        fn page_image(&self, index: usize) -> pdf::Result<DynamicImage> {
            Err(PdfError::ImageExtraction(format!("no image for page {index}")))
        }
    }

    /// Engine that always returns the same text.
    struct FixedEngine(String);

    impl OcrEngine for FixedEngine {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("abc"), Some("ABC".to_string()));
        assert_eq!(normalize("salário"), Some("SALÁRIO".to_string()));
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   \n\t "), None);
    }

    #[test]
    fn test_keep_defined_is_monotonic() {
        let defined = "ACME".to_string();
        let undefined = UNDEFINED_BENEFICIARY.to_string();

        assert_eq!(keep_defined(defined.clone(), undefined.clone()), "ACME");
        assert_eq!(keep_defined(undefined.clone(), defined.clone()), "ACME");
        assert_eq!(keep_defined(undefined.clone(), undefined.clone()), undefined);
        assert_eq!(keep_defined(defined.clone(), "OUTRA".to_string()), "ACME");
    }

    #[test]
    fn test_empty_page_without_ocr_is_undefined() {
        let source = FakeSource::new(&[Some("   \n ")]);
        let page = PageClassifier::new().classify_page(&source, 0);

        assert_eq!(page.beneficiary, UNDEFINED_BENEFICIARY);
        assert_eq!(page.amount, UNDEFINED_AMOUNT);
        assert!(!page.is_payroll);
        assert!(page.raw_text.is_none());
    }

    #[test]
    fn test_unreadable_page_is_recorded_and_skipped() {
        let source = FakeSource::new(&[None, Some("FAVORECIDO: ACME\nVALOR: 1,00")]);
        let pages = PageClassifier::new().classify_document(&source);

        assert_eq!(pages.len(), 2);
        assert!(pages[0].has_undefined_field());
        assert_eq!(pages[1].beneficiary, "ACME");
        assert_eq!(pages[1].amount, "1_00");
    }

    #[test]
    fn test_payroll_page_is_flagged() {
        let source = FakeSource::new(&[Some("Pagamento de salários\nVALOR: 9.999,99")]);
        let page = PageClassifier::new().classify_page(&source, 0);

        assert_eq!(page.beneficiary, "FOLHA");
        assert!(page.is_payroll);
        assert_eq!(page.amount, "9999_99");
    }

    #[test]
    fn test_failed_page_image_degrades_to_undefined() {
        // FakeSource has no page images: the OCR attempt must fall back to
        // empty text instead of erroring out.
        let source = FakeSource::new(&[Some("")]);
        let engine = FixedEngine("FAVORECIDO: LOJA DO PORTO\nVALOR: 3,50".to_string());
        let page = PageClassifier::new().with_ocr(&engine).classify_page(&source, 0);

        // page_image fails in FakeSource, OCR degrades to empty text
        assert_eq!(page.beneficiary, UNDEFINED_BENEFICIARY);
        assert_eq!(page.amount, UNDEFINED_AMOUNT);
    }

    #[test]
    fn test_ocr_never_downgrades_a_defined_field() {
        struct ImageSource;
        impl PageSource for ImageSource {
            fn page_count(&self) -> usize {
                1
            }
            fn page_text(&self, _index: usize) -> pdf::Result<String> {
                Ok("FAVORECIDO: ACME\nSEM VALOR".to_string())
            }
            fn page_image(&self, _index: usize) -> pdf::Result<DynamicImage> {
                Ok(DynamicImage::new_luma8(8, 8))
            }
        }

        // OCR text defines the amount but not the beneficiary
        let engine = FixedEngine("VALOR: 7,70".to_string());
        let page = PageClassifier::new().with_ocr(&engine).classify_page(&ImageSource, 0);

        assert_eq!(page.beneficiary, "ACME");
        assert_eq!(page.amount, "7_70");
    }
}
