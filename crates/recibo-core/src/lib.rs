//! Core library for splitting Brazilian bank receipt PDFs.
//!
//! This crate provides:
//! - PDF processing (per-page text, page images, splitting and merging)
//! - An OCR fallback via Tesseract for pages without a text layer
//! - Receipt field extraction (beneficiary, amount) for known bank layouts
//! - Page grouping that keeps multi-page payroll batches together

pub mod error;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod receipt;

pub use error::{ReciboError, Result};
pub use models::config::{OcrConfig, OutputConfig, ReciboConfig};
pub use models::receipt::{
    DocumentSummary, OutputGroup, PAYROLL_LABEL, ReceiptPage, UNDEFINED_AMOUNT,
    UNDEFINED_BENEFICIARY,
};
pub use ocr::{ImagePreprocessor, OcrEngine};
#[cfg(feature = "ocr")]
pub use ocr::TesseractEngine;
pub use pdf::{PageSource, PdfDocument};
pub use receipt::{
    PageClassifier, extract_amount, extract_beneficiary, group_file_name, group_pages,
    strip_sequence_prefix, unique_file_name,
};
