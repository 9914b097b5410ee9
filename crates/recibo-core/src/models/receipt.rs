//! Data model for classified pages and the groups emitted from them.

use serde::{Deserialize, Serialize};

/// Placeholder returned when no beneficiary rule matched.
pub const UNDEFINED_BENEFICIARY: &str = "BENEFICIÁRIO INDEFINIDO";

/// Placeholder returned when no amount rule matched.
pub const UNDEFINED_AMOUNT: &str = "VALOR INDEFINIDO";

/// Beneficiary label that marks a payroll summary page.
pub const PAYROLL_LABEL: &str = "FOLHA";

/// One classified page of an input document.
///
/// Created by the page classifier and never mutated afterwards; the
/// grouping engine consumes these records in a single forward pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptPage {
    /// Zero-based page index in the source document.
    pub index: usize,

    /// Normalized page text, `None` when the page had no text layer.
    pub raw_text: Option<String>,

    /// Canonical beneficiary: upper-cased, at most 25 characters, or a
    /// fixed label, or the undefined placeholder.
    pub beneficiary: String,

    /// Canonical amount: digits with `_` as decimal separator, or the
    /// undefined placeholder.
    pub amount: String,

    /// Whether this page is a payroll summary page.
    pub is_payroll: bool,
}

impl ReceiptPage {
    /// Record for a page that could not be read at all.
    pub fn undefined(index: usize) -> Self {
        Self {
            index,
            raw_text: None,
            beneficiary: UNDEFINED_BENEFICIARY.to_string(),
            amount: UNDEFINED_AMOUNT.to_string(),
            is_payroll: false,
        }
    }

    /// True when either field stayed undefined after all fallbacks.
    pub fn has_undefined_field(&self) -> bool {
        self.beneficiary.contains("INDEFINIDO") || self.amount.contains("INDEFINIDO")
    }
}

/// A contiguous run of pages emitted as one output PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputGroup {
    /// First page of the group (zero-based).
    pub start_page: usize,

    /// Last page of the group, inclusive.
    pub end_page: usize,

    /// Beneficiary taken from the group's opening page.
    pub beneficiary: String,

    /// Amount taken from the group's opening page.
    pub amount: String,

    /// Whether the group is a payroll batch.
    pub is_payroll: bool,
}

impl OutputGroup {
    /// Number of pages spanned by the group.
    pub fn page_count(&self) -> usize {
        self.end_page - self.start_page + 1
    }
}

/// Per-document processing summary reported at the end of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Pages in the source document.
    pub total_pages: usize,

    /// Output groups produced.
    pub groups: usize,

    /// Pages whose beneficiary or amount stayed undefined after all
    /// fallbacks.
    pub undefined_pages: usize,
}

impl DocumentSummary {
    /// Build the summary from classified pages and their groups.
    pub fn collect(pages: &[ReceiptPage], groups: &[OutputGroup]) -> Self {
        Self {
            total_pages: pages.len(),
            groups: groups.len(),
            undefined_pages: pages.iter().filter(|p| p.has_undefined_field()).count(),
        }
    }
}
