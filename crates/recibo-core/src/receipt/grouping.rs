//! Page grouping: payroll batches span multiple pages, everything else is
//! exactly one page.
//!
//! A payroll disbursement is a summary page followed by a variable number
//! of per-employee detail pages; the detail pages are recognizable by the
//! several CPF tokens they list.

use crate::models::receipt::{OutputGroup, ReceiptPage};

use super::rules::patterns::CPF;

/// Minimum CPF occurrences for a payroll continuation page.
const PAYROLL_CPF_THRESHOLD: usize = 4;

/// True when the text looks like a per-employee payroll detail page.
pub fn contains_payroll_detail(text: &str) -> bool {
    CPF.find_iter(text).count() >= PAYROLL_CPF_THRESHOLD
}

/// Partitions the classified pages into output groups.
///
/// Single forward pass, no backtracking: a payroll page opens a group that
/// absorbs following pages while they carry payroll detail; any other page
/// is a group of its own. The produced groups cover `0..pages.len()` with
/// no gaps and no overlaps.
pub fn group_pages(pages: &[ReceiptPage]) -> Vec<OutputGroup> {
    let mut groups = Vec::new();
    let mut index = 0;

    while index < pages.len() {
        let page = &pages[index];
        let mut end = index;

        if page.is_payroll {
            while end + 1 < pages.len()
                && pages[end + 1]
                    .raw_text
                    .as_deref()
                    .is_some_and(contains_payroll_detail)
            {
                end += 1;
            }
        }

        groups.push(OutputGroup {
            start_page: index,
            end_page: end,
            beneficiary: page.beneficiary.clone(),
            amount: page.amount.clone(),
            is_payroll: page.is_payroll,
        });
        index = end + 1;
    }

    groups
}
