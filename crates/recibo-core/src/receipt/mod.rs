//! Receipt field extraction, page classification and grouping.

pub mod rules;

mod classifier;
mod grouping;
mod naming;

pub use classifier::{PageClassifier, keep_defined, normalize};
pub use grouping::{contains_payroll_detail, group_pages};
pub use naming::{group_file_name, strip_sequence_prefix, unique_file_name};
pub use rules::{extract_amount, extract_beneficiary};
