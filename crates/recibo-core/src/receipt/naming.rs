//! Output file naming with deterministic collision handling.

use std::path::Path;

use crate::models::receipt::{OutputGroup, UNDEFINED_AMOUNT, UNDEFINED_BENEFICIARY};

/// Builds the file name for a group: `NNN_<beneficiary>_<amount>.pdf`.
///
/// When both fields are undefined the middle separator becomes a space so
/// doubly-undefined results stand out in a directory listing.
pub fn group_file_name(group: &OutputGroup, seq: usize) -> String {
    let separator = if group.beneficiary == UNDEFINED_BENEFICIARY
        && group.amount == UNDEFINED_AMOUNT
    {
        ' '
    } else {
        '_'
    };
    format!(
        "{:03}_{}{}{}.pdf",
        seq, group.beneficiary, separator, group.amount
    )
}

/// Returns a name not yet present in `dir`, appending `_1`, `_2`, ... before
/// the extension until it is unique.
pub fn unique_file_name(dir: &Path, file_name: &str) -> String {
    if !dir.join(file_name).exists() {
        return file_name.to_string();
    }

    let path = Path::new(file_name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("pdf");

    let mut counter = 1;
    loop {
        let candidate = format!("{stem}_{counter}.{extension}");
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Strips the leading `NNN_` sequence prefix produced by
/// [`group_file_name`]; names without the prefix come back unchanged.
pub fn strip_sequence_prefix(file_name: &str) -> &str {
    let bytes = file_name.as_bytes();
    if bytes.len() > 4 && bytes[..3].iter().all(u8::is_ascii_digit) && bytes[3] == b'_' {
        &file_name[4..]
    } else {
        file_name
    }
}
