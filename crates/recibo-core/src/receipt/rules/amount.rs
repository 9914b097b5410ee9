//! Amount extraction for Brazilian bank receipts.
//!
//! Amounts are matched in Brazilian format (`1.234,56`) and canonicalized
//! to a digits-and-underscore string (`1234_56`). The canonical value is an
//! opaque encoding, never a parsed number; no arithmetic happens anywhere
//! downstream.

use tracing::trace;

use super::patterns::{
    AMOUNT_AFTER_CNPJ, GENERIC_AMOUNT, VALOR_COBRADO, VALOR_CONVENIO, VALOR_PAGAMENTO_LINHA,
    VALOR_PAGAMENTO_PROXIMA_LINHA, VALOR_RECOLHIDO, VALOR_TRANSACAO,
};
use super::Rule;
use crate::models::receipt::UNDEFINED_AMOUNT;

/// Rule cascade in layout precedence order: bank-specific keyed amounts
/// first, then the generic label list.
const RULES: &[(&str, Rule)] = &[
    ("valor-cobrado", valor_cobrado),
    ("valor-recolhido", valor_recolhido),
    ("after-cnpj", after_cnpj),
    ("valor-pagamento", valor_pagamento),
    ("valor-transacao", valor_transacao),
    ("convenio", convenio),
    ("generic-label", generic_label),
];

/// Extracts the canonical amount from upper-cased page text.
///
/// `_ocr_retry` marks calls made on OCR-derived text; it does not change
/// behavior today but is threaded through every call site.
pub fn extract_amount(text: &str, _ocr_retry: bool) -> String {
    for (name, rule) in RULES {
        if let Some(raw) = rule(text) {
            trace!(rule = name, "amount rule matched");
            return canonicalize(&raw);
        }
    }
    UNDEFINED_AMOUNT.to_string()
}

/// Drops the thousands separator and turns the decimal comma into an
/// underscore. The upper-casing is a no-op on digits but keeps the result
/// symmetric with the sentinel casing.
fn canonicalize(raw: &str) -> String {
    raw.replace('.', "").replace(',', "_").to_uppercase()
}

fn valor_cobrado(text: &str) -> Option<String> {
    VALOR_COBRADO.captures(text).map(|caps| caps[1].to_string())
}

fn valor_recolhido(text: &str) -> Option<String> {
    VALOR_RECOLHIDO.captures(text).map(|caps| caps[1].to_string())
}

/// Several layouts print the amount right after the payee's CNPJ.
fn after_cnpj(text: &str) -> Option<String> {
    AMOUNT_AFTER_CNPJ.captures(text).map(|caps| caps[1].to_string())
}

/// "(=) VALOR DO PAGAMENTO (R$):" with the value on the same line or on
/// the line below.
fn valor_pagamento(text: &str) -> Option<String> {
    if let Some(caps) = VALOR_PAGAMENTO_LINHA.captures(text) {
        return Some(caps[1].to_string());
    }
    VALOR_PAGAMENTO_PROXIMA_LINHA
        .captures(text)
        .map(|caps| caps[1].to_string())
}

fn valor_transacao(text: &str) -> Option<String> {
    VALOR_TRANSACAO.captures(text).map(|caps| caps[1].to_string())
}

/// Utility receipts carry the amount on the CONVENIO line.
fn convenio(text: &str) -> Option<String> {
    VALOR_CONVENIO.captures(text).map(|caps| caps[1].to_string())
}

fn generic_label(text: &str) -> Option<String> {
    for pattern in GENERIC_AMOUNT.iter() {
        if let Some(caps) = pattern.captures(text) {
            return Some(caps[1].to_string());
        }
    }
    None
}
