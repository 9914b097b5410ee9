//! Beneficiary extraction for Brazilian bank receipts.
//!
//! The extractor is an ordered cascade of independent rules; the first rule
//! that settles the field wins. A rule may settle with the undefined
//! placeholder (rejection), which also stops the cascade.

use tracing::trace;

use super::patterns::{
    CNPJ, CPF, GENERIC_BENEFICIARY, NOME_FANTASIA, PUNCTUATION, SANTANDER_RAZAO_SOCIAL,
};
use super::Rule;
use crate::models::receipt::UNDEFINED_BENEFICIARY;

/// Maximum length of a canonical beneficiary.
const MAX_LEN: usize = 25;

/// Rule cascade in layout precedence order. The order is hand-tuned
/// against real documents and must not be rearranged.
const RULES: &[(&str, Rule)] = &[
    ("fixed-label", fixed_label),
    ("nome-social", nome_social),
    ("convenio", convenio),
    ("nome-do-recebedor", nome_do_recebedor),
    ("nome-fantasia", nome_fantasia),
    ("santander", santander),
    ("cliente-blocks", cliente_blocks),
    ("dados-de-quem-recebeu", dados_de_quem_recebeu),
    ("generic-label", generic_label),
];

/// Extracts the canonical beneficiary from upper-cased page text.
///
/// `_ocr_retry` marks calls made on OCR-derived text; it does not change
/// behavior today but is threaded through every call site.
pub fn extract_beneficiary(text: &str, _ocr_retry: bool) -> String {
    for (name, rule) in RULES {
        if let Some(value) = rule(text) {
            trace!(rule = name, "beneficiary rule matched");
            return canonicalize(&value);
        }
    }
    UNDEFINED_BENEFICIARY.to_string()
}

fn canonicalize(value: &str) -> String {
    value.trim().chars().take(MAX_LEN).collect()
}

/// Unambiguous domain markers that map straight to a fixed label.
fn fixed_label(text: &str) -> Option<String> {
    if text.contains("PAGAMENTO DE DARF") {
        return Some("DARF".to_string());
    }
    if text.contains("CAGEPA") {
        return Some("CAGEPA".to_string());
    }
    if text.contains("SALÁRIO") || text.contains("SALARIOS") {
        return Some("FOLHA".to_string());
    }
    if text.contains("FGTS") {
        return Some("FGTS".to_string());
    }
    None
}

/// "NOME SOCIAL:" layouts put the name on the following line.
fn nome_social(text: &str) -> Option<String> {
    if !text.contains("NOME SOCIAL:") {
        return None;
    }
    let lines: Vec<&str> = text.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if line.contains("NOME SOCIAL:") && i + 1 < lines.len() {
            let value = lines[i + 1].trim();
            if !value.is_empty() && value != "NOME" {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Utility receipts name the payee on the CONVENIO line.
fn convenio(text: &str) -> Option<String> {
    let (_, rest) = text.split_once("CONVENIO")?;
    let value = rest.lines().next()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

/// Itaú layout: the payee follows "NOME DO RECEBEDOR:" on the same line.
fn nome_do_recebedor(text: &str) -> Option<String> {
    let (_, rest) = text.split_once("NOME DO RECEBEDOR:")?;
    let value = rest.lines().next()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

/// "NOME FANTASIA:" carries the value on the same line, or on the next
/// line in stacked layouts.
fn nome_fantasia(text: &str) -> Option<String> {
    if !text.contains("NOME FANTASIA:") {
        return None;
    }
    if let Some(caps) = NOME_FANTASIA.captures(text) {
        let value = caps[1].trim().to_string();
        if !value.is_empty() {
            return Some(value);
        }
    }
    let lines: Vec<&str> = text.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if line.contains("NOME FANTASIA:") && i + 1 < lines.len() {
            let value = lines[i + 1].trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Santander boletos bury the original payee inside a dedicated section;
/// the RAZÃO SOCIAL line may carry the CNPJ glued to the name.
fn santander(text: &str) -> Option<String> {
    if !(text.contains("SANTANDER") && text.contains("DADOS DO BENEFICIÁRIO ORIGINAL")) {
        return None;
    }
    if let Some(caps) = SANTANDER_RAZAO_SOCIAL.captures(text) {
        let value = CNPJ.replace_all(caps[1].trim(), "").trim().to_string();
        if !value.is_empty() {
            return Some(value);
        }
    }

    // Stacked variant: header, CNPJ line, document number, then the name.
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    for (i, line) in lines.iter().enumerate() {
        if line.contains("DADOS DO BENEFICIÁRIO ORIGINAL") && i + 3 < lines.len() {
            if CNPJ.is_match(lines[i + 1]) && !CNPJ.is_match(lines[i + 3]) {
                return Some(lines[i + 3].to_string());
            }
        }
    }
    None
}

/// Layouts that repeat "CLIENTE:" per party: the first block is the paying
/// account holder, the last block names the credited party.
fn cliente_blocks(text: &str) -> Option<String> {
    let occurrences: Vec<usize> = text.match_indices("CLIENTE:").map(|(i, _)| i).collect();
    if occurrences.len() < 2 {
        return None;
    }
    let rest = &text[occurrences[occurrences.len() - 1] + "CLIENTE:".len()..];
    let value = trim_at_document_markers(rest.lines().next()?).trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

/// PIX receipts: the payee sits under a "DADOS DE QUEM RECEBEU" section,
/// on the NOME-labeled line.
fn dados_de_quem_recebeu(text: &str) -> Option<String> {
    let (_, section) = text.split_once("DADOS DE QUEM RECEBEU")?;
    for line in section.lines() {
        if let Some((_, after)) = line.split_once("NOME") {
            let after = after.trim_start_matches([':', ' ']);
            let value = trim_at_document_markers(after).trim();
            if !value.is_empty() && value != "NOME" {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Generic label fallback over the fixed priority list.
fn generic_label(text: &str) -> Option<String> {
    for pattern in GENERIC_BENEFICIARY.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };

        let raw = caps[1].split("CNPJ").next().unwrap_or("").trim();
        let raw = raw.lines().next().unwrap_or("");
        let mut name = PUNCTUATION.replace_all(raw, "").trim().to_string();

        // A capture from the payer block or a fantasy-name line is a
        // misfire, not a weaker match: settle as undefined.
        if name.contains("DO PAGADOR") || name.contains("FANTASIA") {
            return Some(UNDEFINED_BENEFICIARY.to_string());
        }

        if text.contains("BENEFICIÁRIO ORIGINAL") && name == "ORIGINAL" {
            continue;
        }

        // Degenerate capture of the label word itself: the value sits on
        // the line after a bare NOME: line.
        if name == "NOME" {
            let lines: Vec<&str> = text.lines().collect();
            for (i, line) in lines.iter().enumerate() {
                if line.trim() == "NOME:" && i + 1 < lines.len() {
                    name = lines[i + 1].trim().to_string();
                    break;
                }
            }
        }

        return if name.is_empty() {
            Some(UNDEFINED_BENEFICIARY.to_string())
        } else {
            Some(name)
        };
    }
    None
}

/// Cuts a structural capture at the next document-number label.
fn trim_at_document_markers(value: &str) -> &str {
    let mut end = value.len();
    for marker in ["CNPJ", "CPF"] {
        if let Some(pos) = value.find(marker) {
            end = end.min(pos);
        }
    }
    if let Some(m) = CPF.find(value) {
        end = end.min(m.start());
    }
    &value[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_darf_marker() {
        let text = "COMPROVANTE\nPAGAMENTO DE DARF\nVALOR: R$ 100,00";
        assert_eq!(extract_beneficiary(text, false), "DARF");
    }

    #[test]
    fn test_cagepa_marker() {
        assert_eq!(extract_beneficiary("FATURA CAGEPA REFERENTE A 05/2024", false), "CAGEPA");
    }

    #[test]
    fn test_payroll_marker() {
        assert_eq!(extract_beneficiary("PAGAMENTO DE SALÁRIOS", false), "FOLHA");
        assert_eq!(extract_beneficiary("CREDITO SALARIOS EQUIPE", false), "FOLHA");
    }

    #[test]
    fn test_fgts_marker() {
        assert_eq!(extract_beneficiary("GUIA DE RECOLHIMENTO FGTS", false), "FGTS");
    }

    #[test]
    fn test_fixed_labels_take_priority() {
        // DARF wins even with a generic label present
        let text = "PAGAMENTO DE DARF\nFAVORECIDO: ACME LTDA";
        assert_eq!(extract_beneficiary(text, false), "DARF");
    }

    #[test]
    fn test_nome_social_next_line() {
        let text = "NOME SOCIAL:\nMARIA DA SILVA\nCPF 123.456.789-01";
        assert_eq!(extract_beneficiary(text, false), "MARIA DA SILVA");
    }

    #[test]
    fn test_convenio_same_line() {
        let text = "PAGAMENTO CONVENIO ENERGISA PB\nVALOR: 120,00";
        assert_eq!(extract_beneficiary(text, false), "ENERGISA PB");
    }

    #[test]
    fn test_nome_do_recebedor() {
        let text = "COMPROVANTE ITAU\nNOME DO RECEBEDOR: PADARIA CENTRAL LTDA\nAGENCIA 0001";
        assert_eq!(extract_beneficiary(text, false), "PADARIA CENTRAL LTDA");
    }

    #[test]
    fn test_nome_fantasia_same_line() {
        let text = "NOME FANTASIA: ACME LTDA\nCNPJ: 12.345.678/0001-90";
        assert_eq!(extract_beneficiary(text, false), "ACME LTDA");
    }

    #[test]
    fn test_nome_fantasia_next_line() {
        let text = "NOME FANTASIA:\nACME COMERCIO DE PECAS\nCNPJ: 12.345.678/0001-90";
        assert_eq!(extract_beneficiary(text, false), "ACME COMERCIO DE PECAS");
    }

    #[test]
    fn test_santander_razao_social() {
        let text = "BANCO SANTANDER\nDADOS DO BENEFICIÁRIO ORIGINAL\nRAZÃO SOCIAL: DISTRIBUIDORA NORDESTE 12.345.678/0001-90\nAGENCIA 3456";
        assert_eq!(extract_beneficiary(text, false), "DISTRIBUIDORA NORDESTE");
    }

    #[test]
    fn test_santander_stacked_lines() {
        let text = "BANCO SANTANDER\nDADOS DO BENEFICIÁRIO ORIGINAL\n12.345.678/0001-90\n0001234\nCOMERCIAL PARAIBA LTDA\n";
        assert_eq!(extract_beneficiary(text, false), "COMERCIAL PARAIBA LTDA");
    }

    #[test]
    fn test_cliente_blocks_take_last() {
        let text = "CLIENTE: EMPRESA PAGADORA SA\nCONTA 1234\nCLIENTE: TRANSPORTES UNIAO CPF 111.222.333-44";
        assert_eq!(extract_beneficiary(text, false), "TRANSPORTES UNIAO");
    }

    #[test]
    fn test_single_cliente_does_not_match() {
        let text = "CLIENTE: EMPRESA PAGADORA SA\nCONTA 1234";
        // falls through to the generic rules, which have no label here
        assert_eq!(extract_beneficiary(text, false), UNDEFINED_BENEFICIARY);
    }

    #[test]
    fn test_dados_de_quem_recebeu() {
        let text = "DADOS DE QUEM PAGOU\nNOME: EMPRESA X\nDADOS DE QUEM RECEBEU\nNOME: OFICINA DO ZE CNPJ 12.345.678/0001-90";
        assert_eq!(extract_beneficiary(text, false), "OFICINA DO ZE");
    }

    #[test]
    fn test_generic_favorecido() {
        let text = "FAVORECIDO: JOSE ALMEIDA ME CNPJ 12.345.678/0001-90";
        assert_eq!(extract_beneficiary(text, false), "JOSE ALMEIDA ME");
    }

    #[test]
    fn test_generic_strips_punctuation() {
        let text = "BENEFICIÁRIO: J.B. COMERCIO - FILIAL";
        assert_eq!(extract_beneficiary(text, false), "JB COMERCIO  FILIAL");
    }

    #[test]
    fn test_payer_capture_rejected() {
        let text = "NOME: DADOS DO PAGADOR";
        assert_eq!(extract_beneficiary(text, false), UNDEFINED_BENEFICIARY);
    }

    #[test]
    fn test_degenerate_nome_retries_next_line() {
        let text = "FAVORECIDO\nNOME:\nMERCADO SAO JOSE";
        assert_eq!(extract_beneficiary(text, false), "MERCADO SAO JOSE");
    }

    #[test]
    fn test_truncated_to_25_chars() {
        let text = "FAVORECIDO: COMPANHIA BRASILEIRA DE DISTRIBUICAO E LOGISTICA";
        let name = extract_beneficiary(text, false);
        assert!(name.chars().count() <= 25);
        assert_eq!(name, "COMPANHIA BRASILEIRA DE D");
    }

    #[test]
    fn test_no_match_yields_sentinel() {
        assert_eq!(extract_beneficiary("TEXTO SEM ROTULOS", false), UNDEFINED_BENEFICIARY);
    }
}
