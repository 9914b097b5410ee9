//! Regex patterns for Brazilian bank receipt extraction.
//!
//! Every pattern here assumes the text has already been upper-cased by the
//! normalizer. The order of the label lists is significant: it encodes the
//! precedence observed across the supported bank layouts and must not be
//! rearranged.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // CPF (individual taxpayer ID), e.g. 123.456.789-01
    pub static ref CPF: Regex = Regex::new(r"\d{3}\.\d{3}\.\d{3}-\d{2}").unwrap();

    // CNPJ (company taxpayer ID), e.g. 12.345.678/0001-90
    pub static ref CNPJ: Regex = Regex::new(r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}").unwrap();

    // Beneficiary: structural layouts

    pub static ref NOME_FANTASIA: Regex =
        Regex::new(r"NOME FANTASIA:\s*(.*?)(?:\n|$)").unwrap();

    // Santander boleto: issuer section with the company name on the
    // RAZÃO SOCIAL line, possibly glued to its CNPJ
    pub static ref SANTANDER_RAZAO_SOCIAL: Regex =
        Regex::new(r"(?s)DADOS DO BENEFICIÁRIO ORIGINAL.*?RAZÃO SOCIAL:\s*([^\n]+)").unwrap();

    // Beneficiary: generic labels, tried in this exact order
    pub static ref GENERIC_BENEFICIARY: Vec<Regex> = [
        r"FAVORECIDA:\s*(.+)",
        r"PAGO\s+PARA:?\s*(.+)",
        r"FAVORECIDO:?\s*(.+)",
        r"BENEFICI[ÁA]RIO:?\s*(.+)",
        r"NOME:?\s*(.+)",
        r"NOME DO RECEBEDOR:?\s*(.+)",
        r"CREDITADA:\s*NOME:?\s*(.+)",
        r"TIPO DE COMPROMISSO:?\s*(.+)",
        r"DADOS DO RECEBEDOR\s*\n\s*PARA\s*(.+)",
        r"FAVORECIDO\s*\n\s*NOME:?\s*(.+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    // Characters stripped from generic-label captures
    pub static ref PUNCTUATION: Regex = Regex::new(r"[^\w\s]").unwrap();

    // Amount: a Brazilian-formatted value. The decimal comma with two
    // decimals is mandatory so canonicalization always yields N_NN.
    pub static ref AMOUNT_AFTER_CNPJ: Regex =
        Regex::new(r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}[^\d]*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})")
            .unwrap();

    pub static ref VALOR_COBRADO: Regex =
        Regex::new(r"VALOR\s+COBRADO[:\s]*R?\$?\s*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})").unwrap();

    pub static ref VALOR_RECOLHIDO: Regex =
        Regex::new(r"VALOR\s+RECOLHIDO:\s*R?\$?\s*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})").unwrap();

    pub static ref VALOR_PAGAMENTO_LINHA: Regex =
        Regex::new(r"\(=\)\s*VALOR\s*DO\s*PAGAMENTO\s*\(R\$\):\s*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})")
            .unwrap();

    pub static ref VALOR_PAGAMENTO_PROXIMA_LINHA: Regex =
        Regex::new(r"\(=\)\s*VALOR\s*DO\s*PAGAMENTO\s*\(R\$\):\s*\n\s*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})")
            .unwrap();

    pub static ref VALOR_TRANSACAO: Regex =
        Regex::new(r"VALOR\s+DA\s+TRANSAÇÃO:\s*R?\$?\s*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})")
            .unwrap();

    pub static ref VALOR_CONVENIO: Regex =
        Regex::new(r"CONVENIO[^\n]*?((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})").unwrap();

    // Amount: generic labels, tried in this exact order
    pub static ref GENERIC_AMOUNT: Vec<Regex> = [
        r"VALOR\s+DO\s+DOCUMENTO[:\s]*R?\$?\s*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})",
        r"VALOR[:\s]*R?\$?\s*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})",
        r"VALOR\s*:\s*R?\$?\s*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})",
        r"VALOR\s+DA\s+TED[:\s]*R?\$?\s*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})",
        r"VALOR\s+DO\s+PAGAMENTO\s*\(R\$\):?\s*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})",
        r"VALOR\s+TOTAL\s+PAGO[:\s]*R?\$?\s*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})",
        r"VALOR\s+TOTAL[:\s]*R?\$?\s*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})",
        r"VALOR\s+ATUALIZADO:?\s*R?\$?\s*((?:\d{1,3}(?:\.\d{3})*|\d+),\d{2})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
}
