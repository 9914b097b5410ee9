//! Configuration structures for the receipt splitting pipeline.

use serde::{Deserialize, Serialize};

/// Main configuration for the recibo pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReciboConfig {
    /// OCR fallback configuration.
    pub ocr: OcrConfig,

    /// Output handling configuration.
    pub output: OutputConfig,
}

/// OCR fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Run OCR on pages whose fields stay undefined after text extraction.
    pub enabled: bool,

    /// Tesseract language set.
    pub languages: String,

    /// Tesseract page segmentation mode. Mode 6 assumes a single uniform
    /// block of text, which suits the sparse structured layout of receipts.
    pub page_seg_mode: u32,

    /// Source resolution reported to the recognizer, in DPI.
    pub source_dpi: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            languages: "por+eng".to_string(),
            page_seg_mode: 6,
            source_dpi: 300,
        }
    }
}

/// Output handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Name of the output directory created next to each input file.
    pub directory: String,

    /// Prefix for the generated ZIP archive name.
    pub archive_prefix: String,

    /// Bundle generated files into a ZIP archive.
    pub zip: bool,

    /// Write a CSV report of beneficiary and amount per output file.
    pub report: bool,

    /// Strip the sequence prefix from the generated names afterwards.
    pub renumber: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "comprovantes_processados".to_string(),
            archive_prefix: "comprovantes_divididos".to_string(),
            zip: false,
            report: false,
            renumber: false,
        }
    }
}

impl ReciboConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReciboConfig::default();
        assert!(config.ocr.enabled);
        assert_eq!(config.ocr.languages, "por+eng");
        assert_eq!(config.ocr.page_seg_mode, 6);
        assert_eq!(config.output.directory, "comprovantes_processados");
        assert!(!config.output.zip);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: ReciboConfig =
            serde_json::from_str(r#"{"ocr": {"enabled": false}}"#).unwrap();
        assert!(!parsed.ocr.enabled);
        assert_eq!(parsed.ocr.languages, "por+eng");
        assert_eq!(parsed.output.archive_prefix, "comprovantes_divididos");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recibo.json");

        let mut config = ReciboConfig::default();
        config.ocr.enabled = false;
        config.output.zip = true;
        config.save(&path).unwrap();

        let loaded = ReciboConfig::from_file(&path).unwrap();
        assert!(!loaded.ocr.enabled);
        assert!(loaded.output.zip);
    }
}
