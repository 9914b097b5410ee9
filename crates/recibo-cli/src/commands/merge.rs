//! Merge command - concatenate whole PDFs into a single document.
//!
//! Merge mode does no field extraction; OCR, archiving and reporting do
//! not apply here and are deliberately not offered.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use recibo_core::pdf::{PageSource, PdfDocument, merge_documents};

/// Arguments for the merge command.
#[derive(Args)]
pub struct MergeArgs {
    /// Input PDF files, concatenated in the order given
    #[arg(required = true, num_args = 2..)]
    input: Vec<PathBuf>,

    /// Destination file for the combined document
    #[arg(short, long)]
    output: PathBuf,
}

pub fn run(args: MergeArgs) -> anyhow::Result<()> {
    let mut documents = Vec::with_capacity(args.input.len());
    let mut total_pages = 0;

    for path in &args.input {
        let document = PdfDocument::open(path)
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
        total_pages += document.page_count();
        info!("{}: {} pages", path.display(), document.page_count());
        documents.push(document.inner().clone());
    }

    merge_documents(&documents, &args.output)
        .map_err(|e| anyhow::anyhow!("{}: {e}", args.output.display()))?;

    println!(
        "{} Merged {} files ({} pages) into {}",
        style("✓").green(),
        args.input.len(),
        total_pages,
        args.output.display()
    );
    Ok(())
}
