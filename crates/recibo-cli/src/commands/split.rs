//! Split command - classify, group and export receipts from input PDFs.

use std::fs;
use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use recibo_core::pdf::save_pages;
use recibo_core::receipt::{
    PageClassifier, group_file_name, group_pages, strip_sequence_prefix, unique_file_name,
};
use recibo_core::{
    DocumentSummary, PageSource, PdfDocument, ReciboConfig, TesseractEngine,
};

/// Arguments for the split command.
#[derive(Args)]
pub struct SplitArgs {
    /// Input PDF files or glob patterns
    #[arg(required = true)]
    input: Vec<String>,

    /// Disable the OCR fallback for pages without a text layer
    #[arg(long)]
    no_ocr: bool,

    /// Bundle the generated files into a ZIP archive
    #[arg(long)]
    zip: bool,

    /// Write a CSV report of beneficiary and amount per output file
    #[arg(long)]
    report: bool,

    /// Strip the NNN_ sequence prefix from the generated names afterwards
    #[arg(long)]
    renumber: bool,
}

/// Outcome of processing a single input file.
struct FileOutcome {
    path: PathBuf,
    summary: Option<DocumentSummary>,
    error: Option<String>,
}

pub fn run(args: SplitArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Load configuration
    let mut config = match config_path {
        Some(path) => ReciboConfig::from_file(Path::new(path))?,
        None => ReciboConfig::default(),
    };
    if args.no_ocr {
        config.ocr.enabled = false;
    }
    config.output.zip |= args.zip;
    config.output.report |= args.report;
    config.output.renumber |= args.renumber;

    let files = expand_inputs(&args.input);
    if files.is_empty() {
        anyhow::bail!("no matching input files");
    }
    println!("{} Found {} files to process", style("ℹ").blue(), files.len());

    // One engine for the whole run; a missing Tesseract installation
    // degrades to text-only extraction instead of aborting.
    let engine = if config.ocr.enabled {
        match TesseractEngine::new(config.ocr.clone()) {
            Ok(engine) => Some(engine),
            Err(err) => {
                warn!("OCR unavailable, continuing without it: {err}");
                None
            }
        }
    } else {
        None
    };

    let mut outcomes = Vec::with_capacity(files.len());
    for path in files {
        let outcome = match process_file(&path, &config, engine.as_ref()) {
            Ok(summary) => FileOutcome {
                path,
                summary: Some(summary),
                error: None,
            },
            Err(err) => {
                warn!("{}: {err:#}", path.display());
                FileOutcome {
                    path,
                    summary: None,
                    error: Some(format!("{err:#}")),
                }
            }
        };
        outcomes.push(outcome);
    }

    print_run_summary(&outcomes, start);
    Ok(())
}

/// Expands each argument as a glob pattern, keeping literal paths that
/// match nothing as-is so their errors are reported per file.
fn expand_inputs(inputs: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        let mut matched = false;
        if let Ok(paths) = glob(input) {
            for path in paths.flatten() {
                matched = true;
                files.push(path);
            }
        }
        if !matched {
            files.push(PathBuf::from(input));
        }
    }
    files.retain(|p| {
        p.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
    });
    files
}

fn process_file(
    path: &Path,
    config: &ReciboConfig,
    engine: Option<&TesseractEngine>,
) -> anyhow::Result<DocumentSummary> {
    info!("processing {}", path.display());

    let input_dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let input_dir = input_dir.unwrap_or(Path::new("."));
    let output_dir = input_dir.join(&config.output.directory);
    fs::create_dir_all(&output_dir)?;

    let document = PdfDocument::open(path)
        .map_err(|e| anyhow::anyhow!("cannot read input: {e}"))?;
    let total_pages = document.page_count();

    let mut classifier = PageClassifier::new();
    if let Some(engine) = engine {
        classifier = classifier.with_ocr(engine);
    }

    let pb = ProgressBar::new(total_pages as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut pages = Vec::with_capacity(total_pages);
    for index in 0..total_pages {
        pb.set_message(format!("página {}/{}", index + 1, total_pages));
        pages.push(classifier.classify_page(&document, index));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let groups = group_pages(&pages);
    let summary = DocumentSummary::collect(&pages, &groups);

    // Write one PDF per group; a failing group is reported and skipped so
    // the remaining receipts still come out.
    let mut written = Vec::with_capacity(groups.len());
    for (seq, group) in groups.iter().enumerate() {
        let name = unique_file_name(&output_dir, &group_file_name(group, seq + 1));
        let target = output_dir.join(&name);

        match save_pages(document.inner(), group.start_page, group.end_page, &target) {
            Ok(()) => {
                debug!("wrote {}", target.display());
                written.push(target);
            }
            Err(err) => {
                eprintln!(
                    "{} could not write {}: {err}",
                    style("✗").red(),
                    target.display()
                );
            }
        }
    }

    if config.output.renumber {
        renumber_outputs(&output_dir, &mut written)?;
    }

    if config.output.report {
        let report = write_report(&output_dir, &written)?;
        println!("{} Report written to {}", style("✓").green(), report.display());
    }

    if config.output.zip {
        let archive = write_archive(path, input_dir, &config.output.archive_prefix, &written)?;
        println!("{} Archive written to {}", style("✓").green(), archive.display());
    }

    println!(
        "{} {}: {} pages -> {} files ({} with undefined fields)",
        style("✓").green(),
        path.display(),
        summary.total_pages,
        written.len(),
        summary.undefined_pages
    );

    Ok(summary)
}

/// Strips the sequence prefix from every generated name, re-resolving
/// collisions with the usual counter suffixes.
fn renumber_outputs(output_dir: &Path, written: &mut [PathBuf]) -> anyhow::Result<()> {
    for path in written.iter_mut() {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let stripped = strip_sequence_prefix(name);
        if stripped == name {
            continue;
        }

        let target = output_dir.join(unique_file_name(output_dir, stripped));
        fs::rename(&path, &target)?;
        debug!("renamed {} -> {}", path.display(), target.display());
        *path = target;
    }
    Ok(())
}

/// Two-column CSV derived from the output file names.
fn write_report(output_dir: &Path, written: &[PathBuf]) -> anyhow::Result<PathBuf> {
    let report_path = output_dir.join("comprovantes.csv");
    let mut writer = csv::Writer::from_path(&report_path)?;

    writer.write_record(["beneficiario", "valor"])?;
    for path in written {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let trimmed = strip_sequence_prefix(stem);
        let (beneficiary, amount) = trimmed.split_once('_').unwrap_or((trimmed, ""));
        writer.write_record([beneficiary, amount])?;
    }

    writer.flush()?;
    Ok(report_path)
}

/// Flat ZIP of the generated files, next to the input.
fn write_archive(
    input: &Path,
    input_dir: &Path,
    prefix: &str,
    written: &[PathBuf],
) -> anyhow::Result<PathBuf> {
    let base = input.file_stem().and_then(|s| s.to_str()).unwrap_or("comprovantes");
    let archive_path = input_dir.join(format!("{prefix}_{base}.zip"));

    let file = File::create(&archive_path)
        .map_err(|e| anyhow::anyhow!("{}: {e}", archive_path.display()))?;
    let mut archive = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for path in written {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        archive.start_file(name, options)?;
        archive.write_all(&fs::read(path)?)?;
    }

    archive.finish()?;
    Ok(archive_path)
}

fn print_run_summary(outcomes: &[FileOutcome], start: Instant) {
    let processed: Vec<_> = outcomes.iter().filter(|o| o.summary.is_some()).collect();
    let failed: Vec<_> = outcomes.iter().filter(|o| o.error.is_some()).collect();
    let undefined_pages: usize = processed
        .iter()
        .filter_map(|o| o.summary.as_ref())
        .map(|s| s.undefined_pages)
        .sum();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} pages left undefined",
        style(processed.len()).green(),
        style(failed.len()).red(),
        undefined_pages
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            println!(
                "  - {}: {}",
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
