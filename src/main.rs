//! `docmark` command-line entry point.
//!
//! Loads the given images and PDFs, extracts their text, prints it, and
//! optionally exports each document.
//!
//! ```bash
//! docmark scan.png report.pdf --export-dir out --format pdf
//! docmark letter.pdf --translate
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use docmark::export::{export_annotated, export_docx, export_file_stem, export_pdf};
use docmark::{AppConfig, Document, SourceFile, Workbench, WorkbenchEvent};

/// How long to wait for a single extraction before giving up.
const JOB_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Parser)]
#[command(name = "docmark", version, about = "Extract, review and export document text")]
struct Cli {
    /// Image or PDF files to load
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Write one export per document into this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Export format for extracted text
    #[arg(long, value_enum, default_value_t = ExportFormat::Docx)]
    format: ExportFormat,

    /// Also export image documents with their annotations drawn in
    #[arg(long)]
    annotated: bool,

    /// Print a translation of each document into the configured language
    #[arg(long)]
    translate: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Docx,
    Pdf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AppConfig::load_from_default_path(),
    };

    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let mut workbench = Workbench::from_config(&config).context("failed to start worker")?;

    let mut sources = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let source = SourceFile::from_path(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        sources.push(source);
    }

    let added = workbench.add_files(sources);
    for name in &added.rejected {
        eprintln!("skipped {}: unsupported file type", name);
    }

    for event in workbench.run_until_idle(JOB_TIMEOUT) {
        if let WorkbenchEvent::ExtractionFailed { doc_id, message } = event {
            eprintln!("{}: {}", doc_id, message);
        }
    }

    if cli.translate {
        translate_documents(&mut workbench);
    }

    let export_dir = cli.export_dir.clone().or_else(|| {
        let folder = &config.preferences.export_folder;
        (!folder.is_empty()).then(|| PathBuf::from(folder))
    });
    if let Some(dir) = &export_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    for document in workbench.store().documents() {
        println!("== {} ({}) ==", document.name(), document.kind.name());
        println!("{}", document.text);

        if let Some(dir) = &export_dir {
            export_document(document, dir, cli.format, cli.annotated)?;
        }
    }

    Ok(())
}

/// Translate every document with text and print the results.
///
/// Each job yields exactly one event and jobs complete in submission order.
fn translate_documents(workbench: &mut Workbench) {
    let jobs: Vec<(String, String)> = workbench
        .store()
        .documents()
        .iter()
        .filter(|d| !d.text.trim().is_empty())
        .map(|d| (d.name().to_string(), d.text.clone()))
        .collect();

    let mut names = Vec::with_capacity(jobs.len());
    for (name, text) in jobs {
        workbench.request_translation_default(text);
        names.push(name);
    }

    let events = workbench.run_until_idle(JOB_TIMEOUT);
    for (name, event) in names.iter().zip(events) {
        match event {
            WorkbenchEvent::Translated { target, text } => {
                println!("== {} [{}] ==", name, target);
                println!("{}", text);
            }
            WorkbenchEvent::TranslationFailed { target, message } => {
                eprintln!("{}: translation to {} failed: {}", name, target, message);
            }
            _ => {}
        }
    }
}

fn export_document(
    document: &Document,
    dir: &Path,
    format: ExportFormat,
    annotated: bool,
) -> Result<()> {
    let stem = export_file_stem(document.name());
    let written = match format {
        ExportFormat::Docx => export_docx(&document.text, &dir.join(format!("{stem}.docx"))),
        ExportFormat::Pdf => export_pdf(&document.text, &dir.join(format!("{stem}.pdf"))),
    }
    .with_context(|| format!("failed to export {}", document.name()))?;
    println!("wrote {}", written.display());

    if annotated && document.is_image() {
        let written = export_annotated(document, &dir.join(format!("{stem}-annotated.pdf")))
            .with_context(|| format!("failed to export annotated {}", document.name()))?;
        println!("wrote {}", written.display());
    }
    Ok(())
}
