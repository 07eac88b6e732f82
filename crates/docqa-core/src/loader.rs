//! Directory loader: walks a source tree and turns every supported file into
//! [`Document`]s.
//!
//! Plain `.txt` files are always read (strict UTF-8), except under hidden
//! entries. PDF files are read one document per page when the `pdf` capability
//! is enabled, hidden or not. A file that fails
//! to load is reported and skipped; it never aborts the batch.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::types::Document;

/// Optional parsers available in this build. Detected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub pdf: bool,
}

impl Capabilities {
    pub fn detect() -> Self {
        Self { pdf: cfg!(feature = "pdf") }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderOptions {
    pub pdf: bool,
}

impl From<Capabilities> for LoaderOptions {
    fn from(caps: Capabilities) -> Self {
        Self { pdf: caps.pdf }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Text,
    Pdf,
}

/// Documents in sorted path order plus the per-file failures that were skipped.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub failures: Vec<Error>,
}

pub fn load_documents(root: &Path, options: LoaderOptions) -> LoadReport {
    let mut report = LoadReport::default();
    let files = list_source_files(root, options, &mut report.failures);
    if files.is_empty() {
        info!("No supported files found under {}", root.display());
        return report;
    }

    // par_iter + collect keeps input order, so thread count never changes the output.
    let loaded: Vec<Result<Vec<Document>>> = files
        .par_iter()
        .map(|(path, kind)| match kind {
            SourceKind::Text => load_text(path),
            SourceKind::Pdf => load_pdf(path),
        })
        .collect();

    for result in loaded {
        match result {
            Ok(docs) => report.documents.extend(docs),
            Err(err) => {
                warn!("Skipping file: {err}");
                report.failures.push(err);
            }
        }
    }

    if report.documents.is_empty() && !report.failures.is_empty() {
        warn!(
            "No documents loaded from {}: all {} candidate files failed",
            root.display(),
            report.failures.len()
        );
    }
    info!(
        "Loaded {} documents from {} files under {}",
        report.documents.len(),
        files.len(),
        root.display()
    );
    report
}

fn list_source_files(root: &Path, options: LoaderOptions, failures: &mut Vec<Error>) -> Vec<(PathBuf, SourceKind)> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                // A missing root is an empty directory, not a failure.
                if err.depth() > 0 {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    failures.push(Error::load(path, &err));
                }
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match classify(entry.path(), options) {
            // hidden text files are skipped; PDFs are found anywhere in the tree
            Some(SourceKind::Text) if is_hidden(root, &entry) => continue,
            Some(kind) => files.push((entry.into_path(), kind)),
            None => {}
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    debug!("Found {} candidate files under {}", files.len(), root.display());
    files
}

fn classify(path: &Path, options: LoaderOptions) -> Option<SourceKind> {
    let ext = path.extension().and_then(|s| s.to_str())?;
    if ext == "txt" {
        Some(SourceKind::Text)
    } else if ext.eq_ignore_ascii_case("pdf") && options.pdf {
        Some(SourceKind::Pdf)
    } else {
        None
    }
}

/// Whether any component below `root` starts with a dot.
fn is_hidden(root: &Path, entry: &DirEntry) -> bool {
    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
    relative
        .components()
        .any(|c| c.as_os_str().to_str().map(|s| s.starts_with('.')).unwrap_or(false))
}

fn load_text(path: &Path) -> Result<Vec<Document>> {
    let bytes = fs::read(path).map_err(|e| Error::load(path, e))?;
    let content = String::from_utf8(bytes).map_err(|e| Error::load(path, format!("invalid UTF-8: {e}")))?;
    Ok(vec![Document::new(content, path.to_string_lossy())])
}

#[cfg(feature = "pdf")]
fn load_pdf(path: &Path) -> Result<Vec<Document>> {
    let pdf = lopdf::Document::load(path).map_err(|e| Error::load(path, e))?;
    let pages = pdf.get_pages();
    let total = pages.len() as u32;
    let source = path.to_string_lossy();
    let mut documents = Vec::with_capacity(pages.len());
    for (index, page_number) in pages.keys().enumerate() {
        let text = pdf.extract_text(&[*page_number]).map_err(|e| Error::load(path, e))?;
        documents.push(Document::new(text, source.to_string()).with_page(index as u32, total));
    }
    debug!("Read {} pages from {}", total, path.display());
    Ok(documents)
}

#[cfg(not(feature = "pdf"))]
fn load_pdf(path: &Path) -> Result<Vec<Document>> {
    Err(Error::load(path, "PDF support is not compiled in"))
}
