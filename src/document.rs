use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use mime_guess::from_path;
use pdf_extract::extract_text_by_pages;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions picked up from the documents directory
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["txt", "pdf"];

/// Represents a document with its content and metadata
#[derive(Debug, Clone)]
pub struct Document {
    /// The extracted text content of the document
    pub content: String,
    /// The document's file name, used as provenance for its chunks
    pub filename: String,
    /// The document's MIME type
    pub mime_type: String,
}

impl Document {
    /// Create a new document from a file path
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let path = file_path.as_ref();
        let filename = path
            .file_name()
            .context("Invalid file name")?
            .to_str()
            .context("Invalid file name encoding")?
            .to_string();

        let mime = from_path(path).first_or_octet_stream();
        let mime_type = mime.to_string();
        debug!("Detected MIME type {} for {}", mime_type, filename);

        let content = read_document_content(path, &mime_type)?;

        Ok(Document {
            content,
            filename,
            mime_type,
        })
    }
}

/// A single file that could not be read; the rest of the corpus is unaffected
#[derive(Debug, Error)]
#[error("failed to read {}: {source:#}", .path.display())]
pub struct FileReadError {
    pub path: PathBuf,
    #[source]
    pub source: anyhow::Error,
}

/// Outcome of loading a documents directory
#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub failures: Vec<FileReadError>,
}

/// Read content from a document based on its MIME type
pub fn read_document_content<P: AsRef<Path>>(file_path: P, mime_type: &str) -> Result<String> {
    let path = file_path.as_ref();

    match mime_type {
        mime if mime.starts_with("application/pdf") => {
            debug!("Extracting PDF document: {}", path.display());
            let pages = extract_text_by_pages(path)
                .with_context(|| format!("Failed to extract text from PDF: {}", path.display()))?;

            let content = join_pages(&pages);

            if content.is_empty() {
                warn!("No text could be extracted from {}", path.display());
            }

            Ok(content)
        }

        mime if mime.starts_with("text/") => {
            debug!("Reading text document: {}", path.display());
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read text file: {}", path.display()))?;
            Ok(content)
        }

        _ => Err(anyhow::anyhow!(
            "Unsupported document format: {}. Only text and PDF files are supported.",
            mime_type
        )),
    }
}

/// Load every supported document in `dir`, creating the directory if needed.
///
/// Per-file failures are logged and reported, never propagated. Only a
/// directory that cannot be created or listed is an error.
pub async fn load_documents(dir: &Path) -> Result<LoadReport> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create documents directory {}", dir.display()))?;

    let mut report = LoadReport::default();

    for path in supported_files(dir)? {
        let task_path = path.clone();
        // pdf-extract may panic on malformed input; a blocking task contains it
        let loaded = tokio::task::spawn_blocking(move || Document::from_file(&task_path)).await;

        let failure = match loaded {
            Ok(Ok(document)) => {
                debug!(
                    "Loaded {} ({} characters)",
                    document.filename,
                    document.content.chars().count()
                );
                report.documents.push(document);
                continue;
            }
            Ok(Err(source)) => FileReadError { path, source },
            Err(join_error) => FileReadError {
                path,
                source: anyhow::anyhow!("extraction task failed: {}", join_error),
            },
        };

        error!("Skipping document: {}", failure);
        report.failures.push(failure);
    }

    info!(
        "Loaded {} documents from {} ({} skipped)",
        report.documents.len(),
        dir.display(),
        report.failures.len()
    );

    Ok(report)
}

/// List files in `dir` (non-recursive) with a supported extension, sorted by name
fn supported_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to list documents directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("Skipping unreadable directory entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        if path.is_file() && has_supported_extension(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Join extracted pages, keeping a paragraph break between them.
///
/// Pages without extractable text contribute nothing.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| normalize_whitespace(page))
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Normalize whitespace in text (remove multiple consecutive spaces, newlines, etc.)
fn normalize_whitespace(text: &str) -> String {
    let result = text.replace('\r', "");

    // Runs of newlines collapse to at most a paragraph break
    let mut prev_char = ' ';
    let mut newline_count = 0;
    let mut normalized = String::with_capacity(result.len());

    for c in result.chars() {
        if c == '\n' {
            newline_count += 1;
        } else {
            if newline_count > 0 {
                if newline_count >= 2 {
                    normalized.push_str("\n\n");
                } else {
                    normalized.push('\n');
                }
                newline_count = 0;
            }

            if !(c == ' ' && prev_char == ' ') {
                normalized.push(c);
            }

            prev_char = c;
        }
    }

    if newline_count > 0 {
        if newline_count >= 2 {
            normalized.push_str("\n\n");
        } else {
            normalized.push('\n');
        }
    }

    normalized.trim().to_string()
}
