//! Document readers for ingestion sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::error::{RagError, Result};

/// A source that parses an input resource into [`Document`]s.
///
/// This is the seam where format-specific parsing (PDF, HTML, ...) plugs
/// into the ingestion pipeline; the pipeline itself only sees documents.
pub trait DocumentReader: Send + Sync {
    /// Parse the resource into an ordered list of documents.
    fn read(&self) -> Result<Vec<Document>>;
}

/// Reads a UTF-8 text file and splits it into one [`Document`] per page.
///
/// Pages are delimited by form-feed characters (`\u{000C}`), the page-break
/// convention of text extracted from paginated sources. Each document
/// carries `page_number` metadata (1-based) and the file path as its
/// `source_uri`. A file without form feeds yields a single page.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_core::PagedTextReader;
///
/// let reader = PagedTextReader::new("docs/handbook.txt");
/// let pages = reader.read()?;
/// ```
#[derive(Debug, Clone)]
pub struct PagedTextReader {
    path: PathBuf,
}

impl PagedTextReader {
    /// Create a reader for the given file path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl DocumentReader for PagedTextReader {
    fn read(&self) -> Result<Vec<Document>> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            RagError::Chunking(format!("failed to read '{}': {e}", self.path.display()))
        })?;

        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        Ok(paginate(&text, &stem, Some(self.path.display().to_string())))
    }
}

/// Split text on form feeds into per-page documents.
fn paginate(text: &str, id_prefix: &str, source_uri: Option<String>) -> Vec<Document> {
    text.split('\u{000C}')
        .enumerate()
        .filter(|(_, page)| !page.is_empty())
        .map(|(i, page)| {
            let page_number = i + 1;
            let mut metadata = HashMap::new();
            metadata.insert("page_number".to_string(), page_number.to_string());
            Document {
                id: format!("{id_prefix}_p{page_number}"),
                text: page.to_string(),
                metadata,
                source_uri: source_uri.clone(),
            }
        })
        .collect()
}
