use crate::error::IngestError;
use crate::extractor::{default_pdf_extractor, PdfExtractor};
use crate::metadata::{base_metadata, update_metadata};
use crate::models::{Document, Metadata, PAGE_KEY, ROW_KEY};
use crate::path::{classify_extension, validate_path};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// The file types the registry knows how to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoaderKind {
    Text,
    Pdf,
    Csv,
}

impl LoaderKind {
    const TABLE: [(&'static str, LoaderKind); 3] = [
        ("txt", LoaderKind::Text),
        ("pdf", LoaderKind::Pdf),
        ("csv", LoaderKind::Csv),
    ];

    /// Looks up a lowercase extension as returned by [`classify_extension`].
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(tag, _)| *tag == extension)
            .map(|(_, kind)| *kind)
    }

    pub fn extension(self) -> &'static str {
        match self {
            LoaderKind::Text => "txt",
            LoaderKind::Pdf => "pdf",
            LoaderKind::Csv => "csv",
        }
    }

    pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
        Self::TABLE.iter().map(|(tag, _)| *tag)
    }
}

/// A path that existed when the request was built, plus caller metadata.
#[derive(Debug, Clone)]
pub struct LoaderRequest {
    path: PathBuf,
    extension: String,
    metadata: Metadata,
}

impl LoaderRequest {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = validate_path(path)?;
        let extension = classify_extension(&path);
        Ok(Self {
            path,
            extension,
            metadata: Metadata::new(),
        })
    }

    /// Caller metadata, applied over the base fields of every loaded document.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// Dispatches a [`LoaderRequest`] to the parser for its extension.
pub struct LoaderRegistry {
    pdf: Option<Box<dyn PdfExtractor>>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self {
            pdf: default_pdf_extractor(),
        }
    }
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pdf_extractor(extractor: Box<dyn PdfExtractor>) -> Self {
        Self {
            pdf: Some(extractor),
        }
    }

    /// A registry that reports PDFs as an unsupported format.
    pub fn without_pdf() -> Self {
        Self { pdf: None }
    }

    pub fn supports_pdf(&self) -> bool {
        self.pdf.is_some()
    }

    pub fn load(&self, request: LoaderRequest) -> Result<Vec<Document>, IngestError> {
        let kind = LoaderKind::from_extension(&request.extension)
            .ok_or_else(|| IngestError::UnsupportedType(request.extension.clone()))?;
        let metadata = base_metadata(&request.path, kind.extension())?;

        let mut documents = match kind {
            LoaderKind::Text => load_text(&request.path, metadata)?,
            LoaderKind::Pdf => self.load_pdf(&request.path, metadata)?,
            LoaderKind::Csv => load_csv(&request.path, metadata)?,
        };

        // Caller fields go on last so they also win over `page` and `row`.
        update_metadata(&mut documents, &request.metadata);
        Ok(documents)
    }

    /// Validates `path` and loads it without extra metadata.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Vec<Document>, IngestError> {
        self.load(LoaderRequest::new(path)?)
    }

    fn load_pdf(&self, path: &Path, metadata: Metadata) -> Result<Vec<Document>, IngestError> {
        let extractor = self.pdf.as_ref().ok_or_else(|| {
            IngestError::UnsupportedFormat(
                "pdf support is not available; enable the `pdf` feature".to_string(),
            )
        })?;

        let pages = extractor.extract_pages(path)?;
        Ok(pages
            .into_iter()
            .map(|page| {
                let mut page_metadata = metadata.clone();
                page_metadata.insert(PAGE_KEY.to_string(), Value::from(page.number));
                Document::new(page.text, page_metadata)
            })
            .collect())
    }
}

fn load_text(path: &Path, metadata: Metadata) -> Result<Vec<Document>, IngestError> {
    let content = fs::read_to_string(path).map_err(|error| match error.kind() {
        ErrorKind::InvalidData => {
            IngestError::Parse(format!("{} is not valid UTF-8", path.display()))
        }
        _ => IngestError::Io(error),
    })?;

    Ok(vec![Document::new(content, metadata)])
}

/// One document per data row, rendered as `header: value` lines.
fn load_csv(path: &Path, metadata: Metadata) -> Result<Vec<Document>, IngestError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut documents = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let content = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| format!("{}: {}", header.trim(), value.trim()))
            .collect::<Vec<_>>()
            .join("\n");

        let mut row_metadata = metadata.clone();
        row_metadata.insert(ROW_KEY.to_string(), Value::from(row));
        documents.push(Document::new(content, row_metadata));
    }

    Ok(documents)
}
