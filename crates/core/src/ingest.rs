use crate::{
    chunking::RecursiveTextSplitter, classify_extension, Document, IngestError, LoaderKind,
    LoaderRegistry, LoaderRequest,
};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files under `folder` (recursively) whose extension a loader understands, sorted.
pub fn discover_supported_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let extension = classify_extension(entry.path());
        if LoaderKind::from_extension(&extension).is_some() {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Loads one file and splits every resulting document.
pub fn load_and_split(
    request: LoaderRequest,
    registry: &LoaderRegistry,
    splitter: &RecursiveTextSplitter,
) -> Result<Vec<Document>, IngestError> {
    let documents = registry.load(request)?;
    Ok(splitter.split_documents(&documents))
}

/// Chunks for every supported file in `folder`; the first failing file aborts the run.
pub fn ingest_folder(
    folder: &Path,
    registry: &LoaderRegistry,
    splitter: &RecursiveTextSplitter,
) -> Result<Vec<Document>, IngestError> {
    let mut chunks = Vec::new();
    for path in files_or_error(folder)? {
        chunks.extend(load_and_split(LoaderRequest::new(&path)?, registry, splitter)?);
    }
    Ok(chunks)
}

#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct IngestionReport {
    pub chunks: Vec<Document>,
    pub loaded_files: usize,
    pub skipped_files: Vec<SkippedFile>,
}

/// Like [`ingest_folder`], but a file that fails to load is recorded and skipped.
/// Each file is still all-or-nothing.
pub fn ingest_folder_best_effort(
    folder: &Path,
    registry: &LoaderRegistry,
    splitter: &RecursiveTextSplitter,
) -> Result<IngestionReport, IngestError> {
    let mut report = IngestionReport::default();

    for path in files_or_error(folder)? {
        let result = LoaderRequest::new(&path)
            .and_then(|request| load_and_split(request, registry, splitter));

        match result {
            Ok(file_chunks) => {
                report.loaded_files += 1;
                report.chunks.extend(file_chunks);
            }
            Err(error) => report.skipped_files.push(SkippedFile {
                path,
                reason: error.to_string(),
            }),
        }
    }

    Ok(report)
}

fn files_or_error(folder: &Path) -> Result<Vec<PathBuf>, IngestError> {
    if !folder.is_dir() {
        return Err(IngestError::NotFound(folder.to_path_buf()));
    }

    let files = discover_supported_files(folder);
    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no txt, pdf or csv files found in {}",
            folder.display()
        )));
    }
    Ok(files)
}
