pub mod chunking;
pub mod config;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod loader;
pub mod metadata;
pub mod models;
pub mod path;

pub use chunking::{
    RecursiveTextSplitter, SplitterConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
    DEFAULT_SEPARATORS,
};
pub use config::{AppConfig, VectorStoreConfig, VectorStoreKind};
pub use error::{IngestError, Result};
#[cfg(feature = "pdf")]
pub use extractor::LopdfExtractor;
pub use extractor::{PageText, PdfExtractor};
pub use ingest::{
    discover_supported_files, ingest_folder, ingest_folder_best_effort, load_and_split,
    IngestionReport, SkippedFile,
};
pub use loader::{LoaderKind, LoaderRegistry, LoaderRequest};
pub use metadata::{base_metadata, merge_metadata, update_metadata};
pub use models::{
    Document, Metadata, CHUNK_INDEX_KEY, FILE_NAME_KEY, FILE_PATH_KEY, FILE_TYPE_KEY, PAGE_KEY,
    ROW_KEY, SOURCE_KEY,
};
pub use path::{classify_extension, validate_path};
