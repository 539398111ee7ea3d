use crate::error::IngestError;
use crate::models::{
    Document, Metadata, FILE_NAME_KEY, FILE_PATH_KEY, FILE_TYPE_KEY, SOURCE_KEY,
};
use serde_json::Value;
use std::path::Path;

/// Merges `update` into `target`; keys in `update` win on collision.
pub fn merge_metadata(target: &mut Metadata, update: &Metadata) {
    for (key, value) in update {
        target.insert(key.clone(), value.clone());
    }
}

/// Merges `update` into every document's own metadata map.
pub fn update_metadata(documents: &mut [Document], update: &Metadata) {
    for document in documents {
        merge_metadata(&mut document.metadata, update);
    }
}

/// Metadata every loaded document carries: `source`, `file_path`, `file_name` and `file_type`.
pub fn base_metadata(path: &Path, file_type: &str) -> Result<Metadata, IngestError> {
    let display = path.to_string_lossy().to_string();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| IngestError::MissingFileName(display.clone()))?;

    let mut metadata = Metadata::new();
    metadata.insert(SOURCE_KEY.to_string(), Value::String(display.clone()));
    metadata.insert(FILE_PATH_KEY.to_string(), Value::String(display));
    metadata.insert(FILE_NAME_KEY.to_string(), Value::String(file_name));
    metadata.insert(
        FILE_TYPE_KEY.to_string(),
        Value::String(file_type.to_string()),
    );
    Ok(metadata)
}
