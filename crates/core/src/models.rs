use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata attached to a [`Document`]. Keys are unique; values are JSON scalars or strings.
pub type Metadata = BTreeMap<String, Value>;

pub const SOURCE_KEY: &str = "source";
pub const FILE_PATH_KEY: &str = "file_path";
pub const FILE_NAME_KEY: &str = "file_name";
pub const FILE_TYPE_KEY: &str = "file_type";
pub const PAGE_KEY: &str = "page";
pub const ROW_KEY: &str = "row";
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// Uniform unit of ingested content.
///
/// Every document owns its metadata map. Cloning a document clones the map, so
/// documents produced from the same source never observe each other's edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub content: String,
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata_str(SOURCE_KEY)
    }

    pub fn file_type(&self) -> Option<&str> {
        self.metadata_str(FILE_TYPE_KEY)
    }

    /// Length of the content in characters, the unit chunk sizes are measured in.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
