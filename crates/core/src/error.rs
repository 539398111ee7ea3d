use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file type: {0:?}")]
    UnsupportedType(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),
}

impl IngestError {
    /// Malformed content for a recognized file type.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Csv(_))
    }

    /// Invalid splitter or application configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::RegexError(_))
    }
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
