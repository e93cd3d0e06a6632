use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, MetadataError>;

/// Errors produced while reading class metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("class [{class_name}] not found")]
    NotFound { class_name: String },

    #[error("failed to read metadata for [{class_name}]: {message}")]
    Io { class_name: String, message: String },

    #[error("failed to read descriptor file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid descriptor json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed metadata for [{class_name}]: {message}")]
    Malformed { class_name: String, message: String },
}

impl MetadataError {
    pub fn not_found(class_name: impl Into<String>) -> Self {
        MetadataError::NotFound {
            class_name: class_name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MetadataError::NotFound { .. })
    }
}
