use std::fmt;
use std::io;
use thiserror::Error;

/// Which piece of metadata a failed lookup was after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    MimeType,
    FileSize,
    LastModified,
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetadataKind::MimeType => "mime type",
            MetadataKind::FileSize => "file size",
            MetadataKind::LastModified => "last modified",
        };
        f.write_str(name)
    }
}

/// Main error type for sharepoint-adapter operations
#[derive(Error, Debug)]
pub enum SharepointError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Unable to retrieve the {kind} for file at location: {path}. {reason}")]
    UnableToRetrieveMetadata {
        path: String,
        kind: MetadataKind,
        reason: String,
        #[source]
        source: Option<Box<SharepointError>>,
    },

    #[error("Unable to read file from location: {path}. {reason}")]
    UnableToReadFile { path: String, reason: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SharepointError {
    /// Metadata lookup that returned nothing
    pub fn metadata_unknown(path: impl Into<String>, kind: MetadataKind) -> Self {
        SharepointError::UnableToRetrieveMetadata {
            path: path.into(),
            kind,
            reason: "Unknown.".to_string(),
            source: None,
        }
    }

    /// Metadata lookup that failed with an underlying error
    pub fn metadata_failed(path: impl Into<String>, kind: MetadataKind, cause: SharepointError) -> Self {
        SharepointError::UnableToRetrieveMetadata {
            path: path.into(),
            kind,
            reason: cause.to_string(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SharepointError::NotFound(_))
    }
}

impl From<crate::config::ConfigError> for SharepointError {
    fn from(e: crate::config::ConfigError) -> Self {
        SharepointError::Config(e.to_string())
    }
}

/// Result type alias for sharepoint-adapter operations
pub type Result<T> = std::result::Result<T, SharepointError>;
