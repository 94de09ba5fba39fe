//! Filesystem abstraction implemented by storage adapters
//!
//! Adapters are path-based. Every operation receives a logical path
//! relative to the adapter's root and reports metadata through the
//! attribute records defined here.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde_json::{Map, Value};

use crate::error::Result;

/// Raw metadata record as reported by the backend
pub type ExtraMetadata = Map<String, Value>;

/// Stream of file content chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Stream type for directory listings
pub type ListingStream = Pin<Box<dyn Stream<Item = Result<StorageAttributes>> + Send>>;

/// Visibility of a file or directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Public,
    Private,
    /// Backend has no visibility model
    #[default]
    NotSupported,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::NotSupported => "notSupported",
        };
        f.write_str(s)
    }
}

/// Metadata for a file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileAttributes {
    pub path: String,
    pub file_size: Option<u64>,
    pub visibility: Visibility,
    /// Seconds since the Unix epoch
    pub last_modified: Option<i64>,
    pub mime_type: Option<String>,
    pub extra_metadata: ExtraMetadata,
}

impl FileAttributes {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }

    pub fn with_last_modified(mut self, timestamp: i64) -> Self {
        self.last_modified = Some(timestamp);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_extra_metadata(mut self, extra: ExtraMetadata) -> Self {
        self.extra_metadata = extra;
        self
    }
}

/// Metadata for a directory
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectoryAttributes {
    pub path: String,
    pub visibility: Visibility,
    /// Seconds since the Unix epoch
    pub last_modified: Option<i64>,
    pub extra_metadata: ExtraMetadata,
}

impl DirectoryAttributes {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_last_modified(mut self, timestamp: i64) -> Self {
        self.last_modified = Some(timestamp);
        self
    }

    pub fn with_extra_metadata(mut self, extra: ExtraMetadata) -> Self {
        self.extra_metadata = extra;
        self
    }
}

/// Listing entry: either a file or a directory
#[derive(Debug, Clone, PartialEq)]
pub enum StorageAttributes {
    File(FileAttributes),
    Directory(DirectoryAttributes),
}

impl StorageAttributes {
    pub fn path(&self) -> &str {
        match self {
            StorageAttributes::File(f) => &f.path,
            StorageAttributes::Directory(d) => &d.path,
        }
    }

    pub fn last_modified(&self) -> Option<i64> {
        match self {
            StorageAttributes::File(f) => f.last_modified,
            StorageAttributes::Directory(d) => d.last_modified,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, StorageAttributes::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, StorageAttributes::Directory(_))
    }
}

/// Per-call options passed to mutating operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    values: HashMap<String, String>,
}

impl Options {
    /// Option key selecting the content type of an upload
    pub const MIME_TYPE: &'static str = "mimeType";

    /// Content type used when no `mimeType` option is given
    pub const DEFAULT_MIME_TYPE: &'static str = "text/plain";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn mime_type(&self) -> &str {
        self.get_or(Self::MIME_TYPE, Self::DEFAULT_MIME_TYPE)
    }
}

/// Capability contract for storage adapters
///
/// Paths are logical paths relative to the adapter's root. Every
/// operation is a single request/response against the backend.
#[async_trait]
pub trait FilesystemAdapter: Send + Sync {
    async fn file_exists(&self, path: &str) -> Result<bool>;

    async fn directory_exists(&self, path: &str) -> Result<bool>;

    /// Write a complete file, replacing any existing content
    async fn write(&self, path: &str, contents: &[u8], options: &Options) -> Result<()>;

    /// Write a file from a stream of chunks
    async fn write_stream(&self, path: &str, contents: ByteStream, options: &Options) -> Result<()>;

    /// Read a complete file into memory
    async fn read(&self, path: &str) -> Result<Bytes>;

    /// Open a file for streaming reads
    async fn read_stream(&self, path: &str) -> Result<ByteStream>;

    async fn delete(&self, path: &str) -> Result<()>;

    /// Remove a directory and everything below it
    async fn delete_directory(&self, path: &str) -> Result<()>;

    /// Create a directory along with any missing ancestors
    async fn create_directory(&self, path: &str, options: &Options) -> Result<()>;

    async fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()>;

    async fn visibility(&self, path: &str) -> Result<FileAttributes>;

    async fn mime_type(&self, path: &str) -> Result<FileAttributes>;

    async fn last_modified(&self, path: &str) -> Result<FileAttributes>;

    async fn file_size(&self, path: &str) -> Result<FileAttributes>;

    /// List directory contents, descending into subdirectories when `deep` is set
    fn list_contents(&self, path: &str, deep: bool) -> ListingStream;

    async fn move_file(&self, source: &str, destination: &str, options: &Options) -> Result<()>;

    async fn copy_file(&self, source: &str, destination: &str, options: &Options) -> Result<()>;
}
