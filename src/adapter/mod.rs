//! SharePoint filesystem adapter
//!
//! Roots every logical path under a configurable prefix and forwards the
//! operation to the connector's file or folder service, translating raw
//! drive item records into attribute records.

pub mod prefix;

use std::collections::VecDeque;
use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::connector::SharepointConnector;
use crate::error::{MetadataKind, Result, SharepointError};
use crate::filesystem::{
    ByteStream, DirectoryAttributes, ExtraMetadata, FileAttributes, FilesystemAdapter,
    ListingStream, Options, StorageAttributes, Visibility,
};
use crate::graph::parse_timestamp;

/// Filesystem adapter over a SharePoint document library
pub struct SharepointAdapter {
    connector: Arc<SharepointConnector>,
    prefix: String,
    http: reqwest::Client,
}

impl SharepointAdapter {
    pub fn new(connector: Arc<SharepointConnector>, prefix: &str) -> Self {
        Self {
            connector,
            prefix: prefix::normalize_prefix(prefix),
            http: reqwest::Client::new(),
        }
    }

    pub fn connector(&self) -> &Arc<SharepointConnector> {
        &self.connector
    }

    pub fn set_connector(&mut self, connector: Arc<SharepointConnector>) -> &mut Self {
        self.connector = connector;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn set_prefix(&mut self, prefix: &str) -> &mut Self {
        self.prefix = prefix::normalize_prefix(prefix);
        self
    }

    /// Drive path for a logical path
    pub fn apply_prefix(&self, path: &str) -> String {
        prefix::apply_prefix(&self.prefix, path)
    }

    fn destination(&self, destination: &str) -> Result<(String, String)> {
        let (parent, name) = prefix::split_destination(destination)?;
        Ok((self.apply_prefix(&parent), name))
    }
}

/// Translate a raw child record into an attribute record
///
/// `parent` is the listed directory's path relative to the listing root.
/// Records that are neither files nor folders yield `None`.
fn attributes_from_item(parent: &str, item: ExtraMetadata) -> Result<Option<StorageAttributes>> {
    let name = item
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| SharepointError::InvalidResponse("drive item without name".to_string()))?;
    let path = if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    };

    let last_modified = item
        .get("lastModifiedDateTime")
        .and_then(Value::as_str)
        .map(parse_timestamp)
        .transpose()?;

    if item.contains_key("folder") {
        let mut dir = DirectoryAttributes::new(path);
        dir.last_modified = last_modified;
        return Ok(Some(StorageAttributes::Directory(dir.with_extra_metadata(item))));
    }

    if item.contains_key("file") {
        let mut file = FileAttributes::new(path);
        file.last_modified = last_modified;
        file.file_size = item.get("size").and_then(Value::as_u64);
        file.mime_type = item
            .get("file")
            .and_then(|f| f.get("mimeType"))
            .and_then(Value::as_str)
            .map(str::to_string);
        return Ok(Some(StorageAttributes::File(file.with_extra_metadata(item))));
    }

    Ok(None)
}

#[async_trait]
impl FilesystemAdapter for SharepointAdapter {
    async fn file_exists(&self, path: &str) -> Result<bool> {
        let location = self.apply_prefix(path);
        trace!("file_exists: {}", location);
        self.connector.file().check_file_exists(&location).await
    }

    async fn directory_exists(&self, path: &str) -> Result<bool> {
        let location = self.apply_prefix(path);
        trace!("directory_exists: {}", location);
        self.connector.folder().check_folder_exists(&location).await
    }

    async fn write(&self, path: &str, contents: &[u8], options: &Options) -> Result<()> {
        let location = self.apply_prefix(path);
        let mime_type = options.mime_type();
        debug!("write: {} size={} mime={}", location, contents.len(), mime_type);

        self.connector
            .file()
            .write_file(&location, contents, mime_type)
            .await
    }

    async fn write_stream(&self, path: &str, _contents: ByteStream, _options: &Options) -> Result<()> {
        warn!("write_stream called for {}", path);
        Err(SharepointError::NotSupported(
            "streaming writes are not supported".to_string(),
        ))
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        let location = self.apply_prefix(path);
        trace!("read: {}", location);
        self.connector.file().read_file(&location).await
    }

    async fn read_stream(&self, path: &str) -> Result<ByteStream> {
        let location = self.apply_prefix(path);
        trace!("read_stream: {}", location);

        let url = self.connector.file().request_file_stream_url(&location).await?;

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SharepointError::UnableToReadFile {
                path: location.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SharepointError::UnableToReadFile {
                path: location,
                reason: format!("download returned {}", response.status()),
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(SharepointError::from));
        Ok(Box::pin(stream))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let location = self.apply_prefix(path);
        debug!("delete: {}", location);
        self.connector.file().delete_file(&location).await
    }

    async fn delete_directory(&self, path: &str) -> Result<()> {
        let location = self.apply_prefix(path);
        debug!("delete_directory: {}", location);
        self.connector.folder().delete_folder(&location).await
    }

    async fn create_directory(&self, path: &str, _options: &Options) -> Result<()> {
        let location = self.apply_prefix(path);
        debug!("create_directory: {}", location);
        self.connector.folder().create_folder_recursive(&location).await
    }

    async fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()> {
        warn!("set_visibility({}) called for {}", visibility, path);
        Err(SharepointError::NotSupported(
            "visibility is not supported".to_string(),
        ))
    }

    async fn visibility(&self, path: &str) -> Result<FileAttributes> {
        warn!("visibility called for {}", path);
        Err(SharepointError::NotSupported(
            "visibility is not supported".to_string(),
        ))
    }

    async fn mime_type(&self, path: &str) -> Result<FileAttributes> {
        let location = self.apply_prefix(path);
        trace!("mime_type: {}", location);

        let mime_type = self
            .connector
            .file()
            .check_file_mime_type(&location)
            .await
            .map_err(|e| SharepointError::metadata_failed(&location, MetadataKind::MimeType, e))?
            .ok_or_else(|| SharepointError::metadata_unknown(&location, MetadataKind::MimeType))?;

        Ok(FileAttributes::new(path).with_mime_type(mime_type))
    }

    async fn last_modified(&self, path: &str) -> Result<FileAttributes> {
        let location = self.apply_prefix(path);
        trace!("last_modified: {}", location);

        let timestamp = self
            .connector
            .file()
            .check_file_last_modified(&location)
            .await
            .map_err(|e| SharepointError::metadata_failed(&location, MetadataKind::LastModified, e))?
            .ok_or_else(|| SharepointError::metadata_unknown(&location, MetadataKind::LastModified))?;

        Ok(FileAttributes::new(path).with_last_modified(timestamp))
    }

    async fn file_size(&self, path: &str) -> Result<FileAttributes> {
        let location = self.apply_prefix(path);
        trace!("file_size: {}", location);

        let size = self
            .connector
            .file()
            .check_file_size(&location)
            .await
            .map_err(|e| SharepointError::metadata_failed(&location, MetadataKind::FileSize, e))?
            .ok_or_else(|| SharepointError::metadata_unknown(&location, MetadataKind::FileSize))?;

        Ok(FileAttributes::new(path).with_file_size(size))
    }

    fn list_contents(&self, path: &str, deep: bool) -> ListingStream {
        let folder = self.connector.folder().clone();
        let root = self.apply_prefix(path);
        trace!("list_contents: {} deep={}", root, deep);

        Box::pin(try_stream! {
            // (drive path, path relative to the listing root)
            let mut pending = VecDeque::from([(root, String::new())]);

            while let Some((location, relative)) = pending.pop_front() {
                let items = folder.request_folder_items(&location).await?;

                for item in items {
                    let Some(attributes) = attributes_from_item(&relative, item)? else {
                        continue;
                    };

                    if deep && attributes.is_dir() {
                        let name = attributes.path().rsplit('/').next().unwrap_or_default();
                        let child = format!("{}/{}", location.trim_end_matches('/'), name);
                        pending.push_back((child, attributes.path().to_string()));
                    }

                    yield attributes;
                }
            }
        })
    }

    async fn move_file(&self, source: &str, destination: &str, _options: &Options) -> Result<()> {
        let from = self.apply_prefix(source);
        let (parent, name) = self.destination(destination)?;
        debug!("move: {} -> {} / {}", from, parent, name);

        self.connector.file().move_file(&from, &parent, &name).await
    }

    async fn copy_file(&self, source: &str, destination: &str, _options: &Options) -> Result<()> {
        let from = self.apply_prefix(source);
        let (parent, name) = self.destination(destination)?;
        debug!("copy: {} -> {} / {}", from, parent, name);

        self.connector.file().copy_file(&from, &parent, &name).await
    }
}
