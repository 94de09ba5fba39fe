//! File operations against a document library drive

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::debug;

use super::{item_action, item_path, parse_timestamp, GraphClient};
use crate::connector::FileService;
use crate::error::{Result, SharepointError};

/// Graph-backed file service bound to one drive
pub struct GraphFileService {
    client: GraphClient,
    drive_id: String,
}

impl GraphFileService {
    pub fn new(client: GraphClient, drive_id: impl Into<String>) -> Self {
        Self {
            client,
            drive_id: drive_id.into(),
        }
    }

    /// Drive item id of the folder a file is moved or copied into
    async fn folder_id(&self, path: &str) -> Result<String> {
        let item = self.client.get_drive_item(&self.drive_id, path).await?;
        if !item.contains_key("folder") && !item.contains_key("root") {
            return Err(SharepointError::InvalidPath(format!("not a folder: {}", path)));
        }
        item.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SharepointError::InvalidResponse(format!("drive item without id: {}", path)))
    }

    fn destination_body(&self, parent_id: String, name: &str) -> Value {
        json!({
            "parentReference": {
                "driveId": self.drive_id,
                "id": parent_id,
            },
            "name": name,
        })
    }
}

#[async_trait]
impl FileService for GraphFileService {
    async fn check_file_exists(&self, path: &str) -> Result<bool> {
        let item = self.client.find_drive_item(&self.drive_id, path).await?;
        Ok(item.map(|i| i.contains_key("file")).unwrap_or(false))
    }

    async fn read_file(&self, path: &str) -> Result<Bytes> {
        self.client
            .get_bytes(&item_action(&self.drive_id, path, "content"))
            .await
    }

    async fn write_file(&self, path: &str, contents: &[u8], mime_type: &str) -> Result<()> {
        debug!("write_file: {} ({} bytes, {})", path, contents.len(), mime_type);
        self.client
            .put_bytes(
                &item_action(&self.drive_id, path, "content"),
                contents.to_vec(),
                mime_type,
            )
            .await?;
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        debug!("delete_file: {}", path);
        self.client.delete(&item_path(&self.drive_id, path)).await
    }

    async fn move_file(&self, source: &str, destination_parent: &str, name: &str) -> Result<()> {
        debug!("move_file: {} -> {}/{}", source, destination_parent, name);
        let parent_id = self.folder_id(destination_parent).await?;
        let body = self.destination_body(parent_id, name);
        self.client
            .patch_json(&item_path(&self.drive_id, source), &body)
            .await?;
        Ok(())
    }

    async fn copy_file(&self, source: &str, destination_parent: &str, name: &str) -> Result<()> {
        debug!("copy_file: {} -> {}/{}", source, destination_parent, name);
        let parent_id = self.folder_id(destination_parent).await?;
        let body = self.destination_body(parent_id, name);
        // Accepted asynchronously; completion is not awaited
        self.client
            .post_json(&item_action(&self.drive_id, source, "copy"), &body)
            .await?;
        Ok(())
    }

    async fn check_file_mime_type(&self, path: &str) -> Result<Option<String>> {
        let item = self.client.get_drive_item(&self.drive_id, path).await?;
        Ok(item
            .get("file")
            .and_then(|f| f.get("mimeType"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn check_file_size(&self, path: &str) -> Result<Option<u64>> {
        let item = self.client.get_drive_item(&self.drive_id, path).await?;
        Ok(item.get("size").and_then(Value::as_u64))
    }

    async fn check_file_last_modified(&self, path: &str) -> Result<Option<i64>> {
        let item = self.client.get_drive_item(&self.drive_id, path).await?;
        item.get("lastModifiedDateTime")
            .and_then(Value::as_str)
            .map(parse_timestamp)
            .transpose()
    }

    async fn request_file_stream_url(&self, path: &str) -> Result<String> {
        let item = self.client.get_drive_item(&self.drive_id, path).await?;
        item.get("@microsoft.graph.downloadUrl")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                SharepointError::InvalidResponse(format!("no download URL for {}", path))
            })
    }
}
