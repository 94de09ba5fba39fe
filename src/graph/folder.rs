//! Folder operations against a document library drive

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, trace};

use super::{item_action, item_path, GraphClient};
use crate::connector::FolderService;
use crate::error::{Result, SharepointError};
use crate::filesystem::ExtraMetadata;

/// Graph-backed folder service bound to one drive
pub struct GraphFolderService {
    client: GraphClient,
    drive_id: String,
}

impl GraphFolderService {
    pub fn new(client: GraphClient, drive_id: impl Into<String>) -> Self {
        Self {
            client,
            drive_id: drive_id.into(),
        }
    }

    async fn create_child_folder(&self, parent: &str, name: &str) -> Result<()> {
        debug!("create folder {} under {}", name, parent);
        let body = json!({
            "name": name,
            "folder": {},
            "@microsoft.graph.conflictBehavior": "fail",
        });
        self.client
            .post_json(&item_action(&self.drive_id, parent, "children"), &body)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FolderService for GraphFolderService {
    async fn check_folder_exists(&self, path: &str) -> Result<bool> {
        let item = self.client.find_drive_item(&self.drive_id, path).await?;
        Ok(item
            .map(|i| i.contains_key("folder") || i.contains_key("root"))
            .unwrap_or(false))
    }

    async fn create_folder_recursive(&self, path: &str) -> Result<()> {
        let mut current = String::from("/");

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let next = if current == "/" {
                format!("/{}", segment)
            } else {
                format!("{}/{}", current, segment)
            };

            match self.client.find_drive_item(&self.drive_id, &next).await? {
                Some(item) if item.contains_key("folder") => {
                    trace!("folder exists: {}", next);
                }
                Some(_) => {
                    return Err(SharepointError::InvalidPath(format!(
                        "a file is in the way of folder {}",
                        next
                    )));
                }
                None => self.create_child_folder(&current, segment).await?,
            }

            current = next;
        }

        Ok(())
    }

    async fn delete_folder(&self, path: &str) -> Result<()> {
        debug!("delete_folder: {}", path);
        if path.split('/').all(|s| s.is_empty()) {
            return Err(SharepointError::InvalidPath(
                "refusing to delete the drive root".to_string(),
            ));
        }
        self.client.delete(&item_path(&self.drive_id, path)).await
    }

    async fn request_folder_items(&self, path: &str) -> Result<Vec<ExtraMetadata>> {
        let mut items = Vec::new();
        let mut next = Some(item_action(&self.drive_id, path, "children"));

        while let Some(page) = next.take() {
            let response = self.client.get_json(&page).await?;

            let values = response
                .get("value")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    SharepointError::InvalidResponse(format!("children listing for {} has no value", path))
                })?;

            items.extend(values.iter().filter_map(|v| v.as_object().cloned()));

            next = response
                .get("@odata.nextLink")
                .and_then(Value::as_str)
                .map(str::to_string);
        }

        trace!("listed {} children of {}", items.len(), path);
        Ok(items)
    }
}
