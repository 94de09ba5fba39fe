//! Document library drive lookup

use async_trait::async_trait;

use super::{required_str, GraphClient};
use crate::connector::DriveService;
use crate::error::Result;

/// Graph-backed drive service
pub struct GraphDriveService {
    client: GraphClient,
    drive_id: Option<String>,
}

impl GraphDriveService {
    pub fn new(client: GraphClient) -> Self {
        Self {
            client,
            drive_id: None,
        }
    }

    pub fn set_drive_id(&mut self, drive_id: impl Into<String>) {
        self.drive_id = Some(drive_id.into());
    }
}

#[async_trait]
impl DriveService for GraphDriveService {
    async fn request_drive_id(&self, site_id: &str) -> Result<String> {
        let response = self.client.get_json(&format!("sites/{}/drive", site_id)).await?;
        Ok(required_str(&response, "/id", "drive id")?.to_string())
    }

    fn drive_id(&self) -> Option<String> {
        self.drive_id.clone()
    }
}
