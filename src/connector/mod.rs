//! SharePoint connector: one-time bootstrap and sub-client registry
//!
//! The connector authenticates, resolves the site and its document library
//! drive, and hands out the drive, file and folder sub-clients bound to that
//! drive. Construction is eager: a connector either exists fully resolved
//! or not at all.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use crate::auth::{
    ClientCredentialsConfig, ClientCredentialsProvider, TokenProvider, GRAPH_DEFAULT_SCOPE,
};
use crate::config::ConnectorConfig;
use crate::error::Result;
use crate::filesystem::ExtraMetadata;
use crate::graph::drive::GraphDriveService;
use crate::graph::file::GraphFileService;
use crate::graph::folder::GraphFolderService;
use crate::graph::site::SiteService;
use crate::graph::GraphClient;

/// Drive-level operations
#[async_trait]
pub trait DriveService: Send + Sync {
    /// Look up the default document library drive of a site
    async fn request_drive_id(&self, site_id: &str) -> Result<String>;

    /// Drive the sub-clients are bound to, once resolved
    fn drive_id(&self) -> Option<String>;
}

/// File operations, keyed by absolute drive path
#[async_trait]
pub trait FileService: Send + Sync {
    async fn check_file_exists(&self, path: &str) -> Result<bool>;

    async fn read_file(&self, path: &str) -> Result<Bytes>;

    async fn write_file(&self, path: &str, contents: &[u8], mime_type: &str) -> Result<()>;

    async fn delete_file(&self, path: &str) -> Result<()>;

    /// Move `source` into the folder `destination_parent` under `name`
    async fn move_file(&self, source: &str, destination_parent: &str, name: &str) -> Result<()>;

    /// Copy `source` into the folder `destination_parent` under `name`
    async fn copy_file(&self, source: &str, destination_parent: &str, name: &str) -> Result<()>;

    async fn check_file_mime_type(&self, path: &str) -> Result<Option<String>>;

    async fn check_file_size(&self, path: &str) -> Result<Option<u64>>;

    /// Last modification time in seconds since the Unix epoch
    async fn check_file_last_modified(&self, path: &str) -> Result<Option<i64>>;

    /// Pre-authenticated download URL for the file content
    async fn request_file_stream_url(&self, path: &str) -> Result<String>;
}

/// Folder operations, keyed by absolute drive path
#[async_trait]
pub trait FolderService: Send + Sync {
    async fn check_folder_exists(&self, path: &str) -> Result<bool>;

    /// Create the folder and every missing ancestor
    async fn create_folder_recursive(&self, path: &str) -> Result<()>;

    /// Delete the folder and its contents
    async fn delete_folder(&self, path: &str) -> Result<()>;

    /// Raw records for the immediate children of a folder
    async fn request_folder_items(&self, path: &str) -> Result<Vec<ExtraMetadata>>;
}

/// Authenticated handle on one SharePoint site's document library
pub struct SharepointConnector {
    access_token: String,
    drive: Arc<dyn DriveService>,
    file: Arc<dyn FileService>,
    folder: Arc<dyn FolderService>,
}

impl SharepointConnector {
    /// Authenticate against `tenant_id` and resolve `site` on the public Graph endpoints
    pub async fn new(
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
        site: &str,
    ) -> Result<Self> {
        let config = ConnectorConfig::new(tenant_id, client_id, client_secret, site);
        Self::connect(&config).await
    }

    /// Create a connector from configuration
    pub async fn connect(config: &ConnectorConfig) -> Result<Self> {
        let mut auth = ClientCredentialsConfig::new(
            config.tenant_id.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        );
        auth.login_url = config.login_url.clone();
        auth.timeout = config.timeout;

        let provider = ClientCredentialsProvider::new(auth)?;
        Self::bootstrap(&provider, &config.graph_url, config.timeout, &config.site).await
    }

    /// Run the bootstrap sequence with an arbitrary token source
    ///
    /// token -> hostname -> site id -> drive id -> file/folder sub-clients.
    /// Any failure aborts construction.
    pub async fn bootstrap(
        provider: &dyn TokenProvider,
        graph_url: &str,
        timeout: Option<Duration>,
        site: &str,
    ) -> Result<Self> {
        let access_token = provider.get_token(&[GRAPH_DEFAULT_SCOPE]).await?;
        debug!("acquired access token");

        let client = GraphClient::new(graph_url, &access_token, timeout)?;

        let sites = SiteService::new(client.clone());
        let hostname = sites.request_sharepoint_hostname().await?;
        let site_id = sites.request_site_id_by_site_name(&hostname, site).await?;
        debug!("resolved site {} on {} to {}", site, hostname, site_id);

        let mut drive = GraphDriveService::new(client.clone());
        let drive_id = drive.request_drive_id(&site_id).await?;
        drive.set_drive_id(drive_id.clone());
        debug!("resolved drive {}", drive_id);

        let folder = GraphFolderService::new(client.clone(), drive_id.clone());
        let file = GraphFileService::new(client, drive_id.clone());

        info!("connected to site {} (drive {})", site, drive_id);

        Ok(Self {
            access_token,
            drive: Arc::new(drive),
            file: Arc::new(file),
            folder: Arc::new(folder),
        })
    }

    /// Assemble a connector from already-built parts, without network access
    pub fn from_parts(
        access_token: impl Into<String>,
        drive: Arc<dyn DriveService>,
        file: Arc<dyn FileService>,
        folder: Arc<dyn FolderService>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            drive,
            file,
            folder,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn drive(&self) -> &Arc<dyn DriveService> {
        &self.drive
    }

    pub fn file(&self) -> &Arc<dyn FileService> {
        &self.file
    }

    pub fn folder(&self) -> &Arc<dyn FolderService> {
        &self.folder
    }

    pub fn set_access_token(&mut self, access_token: impl Into<String>) -> &mut Self {
        self.access_token = access_token.into();
        self
    }

    pub fn set_drive(&mut self, drive: Arc<dyn DriveService>) -> &mut Self {
        self.drive = drive;
        self
    }

    pub fn set_file(&mut self, file: Arc<dyn FileService>) -> &mut Self {
        self.file = file;
        self
    }

    pub fn set_folder(&mut self, folder: Arc<dyn FolderService>) -> &mut Self {
        self.folder = folder;
        self
    }
}
