//! Common test utilities and fixtures
//!
//! Two kinds of stand-ins are provided:
//!
//! 1. **`FakeBackend`**: in-memory drive implementing the drive, file and
//!    folder service traits. Every call is recorded so tests can assert on
//!    the exact drive paths the adapter produced.
//!
//! 2. **`FakeHttpServer`**: a local HTTP listener answering canned
//!    responses, for exercising the Graph services and download streams.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use sharepoint_adapter::connector::{
    DriveService, FileService, FolderService, SharepointConnector,
};
use sharepoint_adapter::filesystem::ExtraMetadata;
use sharepoint_adapter::{Result, SharepointError};

// ============================================================================
// Recording in-memory backend
// ============================================================================

/// A call received by the fake backend, with the drive paths it was given
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FileExists(String),
    ReadFile(String),
    WriteFile {
        path: String,
        contents: Vec<u8>,
        mime_type: String,
    },
    DeleteFile(String),
    MoveFile {
        source: String,
        parent: String,
        name: String,
    },
    CopyFile {
        source: String,
        parent: String,
        name: String,
    },
    MimeType(String),
    FileSize(String),
    LastModified(String),
    StreamUrl(String),
    FolderExists(String),
    CreateFolder(String),
    DeleteFolder(String),
    FolderItems(String),
}

/// File stored in the fake backend
#[derive(Debug, Clone, Default)]
pub struct FakeFile {
    pub contents: Vec<u8>,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
    pub last_modified: Option<i64>,
}

impl FakeFile {
    pub fn new(contents: &[u8]) -> Self {
        Self {
            contents: contents.to_vec(),
            size: Some(contents.len() as u64),
            ..Default::default()
        }
    }
}

#[derive(Default)]
pub struct FakeBackend {
    pub calls: Mutex<Vec<Call>>,
    pub files: Mutex<HashMap<String, FakeFile>>,
    /// Folder path -> raw child records
    pub folders: Mutex<HashMap<String, Vec<ExtraMetadata>>>,
    pub stream_url: Mutex<String>,
    /// When set, metadata and stream URL lookups fail with this message
    pub failure: Mutex<Option<String>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_file(&self, path: &str, file: FakeFile) {
        self.files.lock().insert(path.to_string(), file);
    }

    pub fn add_folder(&self, path: &str, children: Vec<Value>) {
        let children = children
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect();
        self.folders.lock().insert(path.to_string(), children);
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<Call> {
        self.calls.lock().last().cloned()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.lock().as_ref() {
            Some(message) => Err(SharepointError::Backend(message.clone())),
            None => Ok(()),
        }
    }

    fn file(&self, path: &str) -> Result<FakeFile> {
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| SharepointError::NotFound(path.to_string()))
    }

    fn join(parent: &str, name: &str) -> String {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}

/// Connector whose drive, file and folder services are all `backend`
pub fn connector_for(backend: &Arc<FakeBackend>) -> SharepointConnector {
    SharepointConnector::from_parts(
        "fake-token",
        backend.clone(),
        backend.clone(),
        backend.clone(),
    )
}

#[async_trait]
impl DriveService for FakeBackend {
    async fn request_drive_id(&self, site_id: &str) -> Result<String> {
        Ok(format!("drive-of-{}", site_id))
    }

    fn drive_id(&self) -> Option<String> {
        Some("fake-drive".to_string())
    }
}

#[async_trait]
impl FileService for FakeBackend {
    async fn check_file_exists(&self, path: &str) -> Result<bool> {
        self.record(Call::FileExists(path.to_string()));
        Ok(self.files.lock().contains_key(path))
    }

    async fn read_file(&self, path: &str) -> Result<Bytes> {
        self.record(Call::ReadFile(path.to_string()));
        Ok(Bytes::from(self.file(path)?.contents))
    }

    async fn write_file(&self, path: &str, contents: &[u8], mime_type: &str) -> Result<()> {
        self.record(Call::WriteFile {
            path: path.to_string(),
            contents: contents.to_vec(),
            mime_type: mime_type.to_string(),
        });
        let mut file = FakeFile::new(contents);
        file.mime_type = Some(mime_type.to_string());
        self.add_file(path, file);
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        self.record(Call::DeleteFile(path.to_string()));
        self.files
            .lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| SharepointError::NotFound(path.to_string()))
    }

    async fn move_file(&self, source: &str, destination_parent: &str, name: &str) -> Result<()> {
        self.record(Call::MoveFile {
            source: source.to_string(),
            parent: destination_parent.to_string(),
            name: name.to_string(),
        });
        let file = self
            .files
            .lock()
            .remove(source)
            .ok_or_else(|| SharepointError::NotFound(source.to_string()))?;
        self.add_file(&Self::join(destination_parent, name), file);
        Ok(())
    }

    async fn copy_file(&self, source: &str, destination_parent: &str, name: &str) -> Result<()> {
        self.record(Call::CopyFile {
            source: source.to_string(),
            parent: destination_parent.to_string(),
            name: name.to_string(),
        });
        let file = self.file(source)?;
        self.add_file(&Self::join(destination_parent, name), file);
        Ok(())
    }

    async fn check_file_mime_type(&self, path: &str) -> Result<Option<String>> {
        self.record(Call::MimeType(path.to_string()));
        self.check_failure()?;
        Ok(self.file(path)?.mime_type)
    }

    async fn check_file_size(&self, path: &str) -> Result<Option<u64>> {
        self.record(Call::FileSize(path.to_string()));
        self.check_failure()?;
        Ok(self.file(path)?.size)
    }

    async fn check_file_last_modified(&self, path: &str) -> Result<Option<i64>> {
        self.record(Call::LastModified(path.to_string()));
        self.check_failure()?;
        Ok(self.file(path)?.last_modified)
    }

    async fn request_file_stream_url(&self, path: &str) -> Result<String> {
        self.record(Call::StreamUrl(path.to_string()));
        self.check_failure()?;
        Ok(self.stream_url.lock().clone())
    }
}

#[async_trait]
impl FolderService for FakeBackend {
    async fn check_folder_exists(&self, path: &str) -> Result<bool> {
        self.record(Call::FolderExists(path.to_string()));
        Ok(self.folders.lock().contains_key(path))
    }

    async fn create_folder_recursive(&self, path: &str) -> Result<()> {
        self.record(Call::CreateFolder(path.to_string()));
        let mut current = String::new();
        let mut folders = self.folders.lock();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = format!("{}/{}", current, segment);
            folders.entry(current.clone()).or_default();
        }
        Ok(())
    }

    async fn delete_folder(&self, path: &str) -> Result<()> {
        self.record(Call::DeleteFolder(path.to_string()));
        self.folders
            .lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| SharepointError::NotFound(path.to_string()))
    }

    async fn request_folder_items(&self, path: &str) -> Result<Vec<ExtraMetadata>> {
        self.record(Call::FolderItems(path.to_string()));
        self.folders
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| SharepointError::NotFound(path.to_string()))
    }
}

// ============================================================================
// Canned-response HTTP server
// ============================================================================

/// Response served for a matching method and path
#[derive(Debug, Clone)]
pub struct Route {
    pub method: &'static str,
    /// Request path without query string, as it appears on the wire
    pub path: String,
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Route {
    pub fn json(method: &'static str, path: &str, status: u16, body: Value) -> Self {
        Self {
            method,
            path: path.to_string(),
            status,
            content_type: "application/json",
            body: body.to_string().into_bytes(),
        }
    }

    pub fn bytes(method: &'static str, path: &str, body: &[u8]) -> Self {
        Self {
            method,
            path: path.to_string(),
            status: 200,
            content_type: "application/octet-stream",
            body: body.to_vec(),
        }
    }
}

/// Request as seen by the fake server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

pub struct FakeHttpServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeHttpServer {
    /// Start serving `routes` on an ephemeral local port
    ///
    /// `{BASE}` in a JSON body is replaced by the server's own base URL.
    /// Unmatched requests get a Graph-style 404.
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let routes: Vec<Route> = routes
            .into_iter()
            .map(|mut route| {
                if route.content_type == "application/json" {
                    route.body = String::from_utf8_lossy(&route.body)
                        .replace("{BASE}", &base_url)
                        .into_bytes();
                }
                route
            })
            .collect();

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let routes = routes.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let _ = serve_one(stream, &routes, &recorded).await;
                });
            }
        });

        Self { base_url, requests }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn serve_one(
    mut stream: TcpStream,
    routes: &[Route],
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default();
    let path = target.split('?').next().unwrap_or_default().to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    recorded.lock().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        headers,
        body,
    });

    let (status, content_type, payload) = match routes
        .iter()
        .find(|r| r.method == method && r.path == path)
    {
        Some(route) => (route.status, route.content_type, route.body.clone()),
        None => (
            404,
            "application/json",
            serde_json::json!({"error": {"code": "itemNotFound", "message": "The resource could not be found."}})
                .to_string()
                .into_bytes(),
        ),
    };

    let response_head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        if status < 400 { "OK" } else { "Error" },
        content_type,
        payload.len()
    );
    stream.write_all(response_head.as_bytes()).await?;
    stream.write_all(&payload).await?;
    stream.shutdown().await
}
