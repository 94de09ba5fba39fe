//! Thin wrapper around the Microsoft Graph REST API
//!
//! `GraphClient` carries the bearer token and base URL and turns
//! non-success responses into crate errors. The site, drive, file and
//! folder services build Graph resource paths on top of it.

pub mod drive;
pub mod file;
pub mod folder;
pub mod site;

use std::time::Duration;

use bytes::Bytes;
use chrono::DateTime;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::trace;

use crate::error::{Result, SharepointError};
use crate::filesystem::ExtraMetadata;

/// Default Graph API root
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

/// Characters escaped inside a single drive path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Authenticated Graph HTTP client
#[derive(Debug, Clone)]
pub struct GraphClient {
    inner: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GraphClient {
    pub fn new(base_url: &str, access_token: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Full URL for a Graph resource path; absolute URLs pass through
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        let response = self.execute(self.inner.get(&url), "GET", &url).await?;
        read_json(response).await
    }

    pub async fn get_bytes(&self, path: &str) -> Result<Bytes> {
        let url = self.url(path);
        let response = self.execute(self.inner.get(&url), "GET", &url).await?;
        Ok(response.bytes().await?)
    }

    pub async fn put_bytes(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<Value> {
        let url = self.url(path);
        let request = self
            .inner
            .put(&url)
            .header(CONTENT_TYPE, content_type)
            .body(data);
        let response = self.execute(request, "PUT", &url).await?;
        read_json(response).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        let response = self
            .execute(self.inner.post(&url).json(body), "POST", &url)
            .await?;
        read_json(response).await
    }

    pub async fn patch_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        let response = self
            .execute(self.inner.patch(&url).json(body), "PATCH", &url)
            .await?;
        read_json(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        self.execute(self.inner.delete(&url), "DELETE", &url).await?;
        Ok(())
    }

    /// Fetch a drive item by path; `None` when it does not exist
    pub async fn find_drive_item(&self, drive_id: &str, path: &str) -> Result<Option<ExtraMetadata>> {
        match self.get_json(&item_path(drive_id, path)).await {
            Ok(Value::Object(item)) => Ok(Some(item)),
            Ok(other) => Err(SharepointError::InvalidResponse(format!(
                "expected drive item object for {}, got {}",
                path, other
            ))),
            Err(SharepointError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetch a drive item by path, failing with `NotFound` when missing
    pub async fn get_drive_item(&self, drive_id: &str, path: &str) -> Result<ExtraMetadata> {
        self.find_drive_item(drive_id, path)
            .await?
            .ok_or_else(|| SharepointError::NotFound(path.to_string()))
    }

    async fn execute(&self, request: RequestBuilder, method: &str, url: &str) -> Result<Response> {
        trace!("{} {}", method, url);

        let response = request.bearer_auth(&self.access_token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_status(status, &body, url))
    }
}

async fn read_json(response: Response) -> Result<Value> {
    let body = response.bytes().await?;
    if body.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&body)?)
}

/// Map a failed Graph response onto the crate's error taxonomy
pub fn error_from_status(status: StatusCode, body: &str, url: &str) -> SharepointError {
    let message = graph_error_message(body).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    match status {
        StatusCode::NOT_FOUND => SharepointError::NotFound(url.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SharepointError::Auth(format!("{} ({})", message, status.as_u16()))
        }
        _ => SharepointError::Backend(format!(
            "Graph API error {} for {}: {}",
            status.as_u16(),
            url,
            message
        )),
    }
}

/// Extract `error.code: error.message` from a Graph error body
fn graph_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = error.get("message")?.as_str()?;
    match error.get("code").and_then(Value::as_str) {
        Some(code) => Some(format!("{}: {}", code, message)),
        None => Some(message.to_string()),
    }
}

/// Percent-encode a drive path; empty segments are dropped
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Resource path of the drive item at `path`
pub fn item_path(drive_id: &str, path: &str) -> String {
    let encoded = encode_path(path);
    if encoded.is_empty() {
        format!("drives/{}/root", drive_id)
    } else {
        format!("drives/{}/root:/{}", drive_id, encoded)
    }
}

/// Resource path of an action or navigation property on the item at `path`
pub fn item_action(drive_id: &str, path: &str, action: &str) -> String {
    let encoded = encode_path(path);
    if encoded.is_empty() {
        format!("drives/{}/root/{}", drive_id, action)
    } else {
        format!("drives/{}/root:/{}:/{}", drive_id, encoded, action)
    }
}

/// Parse an ISO-8601 timestamp into seconds since the Unix epoch
pub fn parse_timestamp(value: &str) -> Result<i64> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp())
        .map_err(|e| SharepointError::InvalidResponse(format!("invalid timestamp '{}': {}", value, e)))
}

/// Read a required string field from a Graph object
pub(crate) fn required_str<'a>(value: &'a Value, pointer: &str, what: &str) -> Result<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| SharepointError::InvalidResponse(format!("missing {} in response", what)))
}
