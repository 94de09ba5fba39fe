//! SharePoint site lookups

use tracing::trace;

use super::{encode_segment, required_str, GraphClient};
use crate::error::Result;

/// Resolves the tenant's SharePoint host and site identifiers
pub struct SiteService {
    client: GraphClient,
}

impl SiteService {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Hostname of the tenant's root site collection (e.g. `contoso.sharepoint.com`)
    pub async fn request_sharepoint_hostname(&self) -> Result<String> {
        let response = self.client.get_json("sites/root").await?;
        let hostname = required_str(&response, "/siteCollection/hostname", "site collection hostname")?;
        trace!("sharepoint hostname: {}", hostname);
        Ok(hostname.to_string())
    }

    /// Site id for `/sites/{site_name}` on `hostname`
    pub async fn request_site_id_by_site_name(&self, hostname: &str, site_name: &str) -> Result<String> {
        let path = format!(
            "sites/{}:/sites/{}",
            hostname,
            encode_segment(site_name.trim_matches('/'))
        );
        let response = self.client.get_json(&path).await?;
        Ok(required_str(&response, "/id", "site id")?.to_string())
    }
}
