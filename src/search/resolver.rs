//! Asset resolution seam.

use async_trait::async_trait;
use std::time::Duration;

use crate::search::types::AssetRef;

/// Resolves an asset id to an asset, if one exists.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    async fn resolve_asset(&self, id: u64) -> Option<AssetRef>;
}

/// Resolves assets with a GET to a URL template containing `{id}`.
#[derive(Debug, Clone)]
pub struct HttpAssetResolver {
    client: reqwest::Client,
    url_template: String,
}

impl HttpAssetResolver {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    pub fn url_for(&self, id: u64) -> String {
        self.url_template.replace("{id}", &id.to_string())
    }
}

#[async_trait]
impl AssetResolver for HttpAssetResolver {
    async fn resolve_asset(&self, id: u64) -> Option<AssetRef> {
        let url = self.url_for(id);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Asset lookup failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(url = %url, status = %response.status(), "Asset not found");
            return None;
        }

        match response.json::<AssetRef>().await {
            Ok(asset) => Some(asset),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Asset lookup returned an unexpected body");
                None
            }
        }
    }
}
