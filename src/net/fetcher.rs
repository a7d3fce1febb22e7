//! Upstream fetch abstraction.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::TimeoutConfig;
use crate::http::response::{is_hop_by_hop, CachedResponse};
use crate::http::FetchRequest;
use crate::strategy::{StrategyError, StrategyResult};

/// Performs a request against the real network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> StrategyResult<CachedResponse>;
}

/// `Fetcher` backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Build a client honoring the configured timeouts.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &FetchRequest) -> StrategyResult<CachedResponse> {
        let network_error = |e: reqwest::Error| StrategyError::Network {
            url: request.url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(network_error)?;

        tracing::trace!(url = %request.url, status, bytes = body.len(), "Upstream responded");

        Ok(CachedResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
