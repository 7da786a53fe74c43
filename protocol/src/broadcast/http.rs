//! HTTP peer client.
//!
//! Submits to `POST {base}/peer/transactions`. Peers reject `/peer/*`
//! requests that lack the network headers, so every request carries
//! `nethash`, `version`, `minVersion`, `os` and `port` from
//! [`NetworkParams`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::peer::{BroadcastRequest, PeerClient, PeerError, PeerResponse};
use crate::config::{NetworkParams, BROADCAST_TIMEOUT_SECS};

#[derive(Debug, Clone)]
pub struct HttpPeer {
    client: Client,
    base_url: String,
    params: NetworkParams,
}

impl HttpPeer {
    pub fn new(base_url: &str, params: NetworkParams) -> Result<Self, PeerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(BROADCAST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| PeerError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            params,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/peer/transactions", self.base_url)
    }
}

#[async_trait]
impl PeerClient for HttpPeer {
    async fn submit(&self, request: &BroadcastRequest) -> Result<PeerResponse, PeerError> {
        let url = self.endpoint();
        debug!(url = %url, "submitting transaction to peer");

        let response = self
            .client
            .post(&url)
            .header("nethash", &self.params.nethash)
            .header("version", &self.params.version)
            .header("minVersion", &self.params.min_version)
            .header("os", &self.params.os)
            .header("port", self.params.port.to_string())
            .json(request)
            .send()
            .await
            .map_err(|e| PeerError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PeerError::Request(e.to_string()))?;

        // Peers report rejections as `success: false` bodies, sometimes with
        // a non-2xx status. Prefer the body when it parses.
        match serde_json::from_str::<PeerResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(PeerError::Status {
                status: status.as_u16(),
                body,
            }),
            Err(e) => Err(PeerError::Decode(e.to_string())),
        }
    }
}
