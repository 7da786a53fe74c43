//! Peer submission collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transaction::Transaction;

/// Body of a submission: `{"transaction": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub transaction: Transaction,
}

/// What a peer answers. `success` decides; the other fields are optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, alias = "error", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PeerResponse {
    pub fn accepted(transaction_id: impl Into<String>) -> Self {
        Self {
            success: true,
            transaction_id: Some(transaction_id.into()),
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_id: None,
            message: Some(message.into()),
        }
    }
}

/// Transport-level failure talking to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    #[error("peer request failed: {0}")]
    Request(String),

    #[error("peer answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode peer response: {0}")]
    Decode(String),
}

/// Anything that can hand a signed transaction to the network.
#[async_trait]
pub trait PeerClient: Send + Sync {
    async fn submit(&self, request: &BroadcastRequest) -> Result<PeerResponse, PeerError>;
}
