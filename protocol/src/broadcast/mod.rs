//! # Broadcast
//!
//! Hands a finished transaction to a network peer and turns the answer
//! into a [`Receipt`] or a [`BroadcastError`].
//!
//! ```text
//! peer.rs: PeerClient seam, request/response wire types, PeerError
//! http.rs: reqwest-backed PeerClient for /peer/transactions
//! ```
//!
//! No retries happen here. A signed transaction carries its timestamp, and
//! resubmitting it later may be refused by the network for reasons that
//! have nothing to do with the first failure; whether to rebuild and retry
//! is the caller's call.

pub mod http;
pub mod peer;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::crypto::keys::{Address, LiskPublicKey};
use crate::transaction::{Transaction, TransactionType};

pub use http::HttpPeer;
pub use peer::{BroadcastRequest, PeerClient, PeerError, PeerResponse};

const GENERIC_FAILURE: &str = "peer did not accept the transaction";

/// Why a broadcast did not produce a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    /// The transaction has no signature or id yet.
    #[error("transaction is not finalized; sign it before broadcasting")]
    NotFinalized,

    /// The peer answered with `success: false`.
    #[error("transaction rejected by peer: {0}")]
    Rejected(String),

    /// The peer could not be reached or answered garbage.
    #[error("broadcast failed: {0}")]
    Transport(String),
}

/// Confirmation that a peer accepted a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub sender_public_key: LiskPublicKey,
    pub sender_id: Address,
    pub recipient_id: Option<Address>,
    pub amount: u64,
    pub fee: u64,
}

impl Receipt {
    fn new(transaction_id: String, tx: &Transaction) -> Self {
        Self {
            transaction_id,
            kind: tx.kind(),
            sender_public_key: *tx.sender_public_key(),
            sender_id: tx.sender_address(),
            recipient_id: tx.recipient_id(),
            amount: tx.amount(),
            fee: tx.fee(),
        }
    }
}

/// Submits `tx` to `peer`.
///
/// A success-flagged response yields a receipt. Everything else, including
/// transport failure, yields a [`BroadcastError`] carrying the peer's
/// message when there is one.
pub async fn broadcast(tx: &Transaction, peer: &dyn PeerClient) -> Result<Receipt, BroadcastError> {
    let local_id = match (tx.signature(), tx.id()) {
        (Some(_), Some(id)) => id.to_string(),
        _ => return Err(BroadcastError::NotFinalized),
    };

    let request = BroadcastRequest {
        transaction: tx.clone(),
    };

    let response = peer.submit(&request).await.map_err(|e| {
        warn!(tx_id = %local_id, error = %e, "broadcast transport failure");
        BroadcastError::Transport(e.to_string())
    })?;

    if !response.success {
        let message = response
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        warn!(tx_id = %local_id, reason = %message, "peer rejected transaction");
        return Err(BroadcastError::Rejected(message));
    }

    let transaction_id = match response.transaction_id {
        Some(peer_id) if peer_id != local_id => {
            warn!(tx_id = %local_id, peer_id = %peer_id, "peer reported a different transaction id");
            peer_id
        }
        Some(peer_id) => peer_id,
        None => local_id,
    };

    info!(tx_id = %transaction_id, tx_type = %tx.kind(), "transaction accepted by peer");
    Ok(Receipt::new(transaction_id, tx))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
