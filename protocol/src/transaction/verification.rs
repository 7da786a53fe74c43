//! Verification of finished transactions.
//!
//! Used on every transaction the wallet is about to broadcast, regardless
//! of which backend signed it. Checks are ordered from cheapest to most
//! expensive: structure, then signatures, then the id (which needs one
//! more hash of the full encoding).

use thiserror::Error;

use super::builder::Transaction;
use super::encoding::{self, EncodingError};
use crate::crypto::keys::LiskPublicKey;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Reasons a finished transaction fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("transaction is unsigned")]
    MissingSignature,

    #[error("signature does not verify against sender {sender}")]
    InvalidSignature { sender: String },

    /// A second public key was supplied but the transaction has no second
    /// signature.
    #[error("transaction is missing its second signature")]
    MissingSecondSignature,

    #[error("second signature does not verify against {public_key}")]
    InvalidSecondSignature { public_key: String },

    #[error("transaction has no id")]
    MissingId,

    #[error("transaction id mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: String, actual: String },

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Checks the signature(s) and id of a finished transaction.
///
/// Pass the account's registered second public key as `second_public_key`
/// to require and check the second signature.
pub fn verify_transaction(
    tx: &Transaction,
    second_public_key: Option<&LiskPublicKey>,
) -> Result<(), VerificationError> {
    encoding::validate(tx)?;

    let signature = tx.signature().ok_or(VerificationError::MissingSignature)?;
    let actual_id = tx.id().ok_or(VerificationError::MissingId)?;

    if !tx.sender_public_key().verify(&tx.digest()?, signature) {
        return Err(VerificationError::InvalidSignature {
            sender: tx.sender_public_key().to_hex(),
        });
    }

    if let Some(second_key) = second_public_key {
        let second = tx
            .sign_signature()
            .ok_or(VerificationError::MissingSecondSignature)?;
        if !second_key.verify(&tx.second_signature_digest()?, second) {
            return Err(VerificationError::InvalidSecondSignature {
                public_key: second_key.to_hex(),
            });
        }
    }

    let expected_id = tx.compute_id()?;
    if expected_id != actual_id {
        return Err(VerificationError::IdMismatch {
            expected: expected_id,
            actual: actual_id.to_string(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
