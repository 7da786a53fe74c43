//! Local (passphrase) signing.
//!
//! Signing is a separate step from building because the key may not be
//! available at construction time, and for hardware accounts it never is.
//! The first signature covers [`Transaction::digest`]; the optional second
//! signature covers [`Transaction::second_signature_digest`], which
//! includes the first signature.
//!
//! [`LocalSigner`] checks every derived key against the account's known
//! public keys before producing anything. A typo in a passphrase derives a
//! perfectly valid but unrelated key, and a transaction signed with it is
//! only rejected later by the network, so the mismatch is caught here.

use thiserror::Error;
use tracing::debug;

use super::builder::Transaction;
use super::encoding::EncodingError;
use crate::crypto::keys::{LiskKeypair, LiskPublicKey, LiskSignature};
use crate::crypto::message::SignedMessage;

/// Local signing failures. Messages never include passphrase material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("passphrase does not match the account public key")]
    InvalidPassphrase,

    #[error("second passphrase does not match the registered second public key")]
    InvalidSecondPassphrase,

    #[error("account has a second public key but no second passphrase was supplied")]
    MissingSecondPassphrase,

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Signs `tx` with `keypair` as its first signature and computes the id.
///
/// The caller is responsible for `keypair` belonging to the sender;
/// [`LocalSigner`] performs that check.
pub fn sign_transaction<'a>(
    tx: &'a mut Transaction,
    keypair: &LiskKeypair,
) -> Result<&'a Transaction, EncodingError> {
    let digest = tx.digest()?;
    tx.attach_signature(keypair.sign(&digest));
    tx.finalize()?;
    Ok(tx)
}

/// Adds the second signature to an already signed `tx` and recomputes the id.
pub fn sign_second<'a>(
    tx: &'a mut Transaction,
    second: &LiskKeypair,
) -> Result<&'a Transaction, EncodingError> {
    let digest = tx.second_signature_digest()?;
    tx.attach_second_signature(second.sign(&digest))?;
    tx.finalize()?;
    Ok(tx)
}

/// Derives the account keypair from `passphrase` and checks it against the
/// account's public key.
pub fn derive_checked(
    passphrase: &str,
    expected: &LiskPublicKey,
) -> Result<LiskKeypair, SignerError> {
    let keypair = LiskKeypair::from_passphrase(passphrase);
    if &keypair.public_key() != expected {
        return Err(SignerError::InvalidPassphrase);
    }
    Ok(keypair)
}

/// Derives the second keypair when the account requires one.
///
/// Returns `Ok(None)` when the account has no second public key; a second
/// passphrase supplied in that case is ignored.
pub fn derive_second(
    second_passphrase: Option<&str>,
    expected: Option<&LiskPublicKey>,
) -> Result<Option<LiskKeypair>, SignerError> {
    let Some(expected) = expected else {
        return Ok(None);
    };
    let passphrase = second_passphrase.ok_or(SignerError::MissingSecondPassphrase)?;
    let keypair = LiskKeypair::from_passphrase(passphrase);
    if &keypair.public_key() != expected {
        return Err(SignerError::InvalidSecondPassphrase);
    }
    Ok(Some(keypair))
}

/// Passphrase-derived signer for one account, verified against its keys.
///
/// Holds signing keys, which zeroize on drop. Construct one per request
/// and let it drop when the request finishes.
#[derive(Debug)]
pub struct LocalSigner {
    keypair: LiskKeypair,
    second: Option<LiskKeypair>,
}

impl LocalSigner {
    pub fn from_passphrases(
        passphrase: &str,
        second_passphrase: Option<&str>,
        public_key: &LiskPublicKey,
        second_public_key: Option<&LiskPublicKey>,
    ) -> Result<Self, SignerError> {
        let keypair = derive_checked(passphrase, public_key)?;
        let second = derive_second(second_passphrase, second_public_key)?;
        Ok(Self { keypair, second })
    }

    /// Signs a raw digest with the primary key.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> LiskSignature {
        self.keypair.sign(digest)
    }

    /// Applies the first signature, the second signature when the account
    /// has one, and computes the final id.
    pub fn sign(&self, tx: &mut Transaction) -> Result<(), SignerError> {
        if tx.sender_public_key() != &self.keypair.public_key() {
            return Err(SignerError::InvalidPassphrase);
        }
        sign_transaction(tx, &self.keypair)?;
        if let Some(second) = &self.second {
            sign_second(tx, second)?;
        }
        debug!(
            tx_id = tx.id().unwrap_or_default(),
            tx_type = %tx.kind(),
            second_signature = self.second.is_some(),
            "signed transaction locally"
        );
        Ok(())
    }

    /// Signs an arbitrary message with the primary key.
    pub fn sign_message(&self, message: &str) -> SignedMessage {
        SignedMessage::sign(message, &self.keypair)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
