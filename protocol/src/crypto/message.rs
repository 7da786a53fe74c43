//! Signed messages.
//!
//! A signed message proves control of an account's key without moving
//! funds. Passphrase accounts produce the network's *attached* form: the
//! 64-byte signature followed by the message bytes, hex-encoded. Hardware
//! devices return a bare 64-byte signature, so the *detached* form is
//! accepted as well.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::keys::{LiskKeypair, LiskPublicKey, LiskSignature};
use crate::config::SIGNATURE_LENGTH;

const BEGIN_MARKER: &str = "-----BEGIN LISK SIGNED MESSAGE-----";
const MESSAGE_MARKER: &str = "-----MESSAGE-----";
const PUBLIC_KEY_MARKER: &str = "-----PUBLIC KEY-----";
const SIGNATURE_MARKER: &str = "-----SIGNATURE-----";
const END_MARKER: &str = "-----END LISK SIGNED MESSAGE-----";

/// Errors raised while checking a signed message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("signature is not valid hex")]
    MalformedHex,

    #[error("signed payload is shorter than a signature")]
    TooShort,

    #[error("attached message differs from the claimed message")]
    MessageMismatch,

    #[error("signature does not verify against the public key")]
    VerificationFailed,

    #[error("malformed signed message block: {0}")]
    MalformedBlock(&'static str),
}

/// A message together with its signer's public key and signature hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessage {
    pub message: String,
    pub public_key: LiskPublicKey,
    /// Attached (`signature ‖ message`) or detached (64 bytes) signature,
    /// hex-encoded.
    pub signature: String,
}

impl SignedMessage {
    /// Signs `message` with a passphrase keypair, producing the attached form.
    pub fn sign(message: &str, keypair: &LiskKeypair) -> Self {
        let signature = keypair.sign(message.as_bytes());
        let mut attached = Vec::with_capacity(SIGNATURE_LENGTH + message.len());
        attached.extend_from_slice(signature.as_bytes());
        attached.extend_from_slice(message.as_bytes());
        Self {
            message: message.to_string(),
            public_key: keypair.public_key(),
            signature: hex::encode(attached),
        }
    }

    /// Wraps a detached signature obtained from a hardware device.
    pub fn from_detached(message: &str, public_key: LiskPublicKey, signature: &LiskSignature) -> Self {
        Self {
            message: message.to_string(),
            public_key,
            signature: signature.to_hex(),
        }
    }

    /// Checks the signature against the public key and message.
    pub fn verify(&self) -> Result<(), MessageError> {
        let raw = hex::decode(&self.signature).map_err(|_| MessageError::MalformedHex)?;
        if raw.len() < SIGNATURE_LENGTH {
            return Err(MessageError::TooShort);
        }
        let (sig_bytes, attached) = raw.split_at(SIGNATURE_LENGTH);
        if !attached.is_empty() && attached != self.message.as_bytes() {
            return Err(MessageError::MessageMismatch);
        }
        let signature =
            LiskSignature::try_from_slice(sig_bytes).map_err(|_| MessageError::TooShort)?;
        if self.public_key.verify(self.message.as_bytes(), &signature) {
            Ok(())
        } else {
            Err(MessageError::VerificationFailed)
        }
    }

    /// Renders the printable block users paste into verification tools.
    pub fn to_printable(&self) -> String {
        [
            BEGIN_MARKER,
            MESSAGE_MARKER,
            &self.message,
            PUBLIC_KEY_MARKER,
            &self.public_key.to_hex(),
            SIGNATURE_MARKER,
            &self.signature,
            END_MARKER,
        ]
        .join("\n")
    }

    /// Parses a printable block produced by [`SignedMessage::to_printable`].
    ///
    /// The message section may span several lines.
    pub fn parse_printable(block: &str) -> Result<Self, MessageError> {
        let block = block.trim();
        let body = block
            .strip_prefix(BEGIN_MARKER)
            .and_then(|rest| rest.strip_suffix(END_MARKER))
            .ok_or(MessageError::MalformedBlock("missing begin/end markers"))?;
        let body = body
            .strip_prefix('\n')
            .and_then(|rest| rest.strip_prefix(MESSAGE_MARKER))
            .and_then(|rest| rest.strip_prefix('\n'))
            .ok_or(MessageError::MalformedBlock("missing message section"))?;

        let key_header = format!("\n{}\n", PUBLIC_KEY_MARKER);
        let (message, rest) = body
            .rsplit_once(&key_header)
            .ok_or(MessageError::MalformedBlock("missing public key section"))?;
        let sig_header = format!("\n{}\n", SIGNATURE_MARKER);
        let (public_key, signature) = rest
            .split_once(&sig_header)
            .ok_or(MessageError::MalformedBlock("missing signature section"))?;

        let public_key = LiskPublicKey::from_hex(public_key.trim())
            .map_err(|_| MessageError::MalformedBlock("invalid public key"))?;

        Ok(Self {
            message: message.to_string(),
            public_key,
            signature: signature.trim().to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
