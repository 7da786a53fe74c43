//! # Key Management
//!
//! Passphrase-derived Ed25519 keypairs, public keys, signatures and
//! addresses.
//!
//! The network derives keys brain-wallet style: the Ed25519 seed is the
//! SHA-256 of the UTF-8 passphrase. The same passphrase therefore always
//! yields the same account, which is what lets a user "log in" with a
//! mnemonic and nothing else.
//!
//! ## Security considerations
//!
//! - Signing keys are zeroized on drop (ed25519-dalek `zeroize` feature),
//!   and the intermediate seed lives in a `Zeroizing` buffer.
//! - Neither passphrases nor secret key bytes are ever logged or printed.
//!   `Debug` on a keypair shows only the public half.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use zeroize::Zeroizing;

use super::hash::{fold_to_u64, sha256};
use crate::config::{ADDRESS_SUFFIX, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Errors that can occur while parsing keys, signatures or addresses.
///
/// Deliberately terse: the messages never echo secret input back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid public key: expected 32 bytes of hex encoding a curve point")]
    InvalidPublicKey,

    #[error("invalid signature: expected 64 bytes of hex")]
    InvalidSignature,

    #[error("invalid address {0:?}: expected decimal digits followed by 'L'")]
    InvalidAddress(String),
}

// ---------------------------------------------------------------------------
// LiskKeypair
// ---------------------------------------------------------------------------

/// An Ed25519 keypair for one account.
///
/// Intentionally neither `Clone` nor `Serialize`: the signing half should
/// exist only for the duration of a signing call and then drop.
pub struct LiskKeypair {
    signing_key: SigningKey,
}

impl LiskKeypair {
    /// Derives the account keypair from a passphrase.
    ///
    /// `seed = SHA-256(passphrase)`. No normalisation is applied, so
    /// passphrases must be passed exactly as the user entered them.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let seed = Zeroizing::new(sha256(passphrase.as_bytes()));
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Generates a random keypair from the OS RNG. Used for throwaway
    /// accounts in tests and benchmarks.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// The public half of this keypair.
    pub fn public_key(&self) -> LiskPublicKey {
        LiskPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// The account address of this keypair.
    pub fn address(&self) -> Address {
        self.public_key().to_address()
    }

    /// Produces a detached Ed25519 signature over `message`.
    pub fn sign(&self, message: &[u8]) -> LiskSignature {
        LiskSignature {
            bytes: self.signing_key.sign(message).to_bytes(),
        }
    }
}

impl fmt::Debug for LiskKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LiskKeypair(pub={})", self.public_key())
    }
}

// ---------------------------------------------------------------------------
// LiskPublicKey
// ---------------------------------------------------------------------------

/// A 32-byte Ed25519 public key, rendered as lowercase hex on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LiskPublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

impl LiskPublicKey {
    /// Wraps raw bytes without checking they encode a curve point.
    ///
    /// Use [`LiskPublicKey::try_from_slice`] for untrusted input.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Parses and validates a public key from a byte slice.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Parses a 64-character hex public key.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::try_from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Derives the account address: the first eight bytes of
    /// `SHA-256(public key)` folded into a `u64`.
    pub fn to_address(&self) -> Address {
        Address(fold_to_u64(&sha256(&self.bytes)))
    }

    /// Verifies a detached signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &LiskSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&signature.bytes);
        verifying_key.verify(message, &sig).is_ok()
    }
}

impl fmt::Display for LiskPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for LiskPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LiskPublicKey({})", &self.to_hex()[..16])
    }
}

impl FromStr for LiskPublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for LiskPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for LiskPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// LiskSignature
// ---------------------------------------------------------------------------

/// A 64-byte Ed25519 signature, rendered as lowercase hex on the wire.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct LiskSignature {
    bytes: [u8; SIGNATURE_LENGTH],
}

impl LiskSignature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Accepts exactly 64 bytes. Hardware devices hand back signatures as
    /// untyped buffers, so the length is checked here.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; SIGNATURE_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidSignature)?;
        Ok(Self { bytes })
    }

    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidSignature)?;
        Self::try_from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for LiskSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for LiskSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "LiskSignature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}

impl Serialize for LiskSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for LiskSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An account address: a `u64` rendered as decimal digits plus `L`,
/// e.g. `16313739661670634666L`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(u64);

impl Address {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The numeric part of the address. This is what the canonical
    /// encoding stores.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, ADDRESS_SUFFIX)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || KeyError::InvalidAddress(s.to_string());
        let digits = s.strip_suffix(ADDRESS_SUFFIX).ok_or_else(invalid)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        // u64 parsing rejects values that do not fit in the 8-byte field.
        digits.parse::<u64>().map(Address).map_err(|_| invalid())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
